//! Probe output parsing
//!
//! Two independent parse paths:
//!
//! - delimiter extraction: locate the fixed delimiter in captured compiler
//!   output and map the token after it to a [`CompilerFamily`]. An absent or
//!   unrecognized token is `Unknown`: valid information, never an error.
//! - version parsing: per-family grammars over `--version` banners, in
//!   [`version`]. This path can fail; callers degrade to "family known,
//!   version absent".

pub mod version;

use crate::probe::CompilerFamily;
use thiserror::Error;

pub use version::{extract_linker_id, parse_version, VersionInfo};

/// Errors from the version parse path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The banner matched no known family grammar
    #[error("Unrecognized {family} version output: {snippet}")]
    UnrecognizedBanner { family: String, snippet: String },

    /// The banner was empty
    #[error("Empty version output")]
    EmptyBanner,
}

/// Returns the raw token following the first occurrence of `delimiter`.
///
/// First occurrence wins when the delimiter appears more than once. The
/// delimiter travels through the probe as a string literal, so preprocessed
/// output shows it as `"MESON_DELIMITER" token`; the closing quote and any
/// whitespace before the token are skipped. The token ends at the next
/// whitespace or newline; later lines never contribute.
pub fn extract_token<'a>(output: &'a str, delimiter: &str) -> Option<&'a str> {
    let start = output.find(delimiter)? + delimiter.len();
    let line = output[start..].lines().next().unwrap_or("");
    let rest = line.trim_start_matches('"').trim_start();
    let token = rest.split_whitespace().next().unwrap_or("");
    Some(token)
}

/// Maps probe output to a compiler family.
///
/// No delimiter, or a delimiter followed by an unknown token, yields
/// `Unknown`: the compiler ran but is not one we recognize.
pub fn extract_family(output: &str, delimiter: &str) -> CompilerFamily {
    match extract_token(output, delimiter) {
        Some(token) => CompilerFamily::from_token(token),
        None => CompilerFamily::Unknown,
    }
}

/// Reads the underscore-prefix probe's answer: `Some(true)` when the target
/// prefixes global symbols with `_`, `Some(false)` when the token slot is
/// empty, `None` when the output carries no delimiter or an unexpected token.
pub fn extract_underscore_prefix(output: &str, delimiter: &str) -> Option<bool> {
    match extract_token(output, delimiter)? {
        "_" => Some(true),
        "" => Some(false),
        _ => None,
    }
}
