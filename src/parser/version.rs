//! Version banner parsing
//!
//! Each compiler family documents its own `--version` banner shape, so the
//! grammars here are per-family rather than one catch-all pattern:
//!
//! - gcc: `gcc (vendor blurb) 13.2.0`: the release is the last dotted
//!   triple on the first line, after any versions inside the vendor blurb
//! - clang: `[Apple |Ubuntu ]clang version 17.0.6 ...`
//! - emscripten: `emcc (Emscripten gcc/clang-like replacement ...) 3.1.45`
//! - msvc: `Microsoft (R) C/C++ Optimizing Compiler Version 19.29.30133 for x64`
//!
//! Version information is best-effort: a banner that matches no grammar is a
//! [`ParseError`](super::ParseError), and callers degrade to "family known,
//! version absent" rather than failing identification.

use super::ParseError;
use crate::probe::CompilerFamily;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Raw and parsed version of an identified compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionInfo {
    /// First non-empty banner line, verbatim.
    pub raw: String,
    /// Release as (major, minor, patch) when a family grammar matched.
    pub parsed: Option<(u64, u64, u64)>,
}

impl VersionInfo {
    /// Builds version info from a `--version` banner, parsing with the
    /// family's grammar.
    pub fn from_banner(family: CompilerFamily, banner: &str) -> Result<Self, ParseError> {
        let raw = first_line(banner).ok_or(ParseError::EmptyBanner)?.to_string();
        let parsed = parse_version(family, banner)?;
        Ok(Self {
            raw,
            parsed: Some(parsed),
        })
    }

}

fn first_line(banner: &str) -> Option<&str> {
    banner.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Parses a `--version` banner with the grammar of the given family.
pub fn parse_version(family: CompilerFamily, banner: &str) -> Result<(u64, u64, u64), ParseError> {
    let line = first_line(banner).ok_or(ParseError::EmptyBanner)?;

    let unrecognized = || ParseError::UnrecognizedBanner {
        family: family.to_string(),
        snippet: line.chars().take(120).collect(),
    };

    match family {
        CompilerFamily::Gcc => {
            // Vendor blurbs like "(Debian 12.2.0-14)" carry dotted triples
            // of their own; the release is the last one on the line.
            let re = Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid regex");
            let caps = re.captures_iter(line).last().ok_or_else(unrecognized)?;
            Ok(triple(&caps))
        }
        CompilerFamily::Clang => {
            let re = Regex::new(r"clang version (\d+)\.(\d+)\.(\d+)").expect("valid regex");
            let caps = re.captures(banner).ok_or_else(unrecognized)?;
            Ok(triple(&caps))
        }
        CompilerFamily::Emscripten => {
            let re = Regex::new(r"emcc \(Emscripten[^)]*\) (\d+)\.(\d+)\.(\d+)")
                .expect("valid regex");
            let caps = re.captures(banner).ok_or_else(unrecognized)?;
            Ok(triple(&caps))
        }
        CompilerFamily::Msvc => {
            let re = Regex::new(r"Compiler Version (\d+)\.(\d+)\.(\d+)").expect("valid regex");
            let caps = re.captures(banner).ok_or_else(unrecognized)?;
            Ok(triple(&caps))
        }
        CompilerFamily::Unknown => Err(unrecognized()),
    }
}

fn triple(caps: &regex::Captures<'_>) -> (u64, u64, u64) {
    let field = |i: usize| caps[i].parse::<u64>().unwrap_or(0);
    (field(1), field(2), field(3))
}

/// Best-effort linker identification from a linker version banner
/// (`-Wl,--version` output or similar).
///
/// Substring order matters: LLD and gold banners also mention "GNU" or "ld".
pub fn extract_linker_id(output: &str) -> Option<&'static str> {
    if output.contains("wasm-ld") {
        Some("wasm-ld")
    } else if output.contains("LLD") {
        Some("ld.lld")
    } else if output.contains("mold") {
        Some("mold")
    } else if output.contains("GNU gold") {
        Some("ld.gold")
    } else if output.contains("GNU ld") {
        Some("ld.bfd")
    } else if output.contains("Microsoft (R) Incremental Linker") {
        Some("link")
    } else {
        None
    }
}
