//! Compiler family classification
//!
//! A compiler family is the vendor/toolchain lineage (gcc, clang, ...) as
//! opposed to any specific version. Families are recognized by the exact
//! token a probe fragment emits after the output delimiter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The toolchain lineage a compiler belongs to.
///
/// `Unknown` is a valid classification, not an error: a compiler that runs
/// the probe but emits no recognized token is still useful information for
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
    Emscripten,
    Clang,
    Gcc,
    Msvc,
    Unknown,
}

impl CompilerFamily {
    /// Maps a probe output token to a family via exact match.
    ///
    /// Tokens outside the known set map to `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "emscripten" => CompilerFamily::Emscripten,
            "clang" => CompilerFamily::Clang,
            "gcc" => CompilerFamily::Gcc,
            "msvc" => CompilerFamily::Msvc,
            _ => CompilerFamily::Unknown,
        }
    }

    /// The canonical lowercase name, matching the probe token.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerFamily::Emscripten => "emscripten",
            CompilerFamily::Clang => "clang",
            CompilerFamily::Gcc => "gcc",
            CompilerFamily::Msvc => "msvc",
            CompilerFamily::Unknown => "unknown",
        }
    }

    /// All families a probe fragment can announce.
    pub fn known() -> [CompilerFamily; 4] {
        [
            CompilerFamily::Emscripten,
            CompilerFamily::Clang,
            CompilerFamily::Gcc,
            CompilerFamily::Msvc,
        ]
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        emscripten = { "emscripten", CompilerFamily::Emscripten },
        clang = { "clang", CompilerFamily::Clang },
        gcc = { "gcc", CompilerFamily::Gcc },
        msvc = { "msvc", CompilerFamily::Msvc },
    )]
    fn from_token_known(token: &str, expected: CompilerFamily) {
        assert_eq!(CompilerFamily::from_token(token), expected);
    }

    #[parameterized(
        empty = { "" },
        case_sensitive = { "GCC" },
        partial = { "gc" },
        vendor = { "icc" },
    )]
    fn from_token_unknown(token: &str) {
        assert_eq!(CompilerFamily::from_token(token), CompilerFamily::Unknown);
    }

    #[test]
    fn token_round_trip() {
        for family in CompilerFamily::known() {
            assert_eq!(CompilerFamily::from_token(family.as_str()), family);
        }
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(CompilerFamily::Msvc.to_string(), "msvc");
        assert_eq!(CompilerFamily::Unknown.to_string(), "unknown");
    }
}
