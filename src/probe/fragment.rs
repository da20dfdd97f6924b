//! Probe fragment generation
//!
//! A probe fragment is a minimal source text compiled solely to extract
//! toolchain facts from the compiler's output. Every fragment embeds a fixed
//! delimiter literal so the machine-readable part can be located inside
//! otherwise free-form diagnostics. Generation is pure: no filesystem or
//! process access happens here.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Delimiter marking the start of machine-readable probe output.
///
/// Chosen to never appear in legitimate compiler diagnostics. The fragment
/// source carries it as a string literal, so preprocessed output shows it
/// quoted; the parser accounts for that.
pub const DELIMITER: &str = "MESON_DELIMITER";

/// Emscripten defines __clang__ and clang defines __GNUC__, so the chain
/// must test from most- to least-specific.
const FAMILY_SOURCE: &str = r#"#if defined(__EMSCRIPTEN__)
#define PROBE_COMPILER_FAMILY emscripten
#elif defined(__clang__)
#define PROBE_COMPILER_FAMILY clang
#elif defined(__GNUC__)
#define PROBE_COMPILER_FAMILY gcc
#elif defined(_MSC_VER)
#define PROBE_COMPILER_FAMILY msvc
#endif
"MESON_DELIMITER" PROBE_COMPILER_FAMILY
"#;

/// Expands to `_` on targets that prefix global symbols, to nothing
/// otherwise.
const UNDERSCORE_PREFIX_SOURCE: &str = r#"#ifdef __USER_LABEL_PREFIX__
#define PROBE_UNDERSCORE_PREFIX __USER_LABEL_PREFIX__
#else
#define PROBE_UNDERSCORE_PREFIX
#endif
"MESON_DELIMITER" PROBE_UNDERSCORE_PREFIX
"#;

/// Errors raised during probe fragment generation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    /// The requested language has no probe fragment
    #[error("Unsupported probe kind: {0}")]
    UnsupportedProbeKind(String),
}

/// The probed source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    C,
    Cpp,
}

impl ProbeKind {
    /// Resolves a caller-supplied language tag to a probe kind.
    ///
    /// Unsupported tags are an explicit error, never a silent fallback.
    pub fn from_lang(lang: &str) -> Result<Self, FragmentError> {
        match lang {
            "c" => Ok(ProbeKind::C),
            "cpp" => Ok(ProbeKind::Cpp),
            other => Err(FragmentError::UnsupportedProbeKind(other.to_string())),
        }
    }

    /// File name the fragment is written under; the extension is how most
    /// compilers pick the language mode.
    pub fn source_file_name(&self) -> &'static str {
        match self {
            ProbeKind::C => "probe.c",
            ProbeKind::Cpp => "probe.cpp",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::C => "c",
            ProbeKind::Cpp => "cpp",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated probe: source text plus the delimiter used to locate its
/// output. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFragment {
    kind: ProbeKind,
    source: &'static str,
    delimiter: &'static str,
}

impl ProbeFragment {
    /// The family-identification fragment: a conditional macro chain that
    /// emits the delimiter followed by the family token of whichever
    /// compiler preprocesses it.
    pub fn family(kind: ProbeKind) -> Self {
        Self {
            kind,
            source: FAMILY_SOURCE,
            delimiter: DELIMITER,
        }
    }

    /// The symbol-prefix fragment: emits the delimiter followed by `_` on
    /// targets whose global symbols carry an underscore prefix.
    pub fn underscore_prefix(kind: ProbeKind) -> Self {
        Self {
            kind,
            source: UNDERSCORE_PREFIX_SOURCE,
            delimiter: DELIMITER,
        }
    }

    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        self.source
    }

    pub fn delimiter(&self) -> &str {
        self.delimiter
    }

    pub fn source_file_name(&self) -> &'static str {
        self.kind.source_file_name()
    }
}
