//! Identification result types
//!
//! The typed record a `resolve` call produces. Plain immutable data:
//! constructed only by the probing pipeline, handed to callers as a shared
//! reference, compared structurally.

use crate::parser::VersionInfo;
use crate::probe::CompilerFamily;
use serde::{Deserialize, Serialize};

/// What was learned about one compiler invocation key.
///
/// Family is the load-bearing field; version and linker identity are
/// best-effort and absent when their detection failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationResult {
    pub family: CompilerFamily,
    pub version: Option<VersionInfo>,
    pub linker_id: Option<String>,
}

impl IdentificationResult {
    /// Result for a compiler that ran the probe but matched no known family.
    pub fn unknown() -> Self {
        Self {
            family: CompilerFamily::Unknown,
            version: None,
            linker_id: None,
        }
    }

    /// Parsed release triple, when the version banner matched its grammar.
    pub fn release(&self) -> Option<(u64, u64, u64)> {
        self.version.as_ref().and_then(|v| v.parsed)
    }

    /// Render the result as pretty JSON for logs and tool output.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
