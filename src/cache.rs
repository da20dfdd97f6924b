//! Capability cache
//!
//! Memoizes identification results per invocation key so repeated
//! configuration runs never re-invoke the compiler. Two guarantees:
//!
//! - single-flight: at most one pipeline computation is in flight per key;
//!   concurrent callers for the same key await that one result
//! - failures are never cached: a failed pipeline leaves no entry behind
//!   and the next caller retries from scratch
//!
//! Compiler identity is assumed stable for the cache's lifetime (one
//! configuration run); there is no eviction, only an explicit [`reset`].
//!
//! [`reset`]: CapabilityCache::reset

use crate::ident::IdentificationResult;
use crate::probe::ProbeKind;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Environment variables that change compilation behavior without appearing
/// on the command line; their values are folded into the fingerprint.
const COMPILATION_ENV_VARS: [&str; 5] = [
    "CPATH",
    "C_INCLUDE_PATH",
    "CPLUS_INCLUDE_PATH",
    "INCLUDE",
    "LIB",
];

/// Fingerprint of one identification request.
///
/// Two requests with equal keys are interchangeable: same resolved compiler
/// path, same flags in the same order, same probe kind, same relevant
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvocationKey(String);

impl InvocationKey {
    pub fn compute(compiler: &Path, flags: &[String], kind: ProbeKind) -> Self {
        // Canonicalize so `cc`, `./cc`, and the absolute path coincide;
        // fall back to the literal path when resolution fails (the pipeline
        // will surface the real error).
        let resolved = compiler
            .canonicalize()
            .unwrap_or_else(|_| compiler.to_path_buf());

        let mut hasher = Sha256::new();
        hasher.update(resolved.to_string_lossy().as_bytes());
        hasher.update([0]);
        for flag in flags {
            hasher.update(flag.as_bytes());
            hasher.update([0]);
        }
        hasher.update(kind.as_str().as_bytes());
        hasher.update([0]);
        for var in COMPILATION_ENV_VARS {
            if let Ok(value) = std::env::var(var) {
                hasher.update(var.as_bytes());
                hasher.update([b'=']);
                hasher.update(value.as_bytes());
                hasher.update([0]);
            }
        }

        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// One result slot; the async mutex is what serializes same-key callers.
type Slot = Arc<tokio::sync::Mutex<Option<Arc<IdentificationResult>>>>;

/// Process-wide mapping from invocation key to identification result.
#[derive(Debug, Default)]
pub struct CapabilityCache {
    slots: Mutex<HashMap<InvocationKey, Slot>>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &InvocationKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|poison| poison.into_inner());
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Returns the cached result for `key`, or runs `compute` exactly once
    /// to produce it.
    ///
    /// A hit returns without awaiting `compute` and with no side effects.
    /// On a miss, concurrent callers for the same key block on the slot
    /// until the single in-flight computation commits; distinct keys never
    /// contend. An `Err` from `compute` propagates to its caller and drops
    /// the key's entry, so the next caller retries from scratch.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &InvocationKey,
        compute: F,
    ) -> Result<Arc<IdentificationResult>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<IdentificationResult, E>>,
    {
        let slot = self.slot(key);
        let mut guard = slot.lock().await;

        if let Some(result) = guard.as_ref() {
            debug!(key = key.as_hex(), "Capability cache hit");
            return Ok(Arc::clone(result));
        }

        debug!(key = key.as_hex(), "Capability cache miss, running pipeline");
        let result = match compute().await {
            Ok(result) => Arc::new(result),
            Err(err) => {
                // The slot never committed, so drop its map entry too;
                // otherwise every distinct failing key grows the map.
                // Callers already parked on this slot recompute against
                // the detached Arc, later callers get a fresh entry.
                let mut slots = self.slots.lock().unwrap_or_else(|poison| poison.into_inner());
                if slots.get(key).is_some_and(|entry| Arc::ptr_eq(entry, &slot)) {
                    slots.remove(key);
                }
                return Err(err);
            }
        };
        *guard = Some(Arc::clone(&result));
        Ok(result)
    }

    /// Non-blocking peek; `None` for unknown keys and keys whose
    /// computation is still in flight or failed.
    pub fn lookup(&self, key: &InvocationKey) -> Option<Arc<IdentificationResult>> {
        let slots = self.slots.lock().unwrap_or_else(|poison| poison.into_inner());
        let slot = slots.get(key)?;
        let guard = slot.try_lock().ok()?;
        guard.as_ref().map(Arc::clone)
    }

    /// Number of keys with a committed result.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|poison| poison.into_inner());
        slots
            .values()
            .filter(|slot| matches!(slot.try_lock().as_deref(), Ok(Some(_))))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. The next `get_or_compute` for any key runs the
    /// pipeline again.
    pub fn reset(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(|poison| poison.into_inner());
        slots.clear();
    }
}
