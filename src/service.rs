//! Probe service orchestration
//!
//! [`ProbeService`] is the entry point a build orchestrator calls. It owns
//! the capability cache, the invoker seam, and the configuration, and wires
//! the generate -> invoke -> parse pipeline together:
//!
//! 1. compute the invocation key and consult the cache
//! 2. on a miss, preprocess the family probe fragment and extract the
//!    family token from the combined output
//! 3. best-effort, gather `--version` and linker information
//! 4. commit the result; failures propagate uncached
//!
//! Family identification is the load-bearing result. Version and linker
//! identity degrade to absent instead of failing the resolve.
//!
//! # Example
//!
//! ```no_run
//! use toolprobe::{CompilerSpec, ProbeConfig, ProbeKind, ProbeService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ProbeService::new(ProbeConfig::default());
//! let spec = CompilerSpec::new("/usr/bin/cc", ProbeKind::C);
//!
//! let result = service.resolve(&spec).await?;
//! println!("family: {}", result.family);
//! # Ok(())
//! # }
//! ```

use crate::cache::{CapabilityCache, InvocationKey};
use crate::config::{ConfigError, ProbeConfig};
use crate::ident::IdentificationResult;
use crate::invoker::{InvocationRequest, InvokeError, Invoker, ProcessInvoker, SourceInput};
use crate::parser::{self, ParseError, VersionInfo};
use crate::probe::{CompilerFamily, FragmentError, ProbeFragment, ProbeKind};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by [`ProbeService`]
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No probe fragment exists for the requested language
    #[error(transparent)]
    UnsupportedProbeKind(#[from] FragmentError),

    /// Spawning or supervising the compiler failed
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// The compiler failed and emitted nothing the parser can use
    #[error("Compiler {compiler} exited with status {code:?} and produced no usable output")]
    NoUsableOutput {
        compiler: PathBuf,
        code: Option<i32>,
    },

    /// A probe ran but answered something outside its contract
    #[error("Unexpected probe output from {compiler}: {detail}")]
    UnexpectedOutput { compiler: PathBuf, detail: String },

    /// Version banner parsing failed (only from the version-specific API;
    /// `resolve` degrades instead)
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Full identity of the compiler under test: executable path, the flags a
/// real build would pass, and the probed language.
///
/// Carrying the whole identity on every call (rather than any ambient
/// "current compiler" state) is what makes results reproducible and
/// cacheable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSpec {
    pub path: PathBuf,
    pub flags: Vec<String>,
    pub kind: ProbeKind,
}

impl CompilerSpec {
    pub fn new(path: impl Into<PathBuf>, kind: ProbeKind) -> Self {
        Self {
            path: path.into(),
            flags: Vec::new(),
            kind,
        }
    }

    pub fn with_flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    fn invocation_key(&self) -> InvocationKey {
        InvocationKey::compute(&self.path, &self.flags, self.kind)
    }
}

/// Compiler identification and capability probing.
///
/// Cheap to share behind an `Arc`; concurrent resolves for distinct
/// compilers proceed independently, while resolves for the same invocation
/// key collapse into one pipeline run (see [`CapabilityCache`]).
pub struct ProbeService {
    config: ProbeConfig,
    invoker: Arc<dyn Invoker>,
    cache: CapabilityCache,
}

impl ProbeService {
    pub fn new(config: ProbeConfig) -> Self {
        Self::with_invoker(config, Arc::new(ProcessInvoker::new()))
    }

    /// Builds a service over a custom invoker, the seam tests use to count
    /// or script process spawns.
    pub fn with_invoker(config: ProbeConfig, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            config,
            invoker,
            cache: CapabilityCache::new(),
        }
    }

    /// Identifies the compiler described by `spec`, consulting the cache
    /// first.
    ///
    /// A cache hit spawns nothing. A miss runs the pipeline exactly once,
    /// even under concurrent callers with the same key. Pipeline failures
    /// propagate to the caller and are never cached.
    pub async fn resolve(&self, spec: &CompilerSpec) -> Result<Arc<IdentificationResult>, ProbeError> {
        let key = spec.invocation_key();
        let result = self
            .cache
            .get_or_compute(&key, || self.identify(spec))
            .await?;

        info!(
            compiler = %spec.path.display(),
            family = %result.family,
            "Compiler resolved"
        );
        Ok(result)
    }

    /// Runs the full identification pipeline, uncached.
    async fn identify(&self, spec: &CompilerSpec) -> Result<IdentificationResult, ProbeError> {
        let fragment = ProbeFragment::family(spec.kind);
        let output = self
            .invoker
            .invoke(&self.preprocess_request(spec, &fragment))
            .await?;
        let combined = output.combined();

        let family = parser::extract_family(&combined, fragment.delimiter());
        if family == CompilerFamily::Unknown
            && !output.success
            && !combined.contains(fragment.delimiter())
        {
            return Err(ProbeError::NoUsableOutput {
                compiler: spec.path.clone(),
                code: output.exit_code,
            });
        }
        debug!(compiler = %spec.path.display(), family = %family, "Family probe parsed");

        // Unknown compilers have no version grammar or linker conventions
        // to consult; report family only.
        if family == CompilerFamily::Unknown {
            return Ok(IdentificationResult::unknown());
        }

        let version = self.detect_version(spec, family).await;
        let linker_id = self.detect_linker(spec, family).await;

        Ok(IdentificationResult {
            family,
            version,
            linker_id,
        })
    }

    /// `--version` invocation plus per-family banner parse. Any failure
    /// degrades to an absent version; a banner that matches no grammar is
    /// not worth keeping, since compilers that mishandle `--version` echo
    /// arbitrary junk here.
    async fn detect_version(&self, spec: &CompilerSpec, family: CompilerFamily) -> Option<VersionInfo> {
        let request = InvocationRequest {
            compiler: spec.path.clone(),
            args: vec!["--version".to_string()],
            source: None,
            timeout: self.config.timeout,
        };

        let banner = match self.invoker.invoke(&request).await {
            Ok(output) => output.combined(),
            Err(err) => {
                warn!(
                    compiler = %spec.path.display(),
                    error = %err,
                    "Version invocation failed, continuing without version"
                );
                return None;
            }
        };

        match VersionInfo::from_banner(family, &banner) {
            Ok(info) => Some(info),
            Err(err) => {
                debug!(
                    compiler = %spec.path.display(),
                    error = %err,
                    "Version banner did not match the family grammar, continuing without version"
                );
                None
            }
        }
    }

    /// Links a trivial program with `-Wl,--version` and scans the banner
    /// for a known linker. MSVC always links through `link`.
    async fn detect_linker(&self, spec: &CompilerSpec, family: CompilerFamily) -> Option<String> {
        if family == CompilerFamily::Msvc {
            return Some("link".to_string());
        }

        let output = self
            .try_compile(spec, &["-Wl,--version"], "int main(void) { return 0; }\n", true)
            .await
            .ok()?;
        parser::extract_linker_id(&output.combined()).map(str::to_string)
    }

    /// Checks whether the compiler accepts `flag` when compiling an empty
    /// translation unit.
    pub async fn has_argument(&self, spec: &CompilerSpec, flag: &str) -> Result<bool, ProbeError> {
        let output = self.try_compile(spec, &[flag], "", false).await?;
        Ok(output.success)
    }

    /// Filters `flags` down to those the compiler accepts, preserving
    /// order. Each candidate is tested independently.
    pub async fn get_supported_arguments(
        &self,
        spec: &CompilerSpec,
        flags: &[String],
    ) -> Result<Vec<String>, ProbeError> {
        let mut supported = Vec::new();
        for flag in flags {
            if self.has_argument(spec, flag).await? {
                supported.push(flag.clone());
            }
        }
        Ok(supported)
    }

    /// Checks whether `code` compiles (no link step).
    pub async fn compiles(&self, spec: &CompilerSpec, code: &str) -> Result<bool, ProbeError> {
        let output = self.try_compile(spec, &[], code, false).await?;
        Ok(output.success)
    }

    /// Checks whether `code` compiles and links.
    pub async fn links(&self, spec: &CompilerSpec, code: &str) -> Result<bool, ProbeError> {
        let output = self.try_compile(spec, &[], code, true).await?;
        Ok(output.success)
    }

    /// Checks whether `function` is declarable and addressable.
    pub async fn has_function(&self, spec: &CompilerSpec, function: &str) -> Result<bool, ProbeError> {
        let code = format!("int main(void) {{ void *p = (void*)({function}); return 0; }}\n");
        self.links(spec, &code).await
    }

    /// Checks whether a trivial program links with `flag`.
    pub async fn has_link_argument(&self, spec: &CompilerSpec, flag: &str) -> Result<bool, ProbeError> {
        let output = self
            .try_compile(spec, &[flag], "int main(void) { return 0; }\n", true)
            .await?;
        Ok(output.success)
    }

    /// Checks whether a trivial program links with all of `flags` at once.
    pub async fn has_multi_link_arguments(
        &self,
        spec: &CompilerSpec,
        flags: &[String],
    ) -> Result<bool, ProbeError> {
        let refs: Vec<&str> = flags.iter().map(String::as_str).collect();
        let output = self
            .try_compile(spec, &refs, "int main(void) { return 0; }\n", true)
            .await?;
        Ok(output.success)
    }

    /// Asks the preprocessor whether global symbols carry an underscore
    /// prefix on this target.
    pub async fn symbols_have_underscore_prefix(
        &self,
        spec: &CompilerSpec,
    ) -> Result<bool, ProbeError> {
        let fragment = ProbeFragment::underscore_prefix(spec.kind);
        let output = self
            .invoker
            .invoke(&self.preprocess_request(spec, &fragment))
            .await?;
        let combined = output.combined();

        match parser::extract_underscore_prefix(&combined, fragment.delimiter()) {
            Some(prefixed) => Ok(prefixed),
            None => Err(ProbeError::UnexpectedOutput {
                compiler: spec.path.clone(),
                detail: "underscore-prefix probe emitted no recognizable answer".to_string(),
            }),
        }
    }

    /// Explicitly forgets every cached identification.
    pub fn reset_cache(&self) {
        self.cache.reset();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Child processes spawned by this service so far; lets callers verify
    /// that cache hits spawn nothing.
    pub fn spawn_count(&self) -> u64 {
        self.invoker.spawn_count()
    }

    fn preprocess_request(&self, spec: &CompilerSpec, fragment: &ProbeFragment) -> InvocationRequest {
        let mut args = spec.flags.clone();
        args.push("-c".to_string());
        args.push("-E".to_string());
        InvocationRequest {
            compiler: spec.path.clone(),
            args,
            source: Some(SourceInput {
                file_name: fragment.source_file_name().to_string(),
                text: fragment.source().to_string(),
            }),
            timeout: self.config.timeout,
        }
    }

    /// One compile (or compile+link) of `code` with the spec's flags plus
    /// `extra_args`, mirroring how a real build would invoke the compiler.
    /// Exit status is the caller's signal; non-zero is not an error here.
    async fn try_compile(
        &self,
        spec: &CompilerSpec,
        extra_args: &[&str],
        code: &str,
        link: bool,
    ) -> Result<crate::invoker::InvocationOutput, ProbeError> {
        let mut args = spec.flags.clone();
        if !link {
            args.push("-c".to_string());
        }
        args.extend(extra_args.iter().map(|s| s.to_string()));

        let request = InvocationRequest {
            compiler: spec.path.clone(),
            args,
            source: Some(SourceInput {
                file_name: spec.kind.source_file_name().to_string(),
                text: code.to_string(),
            }),
            timeout: self.config.timeout,
        };

        Ok(self.invoker.invoke(&request).await?)
    }
}

/// Resolves a caller-supplied language tag and path in one step.
///
/// Convenience for orchestrators that carry languages as strings; the
/// unsupported-tag error surfaces before any process is spawned.
pub fn spec_for_lang(path: impl Into<PathBuf>, lang: &str) -> Result<CompilerSpec, ProbeError> {
    let kind = ProbeKind::from_lang(lang)?;
    Ok(CompilerSpec::new(path, kind))
}
