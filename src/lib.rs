//! toolprobe - compiler and toolchain identification probing
//!
//! This library lets a build-system frontend learn, before generating any
//! build rules, which compiler it is talking to: its family (gcc, clang,
//! emscripten, msvc), its version, and its linker, plus whether individual
//! flags, functions, or snippets are supported.
//!
//! # Core Concepts
//!
//! - **Probe fragment**: a minimal source text compiled solely so the
//!   toolchain announces itself through a delimiter-marked output line
//! - **Identification**: the generate -> invoke -> parse pipeline that turns
//!   one compiler invocation into a typed [`IdentificationResult`]
//! - **Capability cache**: process-wide memoization keyed by a fingerprint
//!   of (compiler path, flags, probe kind, relevant environment), with
//!   single-flight semantics under concurrency
//!
//! # Example Usage
//!
//! ```ignore
//! use toolprobe::{CompilerSpec, ProbeConfig, ProbeKind, ProbeService};
//!
//! async fn identify() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ProbeService::new(ProbeConfig::from_env()?);
//!     let cc = CompilerSpec::new("/usr/bin/cc", ProbeKind::C)
//!         .with_flags(["-std=c11"]);
//!
//!     let result = service.resolve(&cc).await?;
//!     println!("family: {}", result.family);
//!     if let Some((major, minor, patch)) = result.release() {
//!         println!("release: {major}.{minor}.{patch}");
//!     }
//!
//!     // Capability probing for flag negotiation
//!     if service.has_argument(&cc, "-fno-omit-frame-pointer").await? {
//!         println!("frame pointers can be kept");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`probe`]: probe fragments and the compiler family enum
//! - [`invoker`]: child-process execution with scoped temp files and timeouts
//! - [`parser`]: delimiter extraction and version banner grammars
//! - [`cache`]: the invocation-keyed capability cache
//! - [`service`]: the resolve pipeline and capability checks

// Public modules
pub mod cache;
pub mod config;
pub mod ident;
pub mod invoker;
pub mod parser;
pub mod probe;
pub mod service;
pub mod util;

// Re-export key types for convenient access
pub use cache::{CapabilityCache, InvocationKey};
pub use config::{ConfigError, ProbeConfig};
pub use ident::IdentificationResult;
pub use invoker::{InvocationOutput, InvocationRequest, InvokeError, Invoker, ProcessInvoker};
pub use parser::{ParseError, VersionInfo};
pub use probe::{CompilerFamily, FragmentError, ProbeFragment, ProbeKind, DELIMITER};
pub use service::{spec_for_lang, CompilerSpec, ProbeError, ProbeService};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
