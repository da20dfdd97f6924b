//! Toolchain invocation
//!
//! This module runs a compiler binary against a probe fragment and captures
//! what it says. Each invocation:
//!
//! - validates the executable before spawning
//! - writes the fragment into a scoped temporary directory, removed on
//!   every exit path via RAII
//! - spawns exactly one child process, never reused
//! - enforces a bounded timeout; an expired child is killed and reaped,
//!   never orphaned
//!
//! The [`Invoker`] trait is the seam between the probing pipeline and the
//! operating system, so tests can substitute a spawn-counting double.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors that can occur while invoking a toolchain binary
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The compiler executable does not exist
    #[error("Compiler executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    /// The compiler executable exists but cannot be executed
    #[error("Permission denied executing compiler: {0}")]
    PermissionDenied(PathBuf),

    /// The child process exceeded the configured timeout and was killed
    #[error("Compiler invocation timed out after {seconds}s: {compiler}")]
    Timeout { compiler: PathBuf, seconds: u64 },

    /// Temp-file or pipe I/O failed
    #[error("I/O error invoking {compiler}: {source}")]
    Io {
        compiler: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source text to place in the invocation's scratch directory.
#[derive(Debug, Clone)]
pub struct SourceInput {
    /// File name inside the scratch directory; the extension selects the
    /// compiler's language mode.
    pub file_name: String,
    pub text: String,
}

/// One compiler invocation: binary, flags, optional source, time bound.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub compiler: PathBuf,
    /// Flags placed before the source path, in order.
    pub args: Vec<String>,
    /// When present, written to the scratch directory and appended as the
    /// final argument.
    pub source: Option<SourceInput>,
    pub timeout: Duration,
}

/// Captured result of a completed (non-timed-out) invocation.
///
/// A non-zero exit is data, not an error: capability checks treat it as
/// "unsupported" and the probe parser may still find usable output in it.
#[derive(Debug, Clone)]
pub struct InvocationOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
    pub duration: Duration,
}

impl InvocationOutput {
    /// The single output channel the probe contract is defined over:
    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        combined.push_str(&self.stdout);
        if !self.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&self.stderr);
        }
        combined
    }
}

/// Seam between the probing pipeline and process execution.
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Runs one invocation to completion or timeout.
    async fn invoke(&self, request: &InvocationRequest) -> Result<InvocationOutput, InvokeError>;

    /// Total child processes spawned so far. Used to verify cache hits and
    /// single-flight behavior never spawn.
    fn spawn_count(&self) -> u64;
}

/// Production invoker backed by `tokio::process`.
#[derive(Debug, Default)]
pub struct ProcessInvoker {
    spawned: AtomicU64,
}

impl ProcessInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves and validates the executable before any spawn attempt, so
    /// missing-binary and permission problems surface as their own error
    /// kinds rather than a generic spawn failure.
    fn validate_executable(path: &Path) -> Result<PathBuf, InvokeError> {
        let resolved = path
            .canonicalize()
            .map_err(|_| InvokeError::ExecutableNotFound(path.to_path_buf()))?;
        if !resolved.is_file() {
            return Err(InvokeError::ExecutableNotFound(path.to_path_buf()));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = resolved
                .metadata()
                .map_err(|source| InvokeError::Io {
                    compiler: path.to_path_buf(),
                    source,
                })?
                .permissions()
                .mode();
            if mode & 0o111 == 0 {
                return Err(InvokeError::PermissionDenied(path.to_path_buf()));
            }
        }

        Ok(resolved)
    }
}

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> Result<InvocationOutput, InvokeError> {
        let compiler = Self::validate_executable(&request.compiler)?;

        // Scratch directory for the source file and anything the compiler
        // drops next to it (objects, a.out). TempDir removes it on drop,
        // which covers success, error, timeout, and panic alike.
        let scratch = tempfile::TempDir::new().map_err(|source| InvokeError::Io {
            compiler: request.compiler.clone(),
            source,
        })?;

        let mut command = Command::new(&compiler);
        command
            .args(&request.args)
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Timeout drops the wait future below; this turns that drop
            // into a SIGKILL instead of an orphan.
            .kill_on_drop(true);

        if let Some(source) = &request.source {
            let source_path = scratch.path().join(&source.file_name);
            tokio::fs::write(&source_path, &source.text)
                .await
                .map_err(|source| InvokeError::Io {
                    compiler: request.compiler.clone(),
                    source,
                })?;
            command.arg(&source_path);
        }

        debug!(
            compiler = %compiler.display(),
            args = ?request.args,
            "Spawning compiler"
        );

        let started = Instant::now();
        let child = command.spawn().map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => {
                InvokeError::ExecutableNotFound(request.compiler.clone())
            }
            std::io::ErrorKind::PermissionDenied => {
                InvokeError::PermissionDenied(request.compiler.clone())
            }
            _ => InvokeError::Io {
                compiler: request.compiler.clone(),
                source: err,
            },
        })?;
        self.spawned.fetch_add(1, Ordering::Relaxed);

        let output = match tokio::time::timeout(request.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| InvokeError::Io {
                compiler: request.compiler.clone(),
                source,
            })?,
            Err(_) => {
                warn!(
                    compiler = %compiler.display(),
                    timeout_secs = request.timeout.as_secs(),
                    "Compiler invocation timed out, child killed"
                );
                return Err(InvokeError::Timeout {
                    compiler: request.compiler.clone(),
                    seconds: request.timeout.as_secs(),
                });
            }
        };

        let duration = started.elapsed();
        let result = InvocationOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            success: output.status.success(),
            duration,
        };

        debug!(
            compiler = %compiler.display(),
            exit_code = ?result.exit_code,
            duration_ms = duration.as_millis() as u64,
            "Compiler invocation finished"
        );

        Ok(result)
    }

    fn spawn_count(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }
}
