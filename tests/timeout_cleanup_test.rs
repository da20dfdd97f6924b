//! Timeout and resource cleanup tests
//!
//! A hung compiler must not leave an orphaned child process or a leftover
//! temp file behind; the caller gets a Timeout error promptly.

#![cfg(unix)]

mod support;

use serial_test::serial;
use std::fs;
use std::time::{Duration, Instant};
use support::fake_compiler;
use tempfile::TempDir;
use toolprobe::{CompilerSpec, InvokeError, ProbeConfig, ProbeError, ProbeKind, ProbeService};

#[tokio::test]
#[serial]
async fn timeout_kills_the_child_and_cleans_temp_files() {
    let script_dir = TempDir::new().unwrap();
    let scratch_root = TempDir::new().unwrap();

    // Record the child's PID, then become sleep(1) so a surviving process
    // is detectable after the timeout fires.
    let pid_file = script_dir.path().join("child.pid");
    let cc = fake_compiler(
        script_dir.path(),
        "hung-cc",
        &format!("echo $$ > {}\nexec /bin/sleep 30", pid_file.display()),
    );

    // Route the invoker's scratch dirs somewhere we can audit afterwards.
    std::env::set_var("TMPDIR", scratch_root.path());

    let service = ProbeService::new(ProbeConfig::with_timeout(Duration::from_millis(300)));
    let spec = CompilerSpec::new(&cc, ProbeKind::C);

    let started = Instant::now();
    let result = service.resolve(&spec).await;
    std::env::remove_var("TMPDIR");

    match result {
        Err(ProbeError::Invoke(InvokeError::Timeout { compiler, .. })) => {
            assert_eq!(compiler, cc);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
    // The caller was not blocked for anywhere near the child's sleep.
    assert!(started.elapsed() < Duration::from_secs(5));

    // No leftover scratch directories.
    let leftovers: Vec<_> = fs::read_dir(scratch_root.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "leftover temp artifacts: {leftovers:?}");

    // No orphaned child: the recorded PID must disappear once the kill is
    // processed.
    #[cfg(target_os = "linux")]
    {
        let pid: u32 = fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        let proc_path = format!("/proc/{pid}");
        let mut alive = std::path::Path::new(&proc_path).exists();
        for _ in 0..30 {
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            alive = std::path::Path::new(&proc_path).exists();
        }
        assert!(!alive, "child process {pid} survived the timeout");
    }

    // The failed resolve was not cached.
    assert_eq!(service.cache_size(), 0);
}

#[tokio::test]
#[serial]
async fn timeout_on_one_invocation_does_not_affect_others() {
    let dir = TempDir::new().unwrap();
    let hung = fake_compiler(dir.path(), "hung-cc", "exec /bin/sleep 30");
    let quick = fake_compiler(dir.path(), "quick-cc", support::GCC_LIKE);

    let service = std::sync::Arc::new(ProbeService::new(ProbeConfig::with_timeout(
        Duration::from_millis(300),
    )));

    let hung_spec = CompilerSpec::new(&hung, ProbeKind::C);
    let quick_spec = CompilerSpec::new(&quick, ProbeKind::C);

    let hung_task = {
        let service = std::sync::Arc::clone(&service);
        tokio::spawn(async move { service.resolve(&hung_spec).await })
    };
    let quick_task = {
        let service = std::sync::Arc::clone(&service);
        tokio::spawn(async move { service.resolve(&quick_spec).await })
    };

    let quick_result = quick_task.await.unwrap().unwrap();
    assert_eq!(quick_result.family, toolprobe::CompilerFamily::Gcc);

    assert!(matches!(
        hung_task.await.unwrap(),
        Err(ProbeError::Invoke(InvokeError::Timeout { .. }))
    ));
}
