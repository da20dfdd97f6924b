//! End-to-end identification against fake compiler scripts
//!
//! These tests run the real pipeline: ProcessInvoker spawning a shell script
//! that plays the part of a toolchain, scoped temp files, and the actual
//! delimiter wire contract.

#![cfg(unix)]

mod support;

use support::{fake_compiler, BARE_DELIMITER_GCC, GCC_LIKE, NO_DELIMITER};
use tempfile::TempDir;
use toolprobe::{CompilerFamily, CompilerSpec, ProbeConfig, ProbeKind, ProbeService};

#[tokio::test]
async fn bare_delimiter_output_identifies_gcc_without_version() {
    let dir = TempDir::new().unwrap();
    let cc = fake_compiler(dir.path(), "cc", BARE_DELIMITER_GCC);

    let service = ProbeService::new(ProbeConfig::default());
    let result = service
        .resolve(&CompilerSpec::new(&cc, ProbeKind::C))
        .await
        .unwrap();

    assert_eq!(result.family, CompilerFamily::Gcc);
    // The script's --version output is not a gcc banner, so no version is
    // recorded, not even the raw probe line.
    assert_eq!(result.version, None);
    assert_eq!(result.release(), None);
}

#[tokio::test]
async fn realistic_gcc_banners_yield_full_identification() {
    let dir = TempDir::new().unwrap();
    let cc = fake_compiler(dir.path(), "gcc", GCC_LIKE);

    let service = ProbeService::new(ProbeConfig::default());
    let result = service
        .resolve(&CompilerSpec::new(&cc, ProbeKind::C))
        .await
        .unwrap();

    assert_eq!(result.family, CompilerFamily::Gcc);
    assert_eq!(result.release(), Some((13, 2, 0)));
    assert_eq!(result.version.as_ref().unwrap().raw, "gcc (GCC) 13.2.0");
    assert_eq!(result.linker_id.as_deref(), Some("ld.bfd"));
}

#[tokio::test]
async fn missing_delimiter_is_unknown_not_error() {
    let dir = TempDir::new().unwrap();
    let cc = fake_compiler(dir.path(), "mystery-cc", NO_DELIMITER);

    let service = ProbeService::new(ProbeConfig::default());
    let result = service
        .resolve(&CompilerSpec::new(&cc, ProbeKind::C))
        .await
        .unwrap();

    assert_eq!(result.family, CompilerFamily::Unknown);
    assert_eq!(result.version, None);
    assert_eq!(result.linker_id, None);
    // Unknown compilers get no version or linker invocations.
    assert_eq!(service.spawn_count(), 1);
}

#[tokio::test]
async fn delimiter_amid_diagnostics_is_still_found() {
    let dir = TempDir::new().unwrap();
    let cc = fake_compiler(
        dir.path(),
        "chatty-cc",
        r#"echo 'probe.c:2:1: warning: extra tokens'
echo 'note: consult the manual'
echo '"MESON_DELIMITER" clang'
echo 'note: 1 warning generated'"#,
    );

    let service = ProbeService::new(ProbeConfig::default());
    let result = service
        .resolve(&CompilerSpec::new(&cc, ProbeKind::C))
        .await
        .unwrap();

    assert_eq!(result.family, CompilerFamily::Clang);
}

#[tokio::test]
async fn cpp_probe_kind_writes_a_cpp_source() {
    let dir = TempDir::new().unwrap();
    // Only answers when handed a .cpp translation unit.
    let cc = fake_compiler(
        dir.path(),
        "c++",
        r#"for arg in "$@"; do
    case "$arg" in
    *.cpp)
        echo '"MESON_DELIMITER" gcc'
        exit 0
        ;;
    esac
done
echo 'no C++ source given' >&2
exit 1"#,
    );

    let service = ProbeService::new(ProbeConfig::default());
    let spec = CompilerSpec::new(&cc, ProbeKind::Cpp);
    let result = service.resolve(&spec).await.unwrap();

    assert_eq!(result.family, CompilerFamily::Gcc);
}

#[tokio::test]
async fn capability_checks_follow_exit_status() {
    let dir = TempDir::new().unwrap();
    // Rejects -fbogus, accepts everything else.
    let cc = fake_compiler(
        dir.path(),
        "cc",
        r#"for arg in "$@"; do
    if [ "$arg" = "-fbogus" ]; then
        echo "cc: error: unrecognized command-line option '-fbogus'" >&2
        exit 1
    fi
done
exit 0"#,
    );

    let service = ProbeService::new(ProbeConfig::default());
    let spec = CompilerSpec::new(&cc, ProbeKind::C);

    assert!(service.has_argument(&spec, "-Wall").await.unwrap());
    assert!(!service.has_argument(&spec, "-fbogus").await.unwrap());

    let supported = service
        .get_supported_arguments(
            &spec,
            &["-Wall".to_string(), "-fbogus".to_string(), "-O2".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(supported, vec!["-Wall".to_string(), "-O2".to_string()]);

    assert!(service.compiles(&spec, "int x;").await.unwrap());
    assert!(service.links(&spec, "int main(void) { return 0; }").await.unwrap());
    assert!(service.has_link_argument(&spec, "-lm").await.unwrap());
}

#[tokio::test]
async fn underscore_prefix_probe_round_trips() {
    let dir = TempDir::new().unwrap();
    let prefixed = fake_compiler(dir.path(), "cc-darwin", r#"echo '"MESON_DELIMITER" _'"#);
    let bare = fake_compiler(dir.path(), "cc-linux", r#"echo '"MESON_DELIMITER"'"#);

    let service = ProbeService::new(ProbeConfig::default());

    assert!(service
        .symbols_have_underscore_prefix(&CompilerSpec::new(&prefixed, ProbeKind::C))
        .await
        .unwrap());
    assert!(!service
        .symbols_have_underscore_prefix(&CompilerSpec::new(&bare, ProbeKind::C))
        .await
        .unwrap());
}
