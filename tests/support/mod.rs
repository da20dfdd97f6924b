//! Shared helpers for integration tests: fake compiler scripts that stand in
//! for real toolchains.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// A gcc-looking toolchain: realistic `--version` and linker banners, and a
/// preprocessed delimiter line for everything else.
pub const GCC_LIKE: &str = r#"for arg in "$@"; do
    if [ "$arg" = "--version" ]; then
        echo 'gcc (GCC) 13.2.0'
        echo 'Copyright (C) 2023 Free Software Foundation, Inc.'
        exit 0
    fi
    if [ "$arg" = "-Wl,--version" ]; then
        echo 'GNU ld (GNU Binutils) 2.40'
        exit 0
    fi
done
echo '"MESON_DELIMITER" gcc'"#;

/// Minimal probe answer with no quoting around the delimiter.
pub const BARE_DELIMITER_GCC: &str = "echo 'MESON_DELIMITERgcc'";

/// A compiler that runs fine but never emits the delimiter.
pub const NO_DELIMITER: &str = "echo 'mystery compiler, no marker here'";

/// A compiler that fails outright with a diagnostic on stderr.
pub const FAILS_LOUDLY: &str = "echo 'error: unsupported option' >&2\nexit 1";

/// Writes an executable `/bin/sh` script into `dir` and returns its path.
pub fn fake_compiler(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    path
}
