//! Shared test helpers and utilities

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variables the binary reads; cleared so the host cannot leak in
const BUILD_ENV_VARS: &[&str] = &[
    "VIRTUAL_ENV",
    "CMAKE",
    "PYTHON",
    "LIVE2D_BUILD_JOBS",
    "LIVE2D_BUILD_CONFIG",
    "LIVE2D_BUILD_DEBUG",
    "CC",
    "CXX",
    "CFLAGS",
    "CXXFLAGS",
    "LDFLAGS",
];

/// A `live2d-build` command running in `cwd` with a clean build environment
pub(crate) fn live2d_build(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_live2d-build"));
    cmd.current_dir(cwd).env("XDG_CONFIG_HOME", cwd.join(".config"));
    for var in BUILD_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Sorted file names directly inside `dir` (empty when `dir` is missing)
#[allow(dead_code)]
pub(crate) fn list_dir(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Fake `cmake` and `python3` executables
#[cfg(unix)]
#[allow(dead_code)]
pub(crate) struct FakeToolchain {
    pub(crate) cmake: PathBuf,
    pub(crate) python: PathBuf,
}

/// Behaviour knobs for [`write_fake_toolchain`]
#[cfg(unix)]
#[allow(dead_code)]
pub(crate) struct FakeToolchainOptions<'a> {
    /// Version printed by `cmake --version`
    pub(crate) cmake_version: &'a str,
    /// Exit code of the configure step
    pub(crate) configure_exit: u8,
    /// `platform.python_compiler()` reported by the fake interpreter
    pub(crate) python_compiler: &'a str,
}

#[cfg(unix)]
impl Default for FakeToolchainOptions<'_> {
    fn default() -> Self {
        Self {
            cmake_version: "3.28.3",
            configure_exit: 0,
            python_compiler: "GCC 13.2.0",
        }
    }
}

/// Write a fake toolchain into `dir`.
///
/// The fake `cmake` records its arguments in the scratch directory
/// (`configure-args`, `build-args`) and its build step produces the wrapper
/// library under the names every platform looks for.
#[cfg(unix)]
#[allow(dead_code)]
pub(crate) fn write_fake_toolchain(dir: &Path, options: &FakeToolchainOptions<'_>) -> FakeToolchain {
    let cmake = format!(
        r#"case "$1" in
  --version) echo "cmake version {version}"; exit 0 ;;
  --build)
    echo "$@" > build-args
    mkdir -p lib/Release
    printf 'native' > lib/Release/libLAppModelWrapper.so
    printf 'native' > lib/Release/libLAppModelWrapper.dylib
    printf 'native' > lib/Release/LAppModelWrapper.pyd
    exit 0 ;;
  *)
    echo "$@" > configure-args
    if [ {exit} -ne 0 ]; then echo "configure exploded" >&2; fi
    exit {exit} ;;
esac"#,
        version = options.cmake_version,
        exit = options.configure_exit,
    );
    let python = format!(
        "echo /opt/fakepy/bin/python3\necho '{compiler}'\necho '3.12.1 (main, fake)'",
        compiler = options.python_compiler,
    );

    FakeToolchain {
        cmake: write_script(dir, "cmake", &cmake),
        python: write_script(dir, "python3", &python),
    }
}

#[cfg(unix)]
#[allow(dead_code)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to mark script executable");
    path
}
