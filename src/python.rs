//! Python interpreter detection
//!
//! The native build links against a Python installation whose root is handed
//! to CMake as `PYTHON_INSTALLATION_PATH`. Inside a virtual environment that
//! root is the *base* interpreter recorded in `pyvenv.cfg`, not the
//! environment itself.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Name of the configuration file at the root of every virtual environment
pub const PYVENV_CONFIG: &str = "pyvenv.cfg";

/// Snippet run by [`PythonInterpreter::query`]; one value per line
const QUERY_SCRIPT: &str = "import sys, platform\n\
print(sys.executable)\n\
print(platform.python_compiler())\n\
print(sys.version.splitlines()[0])";

/// Errors that can occur while resolving the Python installation
#[derive(Debug, Error)]
pub enum PythonError {
    #[error("Python interpreter '{interpreter}' could not be executed: {source}")]
    InterpreterNotFound {
        interpreter: String,
        #[source]
        source: io::Error,
    },

    #[error("Python interpreter '{interpreter}' failed: {message}")]
    InterpreterFailed {
        interpreter: String,
        message: String,
    },

    #[error("cannot resolve base interpreter: failed to read {}: {source}", path.display())]
    MissingPyvenvConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot resolve base interpreter: no 'home' entry in {}", path.display())]
    HomeNotFound { path: PathBuf },

    #[error("cannot resolve base interpreter: {} has no parent directory", executable.display())]
    NoParentDirectory { executable: PathBuf },
}

/// Parsed `pyvenv.cfg`
///
/// The file is a flat list of `key = value` lines:
/// ```text
/// home = /usr/local/bin
/// include-system-site-packages = false
/// version = 3.12.1
/// ```
/// Keys are case-insensitive; blank lines and `#`/`;` comments are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyvenvConfig {
    entries: BTreeMap<String, String>,
}

impl PyvenvConfig {
    /// Parse the contents of a `pyvenv.cfg` file
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
            .collect();

        Self { entries }
    }

    /// Read `pyvenv.cfg` from a virtual environment root.
    pub fn load(venv_root: &Path) -> Result<Self, PythonError> {
        let path = venv_root.join(PYVENV_CONFIG);
        let content = fs::read_to_string(&path)
            .map_err(|source| PythonError::MissingPyvenvConfig { path, source })?;
        Ok(Self::parse(&content))
    }

    /// Look up a key (case-insensitive)
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(String::as_str)
    }

    /// The base interpreter directory (`home`), if present and non-empty
    #[must_use]
    pub fn home(&self) -> Option<&str> {
        self.get("home").filter(|home| !home.is_empty())
    }

    /// Python version recorded by the environment (`version` or `version_info`)
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.get("version").or_else(|| self.get("version_info"))
    }
}

/// Resolve the Python installation root handed to the native build.
///
/// With a virtual environment root, returns the `home` entry of its
/// `pyvenv.cfg`; otherwise the directory containing `executable`.
pub fn resolve_python_installation_root(
    virtual_env: Option<&Path>,
    executable: &Path,
) -> Result<PathBuf, PythonError> {
    if let Some(venv_root) = virtual_env {
        let config = PyvenvConfig::load(venv_root)?;
        return config
            .home()
            .map(PathBuf::from)
            .ok_or_else(|| PythonError::HomeNotFound {
                path: venv_root.join(PYVENV_CONFIG),
            });
    }

    executable
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .ok_or_else(|| PythonError::NoParentDirectory {
            executable: executable.to_path_buf(),
        })
}

/// Interpreter inside a virtual environment (`bin/python` or `Scripts\python.exe`)
#[must_use]
pub fn venv_interpreter(venv_root: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_root.join("Scripts").join("python.exe")
    } else {
        venv_root.join("bin").join("python")
    }
}

/// Default interpreter name looked up on `PATH`
#[must_use]
pub const fn default_interpreter() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Facts about a Python interpreter, obtained by running it once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonInterpreter {
    /// `sys.executable`
    pub executable: PathBuf,
    /// `platform.python_compiler()`, e.g. "MSC v.1937 64 bit (AMD64)"
    pub compiler: String,
    /// First line of `sys.version`
    pub version: String,
}

impl PythonInterpreter {
    /// Run `interpreter` and collect its executable path, compiler and version.
    pub fn query(interpreter: &str) -> Result<Self, PythonError> {
        crate::debug!("Probing Python interpreter: {interpreter}");

        let output = Command::new(interpreter)
            .args(["-c", QUERY_SCRIPT])
            .output()
            .map_err(|source| PythonError::InterpreterNotFound {
                interpreter: interpreter.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(PythonError::InterpreterFailed {
                interpreter: interpreter.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Self::parse_query_output(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            PythonError::InterpreterFailed {
                interpreter: interpreter.to_string(),
                message: "unexpected query output".to_string(),
            }
        })
    }

    fn parse_query_output(stdout: &str) -> Option<Self> {
        let mut lines = stdout.lines().map(str::trim);
        let executable = lines.next().filter(|line| !line.is_empty())?;
        let compiler = lines.next().unwrap_or_default();
        let version = lines.next().unwrap_or_default();

        Some(Self {
            executable: PathBuf::from(executable),
            compiler: compiler.to_string(),
            version: version.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use tempfile::TempDir;

    mod pyvenv {
        use super::*;

        #[test]
        fn parses_home_and_version() {
            let config = PyvenvConfig::parse(
                "home = /usr/local/bin\ninclude-system-site-packages = false\nversion = 3.12.1\n",
            );
            assert_eq!(config.home(), Some("/usr/local/bin"));
            assert_eq!(config.version(), Some("3.12.1"));
            assert_eq!(config.get("include-system-site-packages"), Some("false"));
        }

        #[test]
        fn home_ignores_surrounding_noise() {
            let config = PyvenvConfig::parse(
                "\n# created by virtualenv\n  HOME   =   C:\\Python311  \r\nimplementation = CPython\n",
            );
            assert_eq!(config.home(), Some("C:\\Python311"));
        }

        #[test]
        fn value_may_contain_equals_sign() {
            let config = PyvenvConfig::parse("command = python -m venv --prompt=x /tmp/env\n");
            assert_eq!(config.get("command"), Some("python -m venv --prompt=x /tmp/env"));
        }

        #[test]
        fn empty_home_is_missing() {
            let config = PyvenvConfig::parse("home =\nversion = 3.11\n");
            assert_eq!(config.home(), None);
        }

        #[test]
        fn load_missing_file() {
            let temp = TempDir::new().unwrap();
            let err = PyvenvConfig::load(temp.path()).unwrap_err();
            assert!(matches!(err, PythonError::MissingPyvenvConfig { .. }));
            assert!(err.to_string().contains("cannot resolve base interpreter"));
        }
    }

    mod installation_root {
        use super::*;

        #[test]
        fn virtualenv_uses_home_entry() {
            let (venv, _cfg) = fixtures::create_virtualenv("home = /opt/python/3.12/bin\n");
            let root = resolve_python_installation_root(
                Some(venv.path()),
                Path::new("/somewhere/else/python"),
            )
            .unwrap();
            assert_eq!(root, PathBuf::from("/opt/python/3.12/bin"));
        }

        #[test]
        fn virtualenv_without_home_fails() {
            let (venv, _cfg) = fixtures::create_virtualenv("version = 3.12.1\n");
            let err =
                resolve_python_installation_root(Some(venv.path()), Path::new("/usr/bin/python3"))
                    .unwrap_err();
            assert!(matches!(err, PythonError::HomeNotFound { .. }));
        }

        #[test]
        fn virtualenv_without_config_fails() {
            let venv = TempDir::new().unwrap();
            let err =
                resolve_python_installation_root(Some(venv.path()), Path::new("/usr/bin/python3"))
                    .unwrap_err();
            assert!(matches!(err, PythonError::MissingPyvenvConfig { .. }));
        }

        #[test]
        fn plain_interpreter_uses_executable_directory() {
            let root =
                resolve_python_installation_root(None, Path::new("/usr/local/bin/python3.12"))
                    .unwrap();
            assert_eq!(root, PathBuf::from("/usr/local/bin"));
        }

        #[test]
        fn bare_executable_name_has_no_root() {
            let err = resolve_python_installation_root(None, Path::new("python3")).unwrap_err();
            assert!(matches!(err, PythonError::NoParentDirectory { .. }));
        }
    }

    mod query {
        use super::*;

        #[test]
        fn parses_query_output() {
            let interpreter = PythonInterpreter::parse_query_output(
                "/usr/bin/python3\nGCC 13.2.0\n3.12.1 (main, Dec 18 2023, 00:00:00) [GCC 13.2.0]\n",
            )
            .unwrap();
            assert_eq!(interpreter.executable, PathBuf::from("/usr/bin/python3"));
            assert_eq!(interpreter.compiler, "GCC 13.2.0");
            assert!(interpreter.version.starts_with("3.12.1"));
        }

        #[test]
        fn empty_query_output_is_rejected() {
            assert!(PythonInterpreter::parse_query_output("").is_none());
        }

        #[test]
        fn missing_interpreter() {
            let err = PythonInterpreter::query("definitely-not-a-python-interpreter").unwrap_err();
            assert!(matches!(err, PythonError::InterpreterNotFound { .. }));
        }

        #[test]
        fn venv_interpreter_layout() {
            let path = venv_interpreter(Path::new("env"));
            if cfg!(windows) {
                assert!(path.ends_with("Scripts/python.exe"));
            } else {
                assert!(path.ends_with("bin/python"));
            }
        }
    }
}
