//! Configuration file management
//!
//! Handles reading live2d-build's TOML configuration files from project and
//! global locations, and resolving each build setting with the priority
//! CLI flag -> environment -> config file -> built-in default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Project-local config file name
pub const CONFIG_FILE_NAME: &str = ".live2d-build.toml";

/// Default number of concurrent native build jobs
pub const DEFAULT_JOBS: usize = 2;

/// Default CMake build type / configuration
pub const DEFAULT_BUILD_TYPE: &str = "Release";

/// Default minimum macOS version for the built library
pub const DEFAULT_OSX_DEPLOYMENT_TARGET: &str = "14.0";

/// Default scratch build directory, relative to the project root
pub const DEFAULT_BUILD_DIR: &str = "build/native";

/// Application configuration loaded from TOML files
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing the top-level `CMakeLists.txt`
    #[serde(default)]
    pub source_dir: Option<String>,

    /// Scratch build directory
    #[serde(default)]
    pub build_dir: Option<String>,

    /// Package directory receiving the staged module
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Parallel native build jobs
    #[serde(default)]
    pub jobs: Option<usize>,

    /// CMake build type (`Release`, `RelWithDebInfo`, ...)
    #[serde(default)]
    pub build_type: Option<String>,

    /// `CMAKE_OSX_DEPLOYMENT_TARGET` on macOS
    #[serde(default)]
    pub osx_deployment_target: Option<String>,

    /// Path to the `CMake` executable
    #[serde(default)]
    pub cmake: Option<String>,

    /// Python interpreter to query
    #[serde(default)]
    pub python: Option<String>,

    /// Name of the native extension target
    #[serde(default)]
    pub extension: Option<String>,
}

impl Config {
    /// Load configuration from TOML files.
    /// Priority: `LIVE2D_BUILD_CONFIG` -> ./.live2d-build.toml -> ~/.config/live2d-build/config.toml
    ///
    /// # Errors
    ///
    /// Returns an error if config file parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_with_options(None, false)
    }

    /// Load configuration with custom options.
    ///
    /// # Arguments
    /// * `custom_path` - Optional custom path to config file (overrides defaults)
    /// * `skip_rc` - If true, skip loading config files (return default config)
    ///
    /// # Errors
    ///
    /// Returns an error if config file reading or parsing fails.
    pub fn load_with_options(custom_path: Option<&Path>, skip_rc: bool) -> Result<Self> {
        if skip_rc {
            return Ok(Self::default());
        }

        // An explicitly requested file must exist
        if let Some(path) = custom_path
            .map(Path::to_path_buf)
            .or_else(crate::env_vars::config_path)
        {
            return Self::load_from(&path);
        }

        let local = Path::new(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load_from(local);
        }

        if let Some(config_dir) = Self::user_config_dir() {
            let global = config_dir.join("config.toml");
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    fn load_from(path: &Path) -> Result<Self> {
        crate::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    fn user_config_dir() -> Option<PathBuf> {
        // Check XDG_CONFIG_HOME first
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join("live2d-build"));
        }

        // Fall back to ~/.config/live2d-build
        dirs::home_dir().map(|home| home.join(".config").join("live2d-build"))
    }
}

/// Resolve the job count: CLI -> `LIVE2D_BUILD_JOBS` -> config -> 2.
///
/// # Errors
///
/// Returns an error if the resolved value is zero.
pub fn jobs(cli: Option<usize>, config: &Config) -> Result<usize> {
    let jobs = cli
        .or_else(crate::env_vars::build_jobs)
        .or(config.jobs)
        .unwrap_or(DEFAULT_JOBS);

    if jobs == 0 {
        anyhow::bail!("job count must be at least 1");
    }
    Ok(jobs)
}

/// Resolve the `CMake` executable: CLI -> `CMAKE` -> config -> `cmake` on PATH.
#[must_use]
pub fn cmake_executable(cli: Option<&str>, config: &Config) -> String {
    cli.map(str::to_string)
        .or_else(crate::env_vars::cmake)
        .or_else(|| config.cmake.clone())
        .unwrap_or_else(|| "cmake".to_string())
}

/// Resolve the Python interpreter: CLI -> `PYTHON` -> config -> venv interpreter -> default.
#[must_use]
pub fn python_interpreter(
    cli: Option<&str>,
    config: &Config,
    virtual_env: Option<&Path>,
) -> String {
    cli.map(str::to_string)
        .or_else(crate::env_vars::python)
        .or_else(|| config.python.clone())
        .or_else(|| {
            virtual_env
                .map(crate::python::venv_interpreter)
                .filter(|path| path.exists())
                .map(|path| path.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| crate::python::default_interpreter().to_string())
}

/// Resolve the CMake source directory: CLI -> config -> current directory.
#[must_use]
pub fn source_dir(cli: Option<&Path>, config: &Config) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| config.source_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve the scratch build directory: CLI -> config -> `build/native`.
#[must_use]
pub fn build_dir(cli: Option<&Path>, config: &Config) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| config.build_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR))
}

/// Resolve the package output directory: CLI -> config -> `package/live2d/v3`.
#[must_use]
pub fn output_dir(cli: Option<&Path>, config: &Config) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| config.output_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(crate::paths::DEFAULT_OUTPUT_DIR))
}

/// Resolve the CMake build type: CLI -> config -> `Release`.
#[must_use]
pub fn build_type(cli: Option<&str>, config: &Config) -> String {
    cli.map(str::to_string)
        .or_else(|| config.build_type.clone())
        .unwrap_or_else(|| DEFAULT_BUILD_TYPE.to_string())
}

/// Resolve the macOS deployment target: CLI -> config -> `14.0`.
#[must_use]
pub fn osx_deployment_target(cli: Option<&str>, config: &Config) -> String {
    cli.map(str::to_string)
        .or_else(|| config.osx_deployment_target.clone())
        .unwrap_or_else(|| DEFAULT_OSX_DEPLOYMENT_TARGET.to_string())
}

/// Resolve the extension name: config -> `LAppModelWrapper`.
#[must_use]
pub fn extension_name(config: &Config) -> String {
    config
        .extension
        .clone()
        .unwrap_or_else(|| crate::DEFAULT_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod loading {
        use super::*;

        #[test]
        fn default_values() {
            let config = Config::default();
            assert!(config.jobs.is_none());
            assert!(config.cmake.is_none());
            assert!(config.output_dir.is_none());
        }

        #[test]
        fn skip_rc_returns_default() -> Result<()> {
            let config = Config::load_with_options(Some(Path::new("/nonexistent.toml")), true)?;
            assert_eq!(config, Config::default());
            Ok(())
        }

        #[test]
        fn explicit_missing_file_is_an_error() {
            let result = Config::load_with_options(Some(Path::new("/nonexistent/cfg.toml")), false);
            assert!(result.is_err());
        }

        #[test]
        fn load_from_toml() -> Result<()> {
            let temp_dir = tempfile::tempdir()?;
            let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

            fs::write(
                &config_path,
                r#"
source_dir = "native"
build_dir = "/tmp/scratch"
jobs = 8
build_type = "RelWithDebInfo"
osx_deployment_target = "12.0"
cmake = "/opt/cmake/bin/cmake"
"#,
            )?;

            let config = Config::load_with_options(Some(&config_path), false)?;
            assert_eq!(config.source_dir, Some("native".to_string()));
            assert_eq!(config.build_dir, Some("/tmp/scratch".to_string()));
            assert_eq!(config.jobs, Some(8));
            assert_eq!(config.build_type, Some("RelWithDebInfo".to_string()));
            assert_eq!(config.osx_deployment_target, Some("12.0".to_string()));
            assert_eq!(config.cmake, Some("/opt/cmake/bin/cmake".to_string()));
            assert!(config.python.is_none());

            Ok(())
        }

        #[test]
        fn unknown_keys_are_rejected() -> Result<()> {
            let temp_dir = tempfile::tempdir()?;
            let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
            fs::write(&config_path, "paralel_jobs = 4\n")?;

            assert!(Config::load_with_options(Some(&config_path), false).is_err());
            Ok(())
        }
    }

    mod resolution {
        use super::*;

        #[test]
        fn cli_jobs_win() {
            let config = Config {
                jobs: Some(8),
                ..Config::default()
            };
            assert_eq!(jobs(Some(3), &config).unwrap(), 3);
        }

        #[test]
        fn zero_jobs_rejected() {
            assert!(jobs(Some(0), &Config::default()).is_err());
        }

        #[test]
        fn directories_from_config() {
            let config = Config {
                build_dir: Some("/config/build".to_string()),
                output_dir: Some("/config/out".to_string()),
                ..Config::default()
            };
            assert_eq!(build_dir(None, &config), PathBuf::from("/config/build"));
            assert_eq!(output_dir(None, &config), PathBuf::from("/config/out"));
            assert_eq!(
                build_dir(Some(Path::new("/cli/build")), &config),
                PathBuf::from("/cli/build")
            );
        }

        #[test]
        fn directory_defaults() {
            let config = Config::default();
            assert_eq!(source_dir(None, &config), PathBuf::from("."));
            assert_eq!(build_dir(None, &config), PathBuf::from(DEFAULT_BUILD_DIR));
            assert_eq!(
                output_dir(None, &config),
                PathBuf::from(crate::paths::DEFAULT_OUTPUT_DIR)
            );
        }

        #[test]
        fn build_settings_defaults() {
            let config = Config::default();
            assert_eq!(build_type(None, &config), "Release");
            assert_eq!(osx_deployment_target(None, &config), "14.0");
            assert_eq!(extension_name(&config), "LAppModelWrapper");
        }

        #[test]
        fn build_settings_cli_override() {
            let config = Config {
                build_type: Some("Debug".to_string()),
                ..Config::default()
            };
            assert_eq!(build_type(None, &config), "Debug");
            assert_eq!(build_type(Some("MinSizeRel"), &config), "MinSizeRel");
            assert_eq!(osx_deployment_target(Some("13.3"), &config), "13.3");
        }

        #[test]
        fn cmake_cli_wins() {
            let config = Config {
                cmake: Some("/config/cmake".to_string()),
                ..Config::default()
            };
            assert_eq!(cmake_executable(Some("/cli/cmake"), &config), "/cli/cmake");
        }

        #[test]
        fn python_cli_wins() {
            let config = Config {
                python: Some("/config/python".to_string()),
                ..Config::default()
            };
            assert_eq!(
                python_interpreter(Some("/cli/python"), &config, None),
                "/cli/python"
            );
        }
    }
}
