//! `CMake` extension building
//!
//! Drives the `CMake` project that produces the model wrapper library.
//!
//! Build process:
//! ```bash
//! cmake --version
//! mkdir -p build/native
//! cd build/native
//! cmake <source> -DCMAKE_BUILD_TYPE=Release -DPYTHON_INSTALLATION_PATH=...
//! cmake --build . --config Release -- -j2
//! ```

use super::builder::BuildError;
use super::types::{BuildConfiguration, BuildStep, Verbosity};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Oldest `CMake` accepted on Windows without a warning
pub const MINIMUM_WINDOWS_CMAKE: (u64, u64, u64) = (3, 12, 0);

/// Errors raised while checking for the `CMake` toolchain
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("CMake must be installed to build the following extensions: {}", extensions.join(", "))]
    Missing {
        tool: String,
        extensions: Vec<String>,
        #[source]
        source: io::Error,
    },

    #[error("'{tool} --version' failed: {message}")]
    VersionQueryFailed { tool: String, message: String },

    #[error("could not find a version in '{tool} --version' output: {output}")]
    UnrecognizedVersion { tool: String, output: String },
}

/// Version reported by `cmake --version`
///
/// Ordered numerically (`3.9 < 3.12`), never lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CMakeVersion {
    version: semver::Version,
    raw: String,
}

impl CMakeVersion {
    /// Parse a dotted version such as `3.28.3`, `3.12` or `3.29.0-rc2`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (numeric, _suffix) = text.split_once('-').unwrap_or((text, ""));

        let mut parts = numeric.split('.').map(str::parse::<u64>);
        let major = parts.next()?.ok()?;
        let minor = parts.next().transpose().ok()?.unwrap_or(0);
        let patch = parts.next().transpose().ok()?.unwrap_or(0);

        Some(Self {
            version: semver::Version::new(major, minor, patch),
            raw: text.to_string(),
        })
    }

    /// Extract the version from full `cmake --version` output.
    #[must_use]
    pub fn from_version_output(output: &str) -> Option<Self> {
        let pattern = Regex::new(r"cmake version ([0-9]+(?:\.[0-9]+)*(?:-[0-9A-Za-z.]+)?)").ok()?;
        let captures = pattern.captures(output)?;
        Self::parse(captures.get(1)?.as_str())
    }

    /// Whether this version is at least `major.minor.patch`
    #[must_use]
    pub fn at_least(&self, (major, minor, patch): (u64, u64, u64)) -> bool {
        self.version >= semver::Version::new(major, minor, patch)
    }

    /// Numeric version
    #[must_use]
    pub const fn version(&self) -> &semver::Version {
        &self.version
    }

    /// Version text as printed by `CMake`
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for CMakeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// `CMake` extension builder
///
/// Owns the path of the `CMake` executable and runs the version query,
/// configure and build steps.
#[derive(Debug)]
pub struct CMakeExtensionBuilder {
    /// Path or name of the `CMake` executable
    cmake_path: String,
    /// How much subprocess output to show
    verbosity: Verbosity,
}

impl CMakeExtensionBuilder {
    /// Create a new `CMake` extension builder
    ///
    /// Nothing is executed until [`resolve_version`](Self::resolve_version).
    #[must_use]
    pub fn new(cmake_path: impl Into<String>, verbosity: Verbosity) -> Self {
        Self {
            cmake_path: cmake_path.into(),
            verbosity,
        }
    }

    /// The `CMake` executable this builder runs
    #[must_use]
    pub fn cmake_path(&self) -> &str {
        &self.cmake_path
    }

    /// Run `cmake --version` and parse the result.
    ///
    /// `extensions` only feeds the error message when `CMake` is missing.
    pub fn resolve_version(&self, extensions: &[String]) -> Result<CMakeVersion, ToolchainError> {
        let output = Command::new(&self.cmake_path)
            .arg("--version")
            .output()
            .map_err(|source| ToolchainError::Missing {
                tool: self.cmake_path.clone(),
                extensions: extensions.to_vec(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolchainError::VersionQueryFailed {
                tool: self.cmake_path.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        CMakeVersion::from_version_output(&stdout).ok_or_else(|| {
            ToolchainError::UnrecognizedVersion {
                tool: self.cmake_path.clone(),
                output: stdout.trim().to_string(),
            }
        })
    }

    /// Arguments of the configure step: source directory, then composed flags.
    ///
    /// Compilers and their flags (`CC`, `CFLAGS`, ...) reach `CMake` through
    /// the inherited environment.
    #[must_use]
    pub fn configure_invocation(source_dir: &Path, config: &BuildConfiguration) -> Vec<String> {
        let mut args = vec![source_dir.display().to_string()];
        args.extend(config.configure_args());
        args
    }

    /// Arguments of the build step
    #[must_use]
    pub fn build_invocation(config: &BuildConfiguration) -> Vec<String> {
        let mut args = vec!["--build".to_string(), ".".to_string()];
        args.extend(config.build_args());
        args
    }

    /// Render a command line for progress messages
    #[must_use]
    pub fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.cmake_path.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the configure step in `scratch_dir`.
    pub fn configure(
        &self,
        scratch_dir: &Path,
        source_dir: &Path,
        config: &BuildConfiguration,
    ) -> Result<String, BuildError> {
        let args = Self::configure_invocation(source_dir, config);
        if !self.verbosity.is_quiet() {
            println!("Invoking CMake setup: '{}'", self.command_line(&args));
        }
        self.run_step(BuildStep::Configure, &args, scratch_dir)
    }

    /// Run the build step in `scratch_dir`.
    pub fn build(&self, scratch_dir: &Path, config: &BuildConfiguration) -> Result<String, BuildError> {
        let args = Self::build_invocation(config);
        if !self.verbosity.is_quiet() {
            println!("Invoking CMake build: '{}'", self.command_line(&args));
        }
        self.run_step(BuildStep::Build, &args, scratch_dir)
    }

    /// Configure then build in `scratch_dir`, creating it first.
    ///
    /// Returns the captured output of both steps (empty in verbose mode,
    /// where output goes straight to the terminal).
    pub fn run_configure_and_build(
        &self,
        scratch_dir: &Path,
        source_dir: &Path,
        config: &BuildConfiguration,
    ) -> Result<String, BuildError> {
        std::fs::create_dir_all(scratch_dir).map_err(|source| BuildError::ScratchDir {
            path: scratch_dir.to_path_buf(),
            source,
        })?;

        let mut output = self.configure(scratch_dir, source_dir, config)?;
        output.push_str(&self.build(scratch_dir, config)?);
        Ok(output)
    }

    fn run_step(&self, step: BuildStep, args: &[String], cwd: &Path) -> Result<String, BuildError> {
        let start_time = Instant::now();
        let mut cmd = Command::new(&self.cmake_path);
        cmd.args(args).current_dir(cwd);

        let (status, output) = if self.verbosity.is_verbose() {
            let status = cmd
                .stdin(Stdio::null())
                .status()
                .map_err(|source| BuildError::Spawn { step, source })?;
            (status, String::new())
        } else {
            let spinner = self.spinner(step);
            let result = cmd.stdin(Stdio::null()).output();
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            let out = result.map_err(|source| BuildError::Spawn { step, source })?;

            let mut text = String::from_utf8_lossy(&out.stdout).to_string();
            text.push_str(&String::from_utf8_lossy(&out.stderr));
            (out.status, text)
        };

        crate::debug!("CMake {step} finished in {:?} ({status})", start_time.elapsed());

        if !status.success() {
            return Err(BuildError::StepFailed {
                step,
                status: status.code(),
                output,
            });
        }

        Ok(output)
    }

    fn spinner(&self, step: BuildStep) -> Option<ProgressBar> {
        if self.verbosity.is_quiet() {
            return None;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("CMake {step}..."));
        spinner.enable_steady_tick(Duration::from_millis(120));
        Some(spinner)
    }
}
