//! Extension Builder Orchestration
//!
//! Runs one native build from start to finish: toolchain check, output
//! layout, interpreter resolution, flag composition, `CMake` configure and
//! build, and staging of the produced library.

use super::cmake_extension::{CMakeExtensionBuilder, CMakeVersion, MINIMUM_WINDOWS_CMAKE, ToolchainError};
use super::flags::{FlagOptions, compose_build_flags};
use super::staging::{StageRule, StagingError, stage_with_rule};
use super::types::{BuildConfiguration, BuildReport, BuildState, BuildStep, Verbosity};
use crate::platform::HostPlatform;
use crate::python::{PythonError, PythonInterpreter, resolve_python_installation_root};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Errors that end a build
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error(transparent)]
    Python(#[from] PythonError),

    #[error("Failed to resolve path {}: {source}", path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create output directory {}: {source}", path.display())]
    Layout {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create build directory {}: {source}", path.display())]
    ScratchDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to execute cmake {step}: {source}")]
    Spawn {
        step: BuildStep,
        #[source]
        source: io::Error,
    },

    #[error("CMake {step} failed with exit code: {}", status.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    StepFailed {
        step: BuildStep,
        status: Option<i32>,
        output: String,
    },

    #[error(transparent)]
    Staging(#[from] StagingError),
}

impl BuildError {
    /// The `CMake` step that failed, if any
    #[must_use]
    pub const fn step(&self) -> Option<BuildStep> {
        match self {
            Self::Spawn { step, .. } | Self::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Captured subprocess output, when the error came from a `CMake` step
    #[must_use]
    pub fn step_output(&self) -> Option<&str> {
        match self {
            Self::StepFailed { output, .. } if !output.trim().is_empty() => Some(output),
            _ => None,
        }
    }
}

/// Everything one build needs to know
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Extension target name, also the library base name
    pub extension: String,
    /// Directory containing the top-level `CMakeLists.txt`
    pub source_dir: PathBuf,
    /// Scratch build directory
    pub build_dir: PathBuf,
    /// Package directory receiving the module
    pub output_dir: PathBuf,
    /// Platform to compose flags and staging rules for
    pub platform: HostPlatform,
    /// `CMake` executable
    pub cmake: String,
    /// Python interpreter to query
    pub python: String,
    /// Active virtual environment root, if any
    pub virtual_env: Option<PathBuf>,
    /// Tunable flag inputs
    pub flags: FlagOptions,
    /// Output level
    pub verbosity: Verbosity,
}

/// What a build would do, resolved without running `CMake`
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Queried interpreter
    pub interpreter: PythonInterpreter,
    /// Composed flags
    pub config: BuildConfiguration,
    /// Absolute source directory
    pub source_dir: PathBuf,
    /// Absolute scratch directory
    pub build_dir: PathBuf,
    /// Absolute package directory
    pub output_dir: PathBuf,
    /// Arguments of the configure step
    pub configure_args: Vec<String>,
    /// Arguments of the build step
    pub build_args: Vec<String>,
    /// Staging rule
    pub stage_rule: StageRule,
}

impl BuildOptions {
    /// Query the interpreter and compose flags. Touches nothing on disk.
    pub fn plan(&self) -> Result<BuildPlan, BuildError> {
        let source_dir = absolute(&self.source_dir)?;
        let build_dir = absolute(&self.build_dir)?;
        let output_dir = absolute(&self.output_dir)?;

        let interpreter = PythonInterpreter::query(&self.python)?;
        let python_root =
            resolve_python_installation_root(self.virtual_env.as_deref(), &interpreter.executable)?;

        let config = compose_build_flags(
            self.platform,
            &interpreter.compiler,
            &self.flags,
            &python_root,
        );

        Ok(BuildPlan {
            configure_args: CMakeExtensionBuilder::configure_invocation(&source_dir, &config),
            build_args: CMakeExtensionBuilder::build_invocation(&config),
            stage_rule: StageRule::for_platform(
                self.platform,
                &self.extension,
                &config.build_type,
            ),
            interpreter,
            config,
            source_dir,
            build_dir,
            output_dir,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, BuildError> {
    crate::paths::absolutize(path).map_err(|source| BuildError::InvalidPath {
        path: path.to_path_buf(),
        source,
    })
}

/// Extension builder coordinator
///
/// Tracks the build state machine; every failure moves it to
/// [`BuildState::Failed`] and nothing is retried.
#[derive(Debug)]
pub struct ExtensionBuilder {
    options: BuildOptions,
    cmake: CMakeExtensionBuilder,
    state: BuildState,
    history: Vec<BuildState>,
}

impl ExtensionBuilder {
    /// Create a new extension builder.
    #[must_use]
    pub fn new(options: BuildOptions) -> Self {
        let cmake = CMakeExtensionBuilder::new(options.cmake.clone(), options.verbosity);
        Self {
            options,
            cmake,
            state: BuildState::Init,
            history: vec![BuildState::Init],
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> BuildState {
        self.state
    }

    /// Every state visited so far, in order
    #[must_use]
    pub fn history(&self) -> &[BuildState] {
        &self.history
    }

    /// Build options
    #[must_use]
    pub const fn options(&self) -> &BuildOptions {
        &self.options
    }

    fn advance(&mut self, next: BuildState) {
        if self.state.can_advance_to(next) {
            crate::debug!("Build state: {} -> {next}", self.state);
            self.state = next;
            self.history.push(next);
        } else {
            crate::debug!("Ignoring build state change {} -> {next}", self.state);
        }
    }

    fn is_quiet(&self) -> bool {
        self.options.verbosity.is_quiet()
    }

    /// Run the whole pipeline.
    pub fn run(&mut self) -> Result<BuildReport, BuildError> {
        let result = self.run_steps();
        if result.is_err() {
            self.advance(BuildState::Failed);
        }
        result
    }

    fn run_steps(&mut self) -> Result<BuildReport, BuildError> {
        let start_time = Instant::now();

        let cmake_version = self.check_toolchain()?;

        let output_dir = absolute(&self.options.output_dir)?;
        crate::paths::ensure_output_layout(&output_dir)
            .map_err(|source| BuildError::Layout { path: output_dir, source })?;

        let plan = self.options.plan()?;

        if !self.is_quiet() {
            if let Some(arch) = plan.config.architecture {
                println!("Building for {} bit", arch.bits());
            }
            println!(
                "Python installation path: {}",
                plan.config.python_root.display()
            );
            println!(
                "Building extension {} for Python {}",
                self.options.extension, plan.interpreter.version
            );
        }
        self.advance(BuildState::FlagsComposed);

        let outcome = self.cmake.run_configure_and_build(
            &plan.build_dir,
            &plan.source_dir,
            &plan.config,
        );
        let configured = match &outcome {
            Ok(_) => true,
            Err(e) => e.step() == Some(BuildStep::Build),
        };
        if configured {
            self.advance(BuildState::Configured);
        }
        let output = outcome?;
        crate::debug!("CMake produced {} bytes of output", output.len());
        self.advance(BuildState::Built);

        let artifact = stage_with_rule(&plan.stage_rule, &plan.build_dir, &plan.output_dir)?;
        self.advance(BuildState::Staged);

        Ok(BuildReport {
            extension: self.options.extension.clone(),
            platform: self.options.platform,
            cmake_version,
            python_root: plan.config.python_root,
            artifact,
            duration: start_time.elapsed(),
        })
    }

    /// Verify `CMake` is runnable and report its version.
    ///
    /// On Windows a version below 3.12 only produces a warning.
    pub fn check_toolchain(&mut self) -> Result<CMakeVersion, BuildError> {
        let extensions = [self.options.extension.clone()];
        let version = self.cmake.resolve_version(&extensions)?;
        crate::debug!("Found CMake {version} at {}", self.cmake.cmake_path());

        if self.options.platform.is_windows() && !version.at_least(MINIMUM_WINDOWS_CMAKE) {
            let (major, minor, _) = MINIMUM_WINDOWS_CMAKE;
            eprintln!("warning: CMake >= {major}.{minor} is required (found {version})");
        }

        self.advance(BuildState::ToolchainChecked);
        Ok(version)
    }
}

/// Build and stage one extension (convenience function)
///
/// # Example
///
/// ```no_run
/// use live2d_build::extensions::{BuildOptions, FlagOptions, Verbosity, build_extension};
/// use live2d_build::platform::HostPlatform;
/// use std::path::PathBuf;
///
/// let options = BuildOptions {
///     extension: "LAppModelWrapper".to_string(),
///     source_dir: PathBuf::from("."),
///     build_dir: PathBuf::from("build/native"),
///     output_dir: PathBuf::from("package/live2d/v3"),
///     platform: HostPlatform::current(),
///     cmake: "cmake".to_string(),
///     python: "python3".to_string(),
///     virtual_env: None,
///     flags: FlagOptions::default(),
///     verbosity: Verbosity::Normal,
/// };
///
/// match build_extension(options) {
///     Ok(report) => println!("Staged {}", report.artifact.destination.display()),
///     Err(e) => eprintln!("Build failed: {e}"),
/// }
/// ```
pub fn build_extension(options: BuildOptions) -> Result<BuildReport, BuildError> {
    ExtensionBuilder::new(options).run()
}
