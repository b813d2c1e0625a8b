//! Extension build type definitions
//!
//! The build configuration, the build state machine and the report of a
//! finished build.

use super::cmake_extension::CMakeVersion;
use super::staging::StagedArtifact;
use crate::platform::{Architecture, HostPlatform};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Progress of a single build invocation
///
/// `Init -> ToolchainChecked -> FlagsComposed -> Configured -> Built -> Staged`,
/// or `Failed` from any non-terminal state. There are no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildState {
    Init,
    ToolchainChecked,
    FlagsComposed,
    Configured,
    Built,
    Staged,
    Failed,
}

impl BuildState {
    /// Whether no further transition is possible
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Staged | Self::Failed)
    }

    /// Check whether moving to `next` is allowed
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Failed => true,
            Self::Init => false,
            _ => next > self,
        }
    }

    /// Get state name as string
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ToolchainChecked => "toolchain-checked",
            Self::FlagsComposed => "flags-composed",
            Self::Configured => "configured",
            Self::Built => "built",
            Self::Staged => "staged",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External CMake invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// `cmake <source> <configure args>`
    Configure,
    /// `cmake --build . <build args>`
    Build,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configure => "configure",
            Self::Build => "build",
        })
    }
}

/// How much output a build prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Progress lines and a spinner while CMake runs
    #[default]
    Normal,
    /// Progress lines and CMake's own output, streamed
    Verbose,
}

impl Verbosity {
    /// Pick from the `--verbose` / `--quiet` flags
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    #[inline]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    #[inline]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }
}

/// Fully resolved flags for one build
///
/// Assembled once by [`compose_build_flags`](super::flags::compose_build_flags)
/// and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    /// Platform the flags were composed for
    pub platform: HostPlatform,
    /// Visual Studio platform selector (Windows only)
    pub architecture: Option<Architecture>,
    /// CMake build type and `--config` value
    pub build_type: String,
    /// `CMAKE_OSX_DEPLOYMENT_TARGET` (macOS only)
    pub deployment_target: Option<String>,
    /// Native build parallelism
    pub jobs: usize,
    /// Base Python installation handed to the native project
    pub python_root: PathBuf,
}

impl BuildConfiguration {
    /// Arguments following the source directory in the configure step
    #[must_use]
    pub fn configure_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(arch) = self.architecture {
            args.push("-A".to_string());
            args.push(arch.cmake_platform().to_string());
        }

        if !self.platform.is_windows() {
            args.push(format!("-DCMAKE_BUILD_TYPE={}", self.build_type));
        }

        if let Some(target) = &self.deployment_target {
            args.push(format!("-DCMAKE_OSX_DEPLOYMENT_TARGET={target}"));
        }

        args.push(format!(
            "-DPYTHON_INSTALLATION_PATH={}",
            self.python_root.display()
        ));
        args
    }

    /// Arguments following `--build .` in the build step
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let parallel = if self.platform.is_windows() {
            format!("/m:{}", self.jobs)
        } else {
            format!("-j{}", self.jobs)
        };

        vec![
            "--config".to_string(),
            self.build_type.clone(),
            "--".to_string(),
            parallel,
        ]
    }
}

/// Result of a successful build
#[derive(Debug)]
pub struct BuildReport {
    /// Extension target name
    pub extension: String,
    /// Platform the build ran for
    pub platform: HostPlatform,
    /// Version reported by `cmake --version`
    pub cmake_version: CMakeVersion,
    /// Python installation handed to CMake
    pub python_root: PathBuf,
    /// Module placed in the package tree
    pub artifact: StagedArtifact,
    /// Build duration
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(platform: HostPlatform) -> BuildConfiguration {
        BuildConfiguration {
            platform,
            architecture: platform.is_windows().then_some(Architecture::X64),
            build_type: "Release".to_string(),
            deployment_target: None,
            jobs: 2,
            python_root: PathBuf::from("/py"),
        }
    }

    #[test]
    fn state_order() {
        assert!(BuildState::Init.can_advance_to(BuildState::ToolchainChecked));
        assert!(BuildState::Configured.can_advance_to(BuildState::Built));
        assert!(BuildState::Built.can_advance_to(BuildState::Failed));
        assert!(!BuildState::Built.can_advance_to(BuildState::Configured));
        assert!(!BuildState::Configured.can_advance_to(BuildState::Init));
    }

    #[test]
    fn terminal_states_do_not_move() {
        assert!(BuildState::Staged.is_terminal());
        assert!(BuildState::Failed.is_terminal());
        assert!(!BuildState::Staged.can_advance_to(BuildState::Failed));
        assert!(!BuildState::Failed.can_advance_to(BuildState::Staged));
    }

    #[test]
    fn windows_build_args() {
        assert_eq!(
            config(HostPlatform::Windows).build_args(),
            vec!["--config", "Release", "--", "/m:2"]
        );
    }

    #[test]
    fn posix_build_args() {
        assert_eq!(
            config(HostPlatform::Linux).build_args(),
            vec!["--config", "Release", "--", "-j2"]
        );
    }

    #[test]
    fn windows_configure_args() {
        assert_eq!(
            config(HostPlatform::Windows).configure_args(),
            vec!["-A", "x64", "-DPYTHON_INSTALLATION_PATH=/py"]
        );
    }

    #[test]
    fn verbosity_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
    }

    #[test]
    fn step_names() {
        assert_eq!(BuildStep::Configure.to_string(), "configure");
        assert_eq!(BuildStep::Build.to_string(), "build");
    }
}
