//! Build flag composition
//!
//! Pure mapping from (platform, architecture hint, options) to the
//! [`BuildConfiguration`] used by the configure and build steps:
//!
//! | Platform | Configure | Build |
//! |----------|-----------|-------|
//! | Windows  | `-A x64` / `-A Win32` | `--config Release -- /m:N` |
//! | macOS    | `-DCMAKE_BUILD_TYPE=Release -DCMAKE_OSX_DEPLOYMENT_TARGET=14.0` | `--config Release -- -jN` |
//! | Linux    | `-DCMAKE_BUILD_TYPE=Release` | `--config Release -- -jN` |

use super::types::BuildConfiguration;
use crate::config::{DEFAULT_BUILD_TYPE, DEFAULT_JOBS, DEFAULT_OSX_DEPLOYMENT_TARGET};
use crate::platform::{Architecture, HostPlatform};
use std::path::Path;

/// User-tunable inputs to flag composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagOptions {
    /// Native build parallelism
    pub jobs: usize,
    /// CMake build type / configuration
    pub build_type: String,
    /// Minimum macOS version
    pub osx_deployment_target: String,
}

impl Default for FlagOptions {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            build_type: DEFAULT_BUILD_TYPE.to_string(),
            osx_deployment_target: DEFAULT_OSX_DEPLOYMENT_TARGET.to_string(),
        }
    }
}

/// Compose the flag set for `platform`.
///
/// `architecture_hint` is the interpreter's compiler description
/// (`platform.python_compiler()`); it only matters on Windows.
#[must_use]
pub fn compose_build_flags(
    platform: HostPlatform,
    architecture_hint: &str,
    options: &FlagOptions,
    python_root: &Path,
) -> BuildConfiguration {
    let architecture = platform
        .is_windows()
        .then(|| Architecture::from_compiler_description(architecture_hint));

    let deployment_target = matches!(platform, HostPlatform::MacOs)
        .then(|| options.osx_deployment_target.clone());

    BuildConfiguration {
        platform,
        architecture,
        build_type: options.build_type.clone(),
        deployment_target,
        jobs: options.jobs.max(1),
        python_root: python_root.to_path_buf(),
    }
}
