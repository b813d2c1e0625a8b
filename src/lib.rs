//! live2d-build internal library code

/// `CMake` target producing the model wrapper library
pub const DEFAULT_EXTENSION: &str = "LAppModelWrapper";

pub mod config;
pub mod debug;
pub mod env_vars;
pub mod extensions;
pub mod paths;
pub mod platform;
pub mod python;
pub mod test_utils;

// Re-export common types for convenience
pub use config::Config;
pub use debug::{debug_log, debug_logf, init_debug, is_debug_enabled};
pub use extensions::{
    BuildError, BuildOptions, BuildReport, BuildState, ExtensionBuilder, FlagOptions,
    Verbosity, build_extension,
};
pub use paths::{DEFAULT_OUTPUT_DIR, ensure_output_layout};
pub use platform::{Architecture, HostPlatform};
pub use python::{PythonError, PythonInterpreter, resolve_python_installation_root};
