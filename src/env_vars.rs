//! Build environment variable handling.

use std::env;
use std::path::PathBuf;

// Helper for boolean environment variables that accept "1", "true", "yes"
fn is_enabled(var: &str) -> bool {
    env::var(var).ok().is_some_and(|s| parse_bool(&s))
}

fn parse_bool(value: &str) -> bool {
    let s = value.to_lowercase();
    s == "1" || s == "true" || s == "yes"
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

// Interpreter selection
// VIRTUAL_ENV is exported by `activate` scripts of venv/virtualenv

/// Root of the active virtual environment (`VIRTUAL_ENV`), if any.
pub fn virtual_env() -> Option<PathBuf> {
    non_empty("VIRTUAL_ENV").map(PathBuf::from)
}

/// Explicit Python interpreter (`PYTHON`).
pub fn python() -> Option<String> {
    non_empty("PYTHON")
}

// Toolchain selection

/// Explicit `CMake` executable (`CMAKE`).
pub fn cmake() -> Option<String> {
    non_empty("CMAKE")
}

/// Parallel build jobs (`LIVE2D_BUILD_JOBS`, returns None if unset or invalid).
pub fn build_jobs() -> Option<usize> {
    env::var("LIVE2D_BUILD_JOBS")
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Config file override (`LIVE2D_BUILD_CONFIG`).
pub fn config_path() -> Option<PathBuf> {
    non_empty("LIVE2D_BUILD_CONFIG").map(PathBuf::from)
}

/// Enable debug output (`LIVE2D_BUILD_DEBUG`).
pub fn debug_enabled() -> bool {
    is_enabled("LIVE2D_BUILD_DEBUG")
}
