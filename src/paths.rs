//! Path utilities for the package layout and the CMake project.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Package directory that receives the staged native module
pub const DEFAULT_OUTPUT_DIR: &str = "package/live2d/v3";

/// Marker file of a CMake project
pub const CMAKE_LISTS: &str = "CMakeLists.txt";

/// Create the package's native-module directory if absent.
///
/// Idempotent: an existing directory is left untouched.
pub fn ensure_output_layout(output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)
}

/// Whether `dir` holds a top-level `CMakeLists.txt`.
#[must_use]
pub fn has_cmake_project(dir: impl AsRef<Path>) -> bool {
    dir.as_ref().join(CMAKE_LISTS).is_file()
}

/// Make `path` absolute relative to the current directory without touching the filesystem.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    std::path::absolute(path)
}
