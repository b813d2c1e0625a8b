//! Native extension building
//!
//! Builds the model wrapper library with `CMake` and stages it into the
//! Python package as an importable module.
//!
//! Pipeline:
//! - toolchain check (`cmake --version`)
//! - output layout (`package/live2d/v3`)
//! - interpreter resolution and flag composition
//! - `CMake` configure and build in the scratch directory
//! - staging (`live2d.so` / `live2d.pyd`)

pub mod builder;
pub mod cmake_extension;
pub mod flags;
pub mod staging;
pub mod types;

pub use builder::{BuildError, BuildOptions, BuildPlan, ExtensionBuilder, build_extension};
pub use cmake_extension::{CMakeExtensionBuilder, CMakeVersion, ToolchainError};
pub use flags::{FlagOptions, compose_build_flags};
pub use staging::{StageRule, StagedArtifact, StagingError, stage_artifact};
pub use types::{BuildConfiguration, BuildReport, BuildState, BuildStep, Verbosity};
