//! Common test utilities and helpers
//!
//! This module provides shared functionality used across integration tests:
//! - Binary invocation (via `live2d_build`)
//! - Fake toolchain scripts (via `helpers`)

pub(crate) mod helpers;

pub(crate) use helpers::live2d_build;
