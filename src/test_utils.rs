//! Shared test utilities for live2d-build tests
//!
//! This module provides common test helpers, fixtures, and utilities
//! to reduce code duplication across test modules.
