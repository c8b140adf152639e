//! Shared test utilities for signbook integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with temp directories and an in-memory database
//! - `ConfigBuilder` for building validated configurations programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
