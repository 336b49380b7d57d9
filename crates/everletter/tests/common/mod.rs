//! Shared test utilities for everletter integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated test execution with a temp database and avatar store
//! - Builder patterns for creating letters and configurations programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
