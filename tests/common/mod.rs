//! Common test utilities for privacy-audit integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
