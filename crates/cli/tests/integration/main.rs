//! CLI integration tests for stackup.
//!
//! Each test runs the binary against its own temporary data directory.

mod apply_tests;
mod common;
mod destroy_tests;
mod plan_tests;
mod status_tests;
