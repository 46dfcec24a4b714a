//! End-to-end engine tests through the public API.
//!
//! These run the reference topology against a file-backed tracker and
//! backend, reopening both between runs the way separate CLI invocations do.

mod flaky;
mod resume_tests;
