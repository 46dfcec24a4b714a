//! stackup-lib: stack composition and deployment ordering
//!
//! This crate provides the engine behind `stackup`:
//! - `stack`: stacks, resource descriptors and the values that wire them together
//! - `execute`: dependency resolution, planning, and apply/destroy against a backend
//! - `state`: the run record that makes runs resumable
//! - `backend`: the provisioning boundary and its in-memory and local implementations
//! - `topology`: the reference application built from a typed config

pub mod backend;
pub mod composition;
pub mod consts;
pub mod execute;
pub mod platform;
pub mod stack;
pub mod state;
pub mod topology;
pub mod util;
