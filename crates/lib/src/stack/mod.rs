//! Declared stacks, resources and values.
//!
//! These are plain data: a [`Stack`] holds [`ResourceDescriptor`]s and
//! declares its inputs and outputs. Dependencies between stacks exist only
//! through [`Reference`]s.

pub mod resource;
pub mod types;
pub mod value;

pub use resource::ResourceDescriptor;
pub use types::{OutputSpec, Stack, StackInput};
pub use value::{Outputs, Reference, Scalar, Value};
