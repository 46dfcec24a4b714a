//! The provisioning backend boundary.
//!
//! The engine never knows what a resource is; it hands a
//! [`ProvisionRequest`] to a [`ProvisioningBackend`] and records what comes
//! back. Backends must make `create_or_update` safe to repeat on a resource
//! that is already in the requested state, and must treat deleting an absent
//! resource as success.

mod local;
mod memory;

use std::collections::BTreeMap;
use std::future::Future;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::consts::HANDLE_HASH_LEN;
use crate::stack::{Outputs, ResourceDescriptor, Scalar};
use crate::util::hash::hash_str;

pub use local::LocalBackend;
pub use memory::{BackendCall, MemoryBackend};

/// Everything a backend needs to create or update one resource.
#[derive(Debug, Clone, Copy)]
pub struct ProvisionRequest<'a> {
  pub stack: &'a str,
  pub resource: &'a ResourceDescriptor,
  /// The descriptor's properties with every reference resolved.
  pub properties: &'a BTreeMap<String, Scalar>,
  /// The owning stack's resolved inputs.
  pub inputs: &'a BTreeMap<String, Scalar>,
}

/// Everything a backend needs to delete one resource.
#[derive(Debug, Clone, Copy)]
pub struct DeleteRequest<'a> {
  pub stack: &'a str,
  pub resource: &'a ResourceDescriptor,
  /// Outputs recorded when the resource was provisioned; may be empty.
  pub outputs: &'a Outputs,
}

/// Result of a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
  Deleted,
  /// Nothing to delete. Not an error.
  Absent,
}

/// Errors reported by a backend for a single resource.
#[derive(Debug, Error)]
pub enum BackendError {
  /// The backend refused the request.
  #[error("{kind} rejected: {message}")]
  Rejected { kind: String, message: String },

  /// The backend could not be reached or is temporarily failing.
  #[error("backend unavailable: {0}")]
  Unavailable(String),

  /// The call did not finish within the configured timeout.
  #[error("backend call timed out after {0:?}")]
  Timeout(Duration),

  /// I/O error in a file-backed backend.
  #[error("io error: {0}")]
  Io(#[from] io::Error),

  /// Failed to (de)serialize a stored resource document.
  #[error("invalid resource document: {0}")]
  Document(#[from] serde_json::Error),
}

/// The external system that actually creates, updates and deletes resources.
pub trait ProvisioningBackend {
  /// Create the resource, or bring an existing one to the requested state.
  ///
  /// Returns the resource's declared output values.
  fn create_or_update(
    &self,
    request: &ProvisionRequest<'_>,
  ) -> impl Future<Output = Result<Outputs, BackendError>> + Send;

  /// Delete the resource. An already absent resource is `Ok(Absent)`.
  fn delete(&self, request: &DeleteRequest<'_>) -> impl Future<Output = Result<DeleteOutcome, BackendError>> + Send;
}

/// Deterministic handle for a resource, e.g. `vpc-1a2b3c4d`.
///
/// The prefix is the last segment of the resource kind.
pub fn resource_handle(stack: &str, resource: &ResourceDescriptor) -> String {
  let prefix = resource.kind.rsplit('.').next().unwrap_or(&resource.kind);
  let digest = hash_str(&format!("{}/{}/{}", stack, resource.name, resource.kind), HANDLE_HASH_LEN);
  format!("{}-{}", prefix.replace('_', "-"), digest)
}

/// Output values for a resource without a real cloud behind it.
///
/// Each declared output becomes `<handle>/<output>`, so values are stable
/// across runs and distinct across resources.
pub fn synthesize_outputs(stack: &str, resource: &ResourceDescriptor) -> Outputs {
  let handle = resource_handle(stack, resource);
  resource
    .outputs
    .iter()
    .map(|name| (name.clone(), Scalar::String(format!("{}/{}", handle, name))))
    .collect()
}
