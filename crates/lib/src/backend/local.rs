//! Directory-backed backend.
//!
//! Each provisioned resource is a JSON document on disk. This gives the CLI
//! a backend whose state outlives the process, so resume and idempotence
//! can be observed across separate invocations.
//!
//! # Storage Layout
//!
//! ```text
//! {root}/
//! └── <stack>/
//!     └── <resource>.json
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::stack::{Outputs, Scalar};
use crate::state::now_unix;

use super::{
  BackendError, DeleteOutcome, DeleteRequest, ProvisionRequest, ProvisioningBackend, resource_handle,
  synthesize_outputs,
};

/// A stored resource document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDocument {
  pub kind: String,
  pub handle: String,
  pub properties: BTreeMap<String, Scalar>,
  pub outputs: Outputs,
  pub updated_at: u64,
}

#[derive(Debug, Clone)]
pub struct LocalBackend {
  root: PathBuf,
}

impl LocalBackend {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn document_path(&self, stack: &str, resource: &str) -> PathBuf {
    self.root.join(stack).join(format!("{}.json", resource))
  }

  /// Read a stored document, `None` if absent.
  pub fn load(&self, stack: &str, resource: &str) -> Result<Option<ResourceDocument>, BackendError> {
    let path = self.document_path(stack, resource);
    match fs::read_to_string(&path) {
      Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(BackendError::Io(e)),
    }
  }

  fn store(&self, stack: &str, resource: &str, document: &ResourceDocument) -> Result<(), BackendError> {
    let path = self.document_path(stack, resource);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(document)?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, &path)?;
    Ok(())
  }
}

impl ProvisioningBackend for LocalBackend {
  async fn create_or_update(&self, request: &ProvisionRequest<'_>) -> Result<Outputs, BackendError> {
    let name = &request.resource.name;

    if let Some(existing) = self.load(request.stack, name)?
      && existing.kind == request.resource.kind
      && existing.properties == *request.properties
    {
      debug!(stack = request.stack, resource = %name, "resource already up to date");
      return Ok(existing.outputs);
    }

    let document = ResourceDocument {
      kind: request.resource.kind.clone(),
      handle: resource_handle(request.stack, request.resource),
      properties: request.properties.clone(),
      outputs: synthesize_outputs(request.stack, request.resource),
      updated_at: now_unix(),
    };
    self.store(request.stack, name, &document)?;

    info!(stack = request.stack, resource = %name, handle = %document.handle, "resource written");
    Ok(document.outputs)
  }

  async fn delete(&self, request: &DeleteRequest<'_>) -> Result<DeleteOutcome, BackendError> {
    let path = self.document_path(request.stack, &request.resource.name);
    match fs::remove_file(&path) {
      Ok(()) => {
        info!(stack = request.stack, resource = %request.resource.name, "resource removed");
        // Drop the stack directory once empty; a non-empty one is left alone.
        if let Some(parent) = path.parent() {
          let _ = fs::remove_dir(parent);
        }
        Ok(DeleteOutcome::Deleted)
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DeleteOutcome::Absent),
      Err(e) => Err(BackendError::Io(e)),
    }
  }
}
