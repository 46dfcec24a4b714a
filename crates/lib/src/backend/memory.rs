//! In-process backend.
//!
//! Keeps provisioned resources in a map and logs every call. Failures and
//! latency can be injected per resource, which is what the executor tests
//! use to exercise partial failure and timeouts.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use crate::stack::{Outputs, Scalar};

use super::{
  BackendError, DeleteOutcome, DeleteRequest, ProvisionRequest, ProvisioningBackend, synthesize_outputs,
};

/// A call observed by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
  CreateOrUpdate { stack: String, resource: String },
  Delete { stack: String, resource: String },
}

#[derive(Debug)]
struct StoredResource {
  properties: BTreeMap<String, Scalar>,
  outputs: Outputs,
}

#[derive(Debug, Default)]
struct Inner {
  resources: BTreeMap<(String, String), StoredResource>,
  calls: Vec<BackendCall>,
  failing: HashSet<(String, String)>,
  slow: HashSet<(String, String)>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
  inner: Mutex<Inner>,
  latency: Duration,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Delay applied to calls on resources marked with [`MemoryBackend::slow_on`].
  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  /// Make every call for `stack`/`resource` fail until cleared.
  pub fn fail_on(&self, stack: &str, resource: &str) {
    self.lock().failing.insert(key(stack, resource));
  }

  pub fn clear_failures(&self) {
    self.lock().failing.clear();
  }

  /// Delay calls for `stack`/`resource` by the configured latency.
  pub fn slow_on(&self, stack: &str, resource: &str) {
    self.lock().slow.insert(key(stack, resource));
  }

  /// Every call made so far, in order.
  pub fn calls(&self) -> Vec<BackendCall> {
    self.lock().calls.clone()
  }

  pub fn call_count(&self) -> usize {
    self.lock().calls.len()
  }

  pub fn contains(&self, stack: &str, resource: &str) -> bool {
    self.lock().resources.contains_key(&key(stack, resource))
  }

  /// Number of resources currently provisioned.
  pub fn len(&self) -> usize {
    self.lock().resources.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Properties last submitted for a resource.
  pub fn properties_of(&self, stack: &str, resource: &str) -> Option<BTreeMap<String, Scalar>> {
    self
      .lock()
      .resources
      .get(&key(stack, resource))
      .map(|r| r.properties.clone())
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    // A poisoned lock only means a test panicked mid-call; the data is still usable.
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Log the call and report whether it should be delayed or fail.
  fn observe(&self, call: BackendCall, stack: &str, resource: &str) -> (bool, bool) {
    let mut inner = self.lock();
    inner.calls.push(call);
    let k = key(stack, resource);
    (inner.slow.contains(&k), inner.failing.contains(&k))
  }
}

impl ProvisioningBackend for MemoryBackend {
  async fn create_or_update(&self, request: &ProvisionRequest<'_>) -> Result<Outputs, BackendError> {
    let name = &request.resource.name;
    let call = BackendCall::CreateOrUpdate {
      stack: request.stack.to_string(),
      resource: name.clone(),
    };
    let (slow, failing) = self.observe(call, request.stack, name);

    if slow {
      tokio::time::sleep(self.latency).await;
    }
    if failing {
      return Err(BackendError::Rejected {
        kind: request.resource.kind.clone(),
        message: format!("injected failure for {}/{}", request.stack, name),
      });
    }

    let mut inner = self.lock();
    let entry = inner
      .resources
      .entry(key(request.stack, name))
      .or_insert_with(|| StoredResource {
        properties: BTreeMap::new(),
        outputs: synthesize_outputs(request.stack, request.resource),
      });
    entry.properties = request.properties.clone();
    debug!(stack = request.stack, resource = %name, "memory backend stored resource");
    Ok(entry.outputs.clone())
  }

  async fn delete(&self, request: &DeleteRequest<'_>) -> Result<DeleteOutcome, BackendError> {
    let name = &request.resource.name;
    let call = BackendCall::Delete {
      stack: request.stack.to_string(),
      resource: name.clone(),
    };
    let (slow, failing) = self.observe(call, request.stack, name);

    if slow {
      tokio::time::sleep(self.latency).await;
    }
    if failing {
      return Err(BackendError::Unavailable(format!(
        "injected failure for {}/{}",
        request.stack, name
      )));
    }

    match self.lock().resources.remove(&key(request.stack, name)) {
      Some(_) => Ok(DeleteOutcome::Deleted),
      None => Ok(DeleteOutcome::Absent),
    }
  }
}

fn key(stack: &str, resource: &str) -> (String, String) {
  (stack.to_string(), resource.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::stack::ResourceDescriptor;

  fn vpc() -> ResourceDescriptor {
    ResourceDescriptor::new("network.vpc", "vpc").output("vpc_id")
  }

  #[tokio::test]
  async fn create_is_idempotent() {
    let backend = MemoryBackend::new();
    let resource = vpc();
    let props = BTreeMap::new();
    let request = ProvisionRequest {
      stack: "network",
      resource: &resource,
      properties: &props,
      inputs: &props,
    };

    let first = backend.create_or_update(&request).await.unwrap();
    let second = backend.create_or_update(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.len(), 1);
    assert_eq!(backend.call_count(), 2);
  }

  #[tokio::test]
  async fn delete_absent_is_ok() {
    let backend = MemoryBackend::new();
    let resource = vpc();
    let outputs = Outputs::new();
    let request = DeleteRequest {
      stack: "network",
      resource: &resource,
      outputs: &outputs,
    };

    assert_eq!(backend.delete(&request).await.unwrap(), DeleteOutcome::Absent);
  }

  #[tokio::test]
  async fn injected_failure_until_cleared() {
    let backend = MemoryBackend::new();
    backend.fail_on("network", "vpc");
    let resource = vpc();
    let props = BTreeMap::new();
    let request = ProvisionRequest {
      stack: "network",
      resource: &resource,
      properties: &props,
      inputs: &props,
    };

    assert!(matches!(
      backend.create_or_update(&request).await,
      Err(BackendError::Rejected { .. })
    ));
    assert!(!backend.contains("network", "vpc"));

    backend.clear_failures();
    backend.create_or_update(&request).await.unwrap();
    assert!(backend.contains("network", "vpc"));
  }
}
