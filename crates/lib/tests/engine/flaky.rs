//! A backend wrapper that fails selected calls a fixed number of times.

use std::collections::HashMap;
use std::sync::Mutex;

use stackup_lib::backend::{
  BackendError, DeleteOutcome, DeleteRequest, ProvisionRequest, ProvisioningBackend,
};
use stackup_lib::stack::Outputs;

pub struct Flaky<B> {
  inner: B,
  remaining: Mutex<HashMap<String, usize>>,
}

impl<B: ProvisioningBackend + Sync> Flaky<B> {
  pub fn new(inner: B) -> Self {
    Self {
      inner,
      remaining: Mutex::new(HashMap::new()),
    }
  }

  /// Fail the next `times` calls for `stack/resource`.
  pub fn fail(self, stack: &str, resource: &str, times: usize) -> Self {
    self.remaining.lock().unwrap().insert(format!("{}/{}", stack, resource), times);
    self
  }

  fn should_fail(&self, stack: &str, resource: &str) -> bool {
    let mut remaining = self.remaining.lock().unwrap();
    match remaining.get_mut(&format!("{}/{}", stack, resource)) {
      Some(n) if *n > 0 => {
        *n -= 1;
        true
      }
      _ => false,
    }
  }
}

impl<B: ProvisioningBackend + Sync> ProvisioningBackend for Flaky<B> {
  async fn create_or_update(&self, request: &ProvisionRequest<'_>) -> Result<Outputs, BackendError> {
    if self.should_fail(request.stack, &request.resource.name) {
      return Err(BackendError::Unavailable("throttled".to_string()));
    }
    self.inner.create_or_update(request).await
  }

  async fn delete(&self, request: &DeleteRequest<'_>) -> Result<DeleteOutcome, BackendError> {
    if self.should_fail(request.stack, &request.resource.name) {
      return Err(BackendError::Unavailable("throttled".to_string()));
    }
    self.inner.delete(request).await
  }
}
