//! The composition: registered stacks and the operations over them.
//!
//! ```no_run
//! # async fn run() -> Result<(), stackup_lib::composition::CompositionError> {
//! use stackup_lib::backend::MemoryBackend;
//! use stackup_lib::composition::Composition;
//! use stackup_lib::execute::ExecuteConfig;
//! use stackup_lib::stack::{Reference, ResourceDescriptor, Stack};
//! use stackup_lib::state::RunStateTracker;
//!
//! let mut composition = Composition::new();
//! composition.register_stack(
//!   Stack::new("network")
//!     .resource(ResourceDescriptor::new("network.vpc", "vpc").output("vpc_id"))
//!     .output("net_id", "vpc", "vpc_id"),
//! )?;
//! composition.register_stack(Stack::new("cluster").input_ref("net_id", Reference::new("network", "net_id")))?;
//!
//! let mut tracker = RunStateTracker::in_memory();
//! let result = composition
//!   .apply(&MemoryBackend::new(), &mut tracker, &ExecuteConfig::default())
//!   .await?;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```

use thiserror::Error;
use tracing::debug;

use crate::backend::ProvisioningBackend;
use crate::execute::{
  ApplyResult, DependencyGraph, ExecuteConfig, ExecuteError, GraphError, Plan, apply_plan, destroy_plan, plan,
};
use crate::stack::Stack;
use crate::state::RunStateTracker;

#[derive(Debug, Error)]
pub enum CompositionError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),
}

/// Stacks in registration order.
#[derive(Debug, Clone, Default)]
pub struct Composition {
  stacks: Vec<Stack>,
}

impl Composition {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a stack. Registration order is the planner's tie-break.
  pub fn register_stack(&mut self, stack: Stack) -> Result<(), GraphError> {
    if self.get(&stack.id).is_some() {
      return Err(GraphError::DuplicateStack(stack.id));
    }
    debug!(stack = %stack.id, resources = stack.resources.len(), "registered stack");
    self.stacks.push(stack);
    Ok(())
  }

  pub fn stacks(&self) -> &[Stack] {
    &self.stacks
  }

  pub fn get(&self, id: &str) -> Option<&Stack> {
    self.stacks.iter().find(|s| s.id == id)
  }

  pub fn len(&self) -> usize {
    self.stacks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stacks.is_empty()
  }

  /// Validate references and build the dependency graph.
  pub fn graph(&self) -> Result<DependencyGraph, GraphError> {
    DependencyGraph::resolve(&self.stacks)
  }

  /// Resolve and order the registered stacks.
  pub fn compute_plan(&self) -> Result<Plan, GraphError> {
    plan(&self.graph()?)
  }

  /// Plan, then provision every stack.
  ///
  /// Configuration errors are returned before the backend is called.
  pub async fn apply<B: ProvisioningBackend>(
    &self,
    backend: &B,
    tracker: &mut RunStateTracker,
    config: &ExecuteConfig,
  ) -> Result<ApplyResult, CompositionError> {
    let plan = self.compute_plan()?;
    Ok(apply_plan(&plan, &self.stacks, backend, tracker, config).await?)
  }

  /// Plan, then delete every stack in teardown order.
  pub async fn destroy<B: ProvisioningBackend>(
    &self,
    backend: &B,
    tracker: &mut RunStateTracker,
    config: &ExecuteConfig,
  ) -> Result<ApplyResult, CompositionError> {
    let plan = self.compute_plan()?;
    Ok(destroy_plan(&plan, &self.stacks, backend, tracker, config).await?)
  }
}
