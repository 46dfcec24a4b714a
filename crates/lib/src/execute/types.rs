//! Types for planning and executing stacks.
//!
//! This module defines the error types, result types, and configuration
//! shared by the resolver, planner and executor.

use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::backend::BackendError;
use crate::stack::Reference;
use crate::state::StateError;
use crate::util::hash::HashError;

/// Configuration-time errors. Always reported before any backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  /// Two stacks share an id.
  #[error("duplicate stack id: {0}")]
  DuplicateStack(String),

  /// Two resources in one stack share a name.
  #[error("duplicate resource {resource} in stack {stack}")]
  DuplicateResource { stack: String, resource: String },

  /// A reference names a stack that is not registered.
  #[error("stack {consumer} references unknown stack {stack}")]
  UnknownStackReference { consumer: String, stack: String },

  /// A reference names an output the producer does not declare.
  #[error("stack {consumer} references unknown output {stack}.{output}")]
  UnknownOutputReference {
    consumer: String,
    stack: String,
    output: String,
  },

  /// A stack output is sourced from a resource the stack does not contain.
  #[error("output {output} of stack {stack} is sourced from unknown resource {resource}")]
  UnknownOutputSource {
    stack: String,
    output: String,
    resource: String,
  },

  /// A resource property reads a stack input that is not declared.
  #[error("resource {resource} in stack {stack} reads undeclared input {input}")]
  UnknownInput {
    stack: String,
    resource: String,
    input: String,
  },

  /// A resource property reads an output of a resource that does not precede it.
  #[error("resource {resource} in stack {stack} reads {source_resource}.{output}, which is not an earlier resource output")]
  UnknownLocalReference {
    stack: String,
    resource: String,
    source_resource: String,
    output: String,
  },

  /// The stacks cannot be ordered. Lists every stack on a cycle.
  #[error("dependency cycle between stacks: {}", members.join(", "))]
  Cycle { members: Vec<String> },
}

/// Errors that stop a run outright.
///
/// Backend failures are not here: they are recorded per resource and
/// reported through [`RunStatus::PartialFailure`] so the run can resume.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The plan names a stack that is not registered.
  #[error("stack not found: {0}")]
  UnknownStack(String),

  /// A producer's outputs are not recorded in run state.
  #[error("stack {stack} cannot resolve {reference}: producer has not completed")]
  UnresolvedReference { stack: String, reference: Reference },

  /// A property read a stack input that has no resolved value.
  #[error("stack {stack} has no resolved input {input}")]
  UnresolvedInput { stack: String, input: String },

  /// A property read an earlier resource output that the backend did not return.
  #[error("resource {resource} in stack {stack} did not produce output {output}")]
  UnresolvedLocal {
    stack: String,
    resource: String,
    output: String,
  },

  /// A declared stack output has no resource-produced value.
  #[error("stack {stack} output {output} was not produced by any resource")]
  UnresolvedOutput { stack: String, output: String },

  /// Run state holds resources that no planned stack declares, so destroy
  /// cannot reach them. Entries are stack ids or `stack/resource`.
  #[error(
    "run state records {} not in the current configuration; restore them before destroying",
    .0.join(", ")
  )]
  UnplannedRecords(Vec<String>),

  /// Run state could not be persisted.
  #[error("run state error: {0}")]
  State(#[from] StateError),

  /// A resource fingerprint could not be computed.
  #[error("fingerprint error: {0}")]
  Fingerprint(#[from] HashError),
}

/// The resource a run stopped on, and why.
#[derive(Debug)]
pub struct ResourceFailure {
  pub stack: String,
  pub resource: String,
  pub cause: BackendError,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunStatus {
  /// Every stack in the plan completed.
  Success,
  /// A backend call failed; re-run with the same state to resume.
  PartialFailure(ResourceFailure),
  /// Cancelled between stacks; `next_stack` was not started.
  Cancelled { next_stack: String },
}

/// Counts of what a run did, per resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub created: usize,
  pub updated: usize,
  pub unchanged: usize,
  pub deleted: usize,
  /// Destroy targets that were already gone.
  pub absent: usize,
  /// Destroy targets kept in place by their removal policy.
  pub retained: usize,
  /// Stacks that ran to completion.
  pub stacks_completed: usize,
}

impl RunSummary {
  /// Number of backend calls that changed something.
  pub fn changes(&self) -> usize {
    self.created + self.updated + self.deleted
  }
}

/// Result of an apply or destroy run.
#[derive(Debug)]
pub struct ApplyResult {
  pub status: RunStatus,
  pub summary: RunSummary,
}

impl ApplyResult {
  pub fn is_success(&self) -> bool {
    matches!(self.status, RunStatus::Success)
  }

  pub fn failure(&self) -> Option<&ResourceFailure> {
    match &self.status {
      RunStatus::PartialFailure(failure) => Some(failure),
      _ => None,
    }
  }
}

/// Configuration for apply and destroy runs.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Upper bound on a single backend call.
  pub backend_timeout: Duration,

  /// Checked between stacks; never interrupts a backend call.
  pub cancel: CancellationToken,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      backend_timeout: Duration::from_secs(300),
      cancel: CancellationToken::new(),
    }
  }
}
