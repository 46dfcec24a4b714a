//! Apply and destroy orchestration.
//!
//! Walks a [`Plan`] one stack at a time:
//! 1. Resolve the stack's inputs from run state
//! 2. Provision each resource in declared order, skipping unchanged ones
//! 3. Record the stack's outputs so dependents can read them
//!
//! A backend failure stops the run and is reported as a partial failure.
//! Nothing is rolled back; re-running with the same run state resumes.

use std::collections::BTreeMap;
use std::future::Future;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, DeleteOutcome, DeleteRequest, ProvisionRequest, ProvisioningBackend};
use crate::stack::{ResourceDescriptor, Scalar, Stack};
use crate::state::{ResourceRecord, ResourceStatus, RunStateTracker, now_unix};
use crate::util::hash::{Fingerprint, Hashable};

use super::plan::Plan;
use super::resolver::StackResolver;
use super::types::{ApplyResult, ExecuteConfig, ExecuteError, ResourceFailure, RunStatus, RunSummary};

/// What a resource's fingerprint covers: the descriptor, its resolved
/// properties, and the stack inputs the backend sees alongside them.
#[derive(Serialize)]
struct ResourceFingerprint<'a> {
  resource: &'a ResourceDescriptor,
  properties: &'a BTreeMap<String, Scalar>,
  inputs: &'a BTreeMap<String, Scalar>,
}

impl Hashable for ResourceFingerprint<'_> {}

/// Provision every stack in `plan`, in order.
///
/// `stacks` must contain every stack the plan names.
///
/// # Errors
///
/// Backend failures are not errors: they come back as
/// [`RunStatus::PartialFailure`]. An `Err` means the run could not continue
/// for a reason re-running will not fix (unknown stack, unresolvable value,
/// state I/O).
pub async fn apply_plan<B: ProvisioningBackend>(
  plan: &Plan,
  stacks: &[Stack],
  backend: &B,
  tracker: &mut RunStateTracker,
  config: &ExecuteConfig,
) -> Result<ApplyResult, ExecuteError> {
  info!(stacks = plan.len(), "starting apply");
  let mut summary = RunSummary::default();

  for id in plan.stacks() {
    if config.cancel.is_cancelled() {
      warn!(next_stack = %id, "apply cancelled");
      return Ok(ApplyResult {
        status: RunStatus::Cancelled { next_stack: id.clone() },
        summary,
      });
    }

    let stack = find_stack(stacks, id)?;
    if let Some(failure) = apply_stack(stack, backend, tracker, config, &mut summary).await? {
      return Ok(ApplyResult {
        status: RunStatus::PartialFailure(failure),
        summary,
      });
    }
    summary.stacks_completed += 1;
  }

  tracker.archive()?;
  info!(
    created = summary.created,
    updated = summary.updated,
    unchanged = summary.unchanged,
    "apply complete"
  );

  Ok(ApplyResult {
    status: RunStatus::Success,
    summary,
  })
}

/// Provision one stack. Returns the failure that stopped it, if any.
async fn apply_stack<B: ProvisioningBackend>(
  stack: &Stack,
  backend: &B,
  tracker: &mut RunStateTracker,
  config: &ExecuteConfig,
  summary: &mut RunSummary,
) -> Result<Option<ResourceFailure>, ExecuteError> {
  info!(stack = %stack.id, resources = stack.resources.len(), "applying stack");
  let mut resolver = StackResolver::new(stack, tracker)?;

  for resource in &stack.resources {
    let properties = resolver.resolve_properties(resource)?;
    let fingerprint = ResourceFingerprint {
      resource,
      properties: &properties,
      inputs: resolver.inputs(),
    }
    .compute_hash()?;

    let previous = tracker.get(&stack.id, &resource.name).cloned();
    if let Some(record) = &previous
      && is_current(record, &fingerprint)
    {
      debug!(stack = %stack.id, resource = %resource.name, "resource unchanged, skipping");
      summary.unchanged += 1;
      resolver.push_outputs(&resource.name, record.outputs.clone());
      continue;
    }

    let request = ProvisionRequest {
      stack: &stack.id,
      resource,
      properties: &properties,
      inputs: resolver.inputs(),
    };
    let result = bounded(config, backend.create_or_update(&request)).await;

    match result {
      Ok(outputs) => {
        let updated = previous.is_some_and(|r| r.status == ResourceStatus::Provisioned);
        let action = if updated { "updated" } else { "created" };
        info!(stack = %stack.id, resource = %resource.name, kind = %resource.kind, action, "resource provisioned");
        if updated {
          summary.updated += 1;
        } else {
          summary.created += 1;
        }
        tracker.put(
          &stack.id,
          &resource.name,
          ResourceRecord::provisioned(outputs.clone(), fingerprint),
        )?;
        resolver.push_outputs(&resource.name, outputs);
      }
      Err(cause) => {
        error!(stack = %stack.id, resource = %resource.name, error = %cause, "resource failed");
        let mut record = ResourceRecord::failed(cause.to_string(), Some(fingerprint));
        // Keep what the backend last returned so a later destroy can use it
        if let Some(previous) = previous {
          record.outputs = previous.outputs;
        }
        tracker.put(&stack.id, &resource.name, record)?;
        tracker.invalidate_stack(&stack.id)?;
        return Ok(Some(ResourceFailure {
          stack: stack.id.clone(),
          resource: resource.name.clone(),
          cause,
        }));
      }
    }
  }

  let outputs = resolver.stack_outputs(stack)?;
  tracker.complete_stack(&stack.id, outputs)?;
  info!(stack = %stack.id, "stack applied");
  Ok(None)
}

/// Delete every stack in `plan`, in teardown order.
///
/// Within a stack, resources are deleted in reverse declared order.
/// Resources with no record are skipped without a backend call, so
/// destroying twice is a no-op. Retained resources lose their record but
/// are never sent to the backend.
pub async fn destroy_plan<B: ProvisioningBackend>(
  plan: &Plan,
  stacks: &[Stack],
  backend: &B,
  tracker: &mut RunStateTracker,
  config: &ExecuteConfig,
) -> Result<ApplyResult, ExecuteError> {
  info!(stacks = plan.len(), "starting destroy");
  let unplanned = unplanned_records(plan, stacks, tracker);
  if !unplanned.is_empty() {
    error!(records = ?unplanned, "run state has records outside the plan");
    return Err(ExecuteError::UnplannedRecords(unplanned));
  }
  let mut summary = RunSummary::default();

  for id in plan.teardown() {
    if config.cancel.is_cancelled() {
      warn!(next_stack = %id, "destroy cancelled");
      return Ok(ApplyResult {
        status: RunStatus::Cancelled {
          next_stack: id.to_string(),
        },
        summary,
      });
    }

    let stack = find_stack(stacks, id)?;
    if let Some(failure) = destroy_stack(stack, backend, tracker, config, &mut summary).await? {
      return Ok(ApplyResult {
        status: RunStatus::PartialFailure(failure),
        summary,
      });
    }
    summary.stacks_completed += 1;
  }

  info!(
    deleted = summary.deleted,
    absent = summary.absent,
    retained = summary.retained,
    "destroy complete"
  );
  Ok(ApplyResult {
    status: RunStatus::Success,
    summary,
  })
}

async fn destroy_stack<B: ProvisioningBackend>(
  stack: &Stack,
  backend: &B,
  tracker: &mut RunStateTracker,
  config: &ExecuteConfig,
  summary: &mut RunSummary,
) -> Result<Option<ResourceFailure>, ExecuteError> {
  debug!(stack = %stack.id, "destroying stack");

  for resource in stack.resources.iter().rev() {
    let Some(record) = tracker.get(&stack.id, &resource.name).cloned() else {
      continue;
    };

    if resource.retain {
      info!(stack = %stack.id, resource = %resource.name, "resource retained, dropping record");
      summary.retained += 1;
      tracker.remove(&stack.id, &resource.name)?;
      continue;
    }

    let request = DeleteRequest {
      stack: &stack.id,
      resource,
      outputs: &record.outputs,
    };
    match bounded(config, backend.delete(&request)).await {
      Ok(outcome) => {
        match outcome {
          DeleteOutcome::Deleted => summary.deleted += 1,
          DeleteOutcome::Absent => summary.absent += 1,
        }
        info!(stack = %stack.id, resource = %resource.name, outcome = ?outcome, "resource destroyed");
        tracker.remove(&stack.id, &resource.name)?;
      }
      Err(cause) => {
        error!(stack = %stack.id, resource = %resource.name, error = %cause, "resource delete failed");
        let mut record = record;
        record.last_attempt = now_unix();
        record.last_error = Some(cause.to_string());
        tracker.put(&stack.id, &resource.name, record)?;
        return Ok(Some(ResourceFailure {
          stack: stack.id.clone(),
          resource: resource.name.clone(),
          cause,
        }));
      }
    }
  }

  tracker.forget_stack(&stack.id)?;
  Ok(None)
}

/// Recorded stacks, and resources within planned stacks, that the plan
/// does not declare.
fn unplanned_records(plan: &Plan, stacks: &[Stack], tracker: &RunStateTracker) -> Vec<String> {
  let mut unplanned = Vec::new();
  for (id, record) in &tracker.record().stacks {
    let planned = plan
      .position(id)
      .and_then(|_| stacks.iter().find(|s| &s.id == id));
    match planned {
      None => unplanned.push(id.clone()),
      Some(stack) => unplanned.extend(
        record
          .resources
          .keys()
          .filter(|name| stack.find_resource(name).is_none())
          .map(|name| format!("{}/{}", id, name)),
      ),
    }
  }
  unplanned
}

fn is_current(record: &ResourceRecord, fingerprint: &Fingerprint) -> bool {
  record.status == ResourceStatus::Provisioned && record.fingerprint.as_ref() == Some(fingerprint)
}

fn find_stack<'a>(stacks: &'a [Stack], id: &str) -> Result<&'a Stack, ExecuteError> {
  stacks
    .iter()
    .find(|s| s.id == id)
    .ok_or_else(|| ExecuteError::UnknownStack(id.to_string()))
}

/// Run a backend call under the configured timeout.
async fn bounded<T>(
  config: &ExecuteConfig,
  call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
  match tokio::time::timeout(config.backend_timeout, call).await {
    Ok(result) => result,
    Err(_) => Err(BackendError::Timeout(config.backend_timeout)),
  }
}
