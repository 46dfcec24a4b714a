//! Implementation of the `stackup apply` command.
//!
//! Provisions every configured stack against the local backend, recording
//! progress in the run state so an interrupted or failed run can be resumed.

use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::info;

use stackup_lib::execute::RunStatus;

use crate::output::{OutputFormat, print_error, print_json, print_success, print_summary, print_warning, summary_json};

use super::{RunOptions, runtime};

/// Execute the apply command.
///
/// - Loads the topology and plans it
/// - Opens the run state and the local backend
/// - Provisions stacks in order, skipping unchanged resources
///
/// Exits non-zero when the run stops on a failed resource or is cancelled.
pub fn cmd_apply(options: &RunOptions, output: OutputFormat) -> Result<()> {
  let mut session = options.open()?;
  let rt = runtime(&session.execute)?;

  let started = Instant::now();
  let result = rt
    .block_on(
      session
        .composition
        .apply(&session.backend, &mut session.tracker, &session.execute),
    )
    .context("Apply failed")?;
  let elapsed = started.elapsed();
  info!(elapsed = %humantime::format_duration(elapsed), "apply finished");

  if output.is_json() {
    let (status, failure) = match &result.status {
      RunStatus::Success => ("success", None),
      RunStatus::PartialFailure(f) => (
        "partial_failure",
        Some(serde_json::json!({ "stack": f.stack, "resource": f.resource, "error": f.cause.to_string() })),
      ),
      RunStatus::Cancelled { next_stack } => ("cancelled", Some(serde_json::json!({ "next_stack": next_stack }))),
    };
    print_json(&serde_json::json!({
      "status": status,
      "summary": summary_json(&result.summary),
      "failure": failure,
    }))?;
  } else {
    match &result.status {
      RunStatus::Success if result.summary.changes() == 0 => print_success("Apply complete, no changes"),
      RunStatus::Success => print_success("Apply complete!"),
      RunStatus::PartialFailure(failure) => print_error(&format!(
        "Apply stopped at {}/{}: {}",
        failure.stack, failure.resource, failure.cause
      )),
      RunStatus::Cancelled { next_stack } => print_warning(&format!("Apply cancelled before stack {}", next_stack)),
    }
    print_summary(&result.summary, elapsed);
  }

  match result.status {
    RunStatus::Success => Ok(()),
    RunStatus::PartialFailure(failure) => bail!(
      "resource {}/{} failed; run apply again to resume",
      failure.stack,
      failure.resource
    ),
    RunStatus::Cancelled { next_stack } => bail!("cancelled before stack {}", next_stack),
  }
}
