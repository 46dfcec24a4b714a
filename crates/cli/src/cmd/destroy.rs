//! Implementation of the `stackup destroy` command.
//!
//! Deletes every configured stack in reverse dependency order. Resources
//! without a run record are skipped, so destroying twice is harmless.

use std::time::Instant;

use anyhow::{Context, Result, bail};

use stackup_lib::execute::RunStatus;

use crate::output::{OutputFormat, print_error, print_info, print_json, print_success, print_summary, summary_json};
use crate::prompts::confirm_destroy;

use super::{RunOptions, runtime};

/// Execute the destroy command.
///
/// Prompts for confirmation unless `force` is set or there is nothing to
/// destroy.
pub fn cmd_destroy(options: &RunOptions, force: bool, output: OutputFormat) -> Result<()> {
  let mut session = options.open()?;

  if session.tracker.record().is_empty() {
    if output.is_json() {
      return print_json(&serde_json::json!({ "status": "nothing_to_destroy" }));
    }
    print_info("Nothing to destroy.");
    return Ok(());
  }

  let recorded: Vec<&str> = session.tracker.record().stacks.keys().map(String::as_str).collect();
  if !confirm_destroy(&recorded, force)? {
    print_info("Destroy aborted.");
    return Ok(());
  }

  let rt = runtime(&session.execute)?;
  let started = Instant::now();
  let result = rt
    .block_on(
      session
        .composition
        .destroy(&session.backend, &mut session.tracker, &session.execute),
    )
    .context("Destroy failed")?;
  let elapsed = started.elapsed();

  if output.is_json() {
    let status = match &result.status {
      RunStatus::Success => "success",
      RunStatus::PartialFailure(_) => "partial_failure",
      RunStatus::Cancelled { .. } => "cancelled",
    };
    print_json(&serde_json::json!({
      "status": status,
      "summary": summary_json(&result.summary),
      "failure": result.failure().map(|f| serde_json::json!({
        "stack": f.stack,
        "resource": f.resource,
        "error": f.cause.to_string(),
      })),
    }))?;
  } else {
    match &result.status {
      RunStatus::Success => print_success("Destroy complete!"),
      RunStatus::PartialFailure(failure) => print_error(&format!(
        "Destroy stopped at {}/{}: {}",
        failure.stack, failure.resource, failure.cause
      )),
      RunStatus::Cancelled { next_stack } => print_error(&format!("Destroy cancelled before stack {}", next_stack)),
    }
    print_summary(&result.summary, elapsed);
  }

  match result.status {
    RunStatus::Success => Ok(()),
    RunStatus::PartialFailure(failure) => bail!(
      "delete of {}/{} failed; run destroy again to resume",
      failure.stack,
      failure.resource
    ),
    RunStatus::Cancelled { next_stack } => bail!("cancelled before stack {}", next_stack),
  }
}
