//! Status command implementation.
//!
//! Displays the recorded run state: per-stack resource status, stack
//! outputs, and the last error of any failed resource.

use std::path::PathBuf;

use anyhow::{Context, Result};

use stackup_lib::state::{ResourceStatus, RunStateTracker};

use crate::output::{OutputFormat, print_info, print_json, print_stat, status_symbol, truncate_hash};

use super::state_path;

pub fn cmd_status(state: Option<PathBuf>, verbose: bool, output: OutputFormat) -> Result<()> {
  let path = state_path(state);
  let tracker =
    RunStateTracker::open(&path).with_context(|| format!("Failed to open run state: {}", path.display()))?;
  let record = tracker.record();

  if output.is_json() {
    return print_json(record);
  }

  if record.is_empty() {
    print_info("No run state found. Run 'stackup apply' to create one.");
    return Ok(());
  }

  print_stat("State", &path.display().to_string());
  print_stat("Resources", &record.resource_count().to_string());
  let failed = record
    .stacks
    .values()
    .flat_map(|s| s.resources.values())
    .filter(|r| r.status == ResourceStatus::Failed)
    .count();
  if failed > 0 {
    print_stat("Failed", &failed.to_string());
  }

  for (id, stack) in &record.stacks {
    println!();
    let completion = if stack.outputs.is_some() { "complete" } else { "incomplete" };
    println!("{} ({})", id, completion);

    for (name, resource) in &stack.resources {
      match (&resource.fingerprint, verbose) {
        (Some(fingerprint), true) => println!(
          "  {} {} [{}]",
          status_symbol(resource.status),
          name,
          truncate_hash(&fingerprint.0)
        ),
        _ => println!("  {} {}", status_symbol(resource.status), name),
      }
      if let Some(error) = &resource.last_error {
        println!("      error: {}", error);
      }
    }

    if verbose && let Some(outputs) = &stack.outputs {
      for (name, value) in outputs {
        println!("      {} = {}", name, value);
      }
    }
  }

  Ok(())
}
