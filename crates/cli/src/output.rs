//! CLI output formatting utilities.
//!
//! Colored status lines, resource status symbols and durations.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use stackup_lib::execute::RunSummary;
use stackup_lib::state::ResourceStatus;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const PENDING: &str = "○";
}

/// Shorten a fingerprint for display.
pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// A colored symbol for a resource's recorded status.
pub fn status_symbol(status: ResourceStatus) -> String {
  match status {
    ResourceStatus::Provisioned => symbols::SUCCESS
      .if_supports_color(Stream::Stdout, |s| s.green())
      .to_string(),
    ResourceStatus::Failed => symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
    ResourceStatus::Pending => symbols::PENDING
      .if_supports_color(Stream::Stdout, |s| s.dimmed())
      .to_string(),
  }
}

/// Print the non-zero counts of a run summary.
pub fn print_summary(summary: &RunSummary, elapsed: Duration) {
  let counts = [
    ("Created", summary.created),
    ("Updated", summary.updated),
    ("Unchanged", summary.unchanged),
    ("Deleted", summary.deleted),
    ("Already absent", summary.absent),
    ("Retained", summary.retained),
  ];
  for (label, count) in counts {
    if count > 0 {
      print_stat(label, &count.to_string());
    }
  }
  print_stat("Stacks completed", &summary.stacks_completed.to_string());
  print_stat("Elapsed", &format_duration(elapsed));
}

pub fn summary_json(summary: &RunSummary) -> serde_json::Value {
  serde_json::json!({
    "created": summary.created,
    "updated": summary.updated,
    "unchanged": summary.unchanged,
    "deleted": summary.deleted,
    "absent": summary.absent,
    "retained": summary.retained,
    "stacks_completed": summary.stacks_completed,
  })
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
