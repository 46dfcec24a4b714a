use std::io::{self, IsTerminal, Write};

use anyhow::{Result, bail};

/// Ask before deleting the recorded stacks. `force` answers yes.
pub fn confirm_destroy(stacks: &[&str], force: bool) -> Result<bool> {
  if force {
    return Ok(true);
  }

  if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
    bail!("Refusing to destroy without confirmation in non-interactive mode. Use --force to proceed.");
  }

  let mut stderr = io::stderr();
  writeln!(stderr, "This will delete every resource recorded for: {}", stacks.join(", "))?;
  write!(stderr, "Continue? [y/N] ")?;
  stderr.flush()?;

  let mut input = String::new();
  io::stdin().read_line(&mut input)?;

  Ok(matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
