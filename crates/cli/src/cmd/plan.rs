//! Implementation of the `stackup plan` command.
//!
//! Resolves and orders the configured stacks without touching the backend
//! or run state.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

use super::load_composition;

#[derive(Serialize)]
struct PlannedStack<'a> {
  id: &'a str,
  depends_on: Vec<&'a str>,
  resources: Vec<&'a str>,
}

#[derive(Serialize)]
struct PlanView<'a> {
  stacks: Vec<PlannedStack<'a>>,
  teardown: Vec<&'a str>,
  waves: &'a [Vec<String>],
}

pub fn cmd_plan(config: Option<&Path>, output: OutputFormat) -> Result<()> {
  let composition = load_composition(config)?;
  let graph = composition.graph().context("Invalid stack references")?;
  let plan = composition.compute_plan().context("Failed to order stacks")?;

  let stacks = plan
    .stacks()
    .iter()
    .filter_map(|id| composition.get(id))
    .map(|stack| PlannedStack {
      id: &stack.id,
      depends_on: graph.dependencies(&stack.id),
      resources: stack.resources.iter().map(|r| r.name.as_str()).collect(),
    })
    .collect::<Vec<_>>();

  if output.is_json() {
    return print_json(&PlanView {
      stacks,
      teardown: plan.teardown().collect(),
      waves: plan.waves(),
    });
  }

  if plan.is_empty() {
    print_info("No stacks configured.");
    return Ok(());
  }

  println!("Deployment plan ({} stacks):", plan.len());
  for (position, stack) in stacks.iter().enumerate() {
    let deps = if stack.depends_on.is_empty() {
      String::new()
    } else {
      format!(" {} {}", symbols::ARROW, stack.depends_on.join(", "))
    };
    println!(
      "  {}. {}{}",
      position + 1,
      stack.id.if_supports_color(Stream::Stdout, |s| s.bold()),
      deps.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
    for resource in &stack.resources {
      println!("       {} {}", symbols::INFO, resource);
    }
  }

  println!();
  print_stat("Waves", &plan.waves().len().to_string());
  print_stat("Teardown", &plan.teardown().collect::<Vec<_>>().join(", "));

  Ok(())
}
