//! Deployment planning.
//!
//! Turns a [`DependencyGraph`] into a total order of stacks. Among stacks
//! whose dependencies are all placed, the one registered first goes next, so
//! the same registrations always give the same plan.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::debug;

use super::dag::DependencyGraph;
use super::types::GraphError;

/// An ordered list of stacks to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
  /// Apply order.
  order: Vec<String>,

  /// Stacks grouped by depth: every stack in wave `n` depends only on
  /// stacks in earlier waves.
  waves: Vec<Vec<String>>,
}

impl Plan {
  /// Stacks in apply order.
  pub fn stacks(&self) -> &[String] {
    &self.order
  }

  /// Stacks in teardown order, the reverse of apply order.
  pub fn teardown(&self) -> impl Iterator<Item = &str> {
    self.order.iter().rev().map(String::as_str)
  }

  pub fn waves(&self) -> &[Vec<String>] {
    &self.waves
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// Position of a stack in apply order.
  pub fn position(&self, stack: &str) -> Option<usize> {
    self.order.iter().position(|s| s == stack)
  }
}

/// Compute a deployment plan.
///
/// # Errors
///
/// Returns [`GraphError::Cycle`] naming every stack that sits on a cycle,
/// in registration order.
pub fn plan(graph: &DependencyGraph) -> Result<Plan, GraphError> {
  let inner = graph.inner();

  let mut in_degree: Vec<usize> = inner
    .node_indices()
    .map(|idx| inner.neighbors_directed(idx, Direction::Incoming).count())
    .collect();
  let mut level = vec![0usize; inner.node_count()];

  // Min-heap on node index, which is registration order
  let mut ready: BinaryHeap<Reverse<NodeIndex>> = inner
    .node_indices()
    .filter(|idx| in_degree[idx.index()] == 0)
    .map(Reverse)
    .collect();

  let mut order = Vec::with_capacity(inner.node_count());
  let mut waves: Vec<Vec<String>> = Vec::new();

  while let Some(Reverse(idx)) = ready.pop() {
    let id = inner[idx].clone();
    let depth = level[idx.index()];
    if waves.len() <= depth {
      waves.resize_with(depth + 1, Vec::new);
    }
    waves[depth].push(id.clone());
    order.push(id);

    for next in inner.neighbors_directed(idx, Direction::Outgoing) {
      let n = next.index();
      level[n] = level[n].max(depth + 1);
      in_degree[n] -= 1;
      if in_degree[n] == 0 {
        ready.push(Reverse(next));
      }
    }
  }

  if order.len() < inner.node_count() {
    return Err(GraphError::Cycle {
      members: cycle_members(graph),
    });
  }

  debug!(stacks = order.len(), waves = waves.len(), "computed deployment plan");
  Ok(Plan { order, waves })
}

/// Stacks on a cycle: members of any multi-node strongly connected
/// component, plus stacks that reference themselves.
fn cycle_members(graph: &DependencyGraph) -> Vec<String> {
  let inner = graph.inner();
  let mut members: Vec<NodeIndex> = tarjan_scc(inner)
    .into_iter()
    .filter(|scc| scc.len() > 1 || inner.contains_edge(scc[0], scc[0]))
    .flatten()
    .collect();
  members.sort();
  members.into_iter().map(|idx| inner[idx].clone()).collect()
}
