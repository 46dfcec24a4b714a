//! Stack dependency graph.
//!
//! Nodes are stack ids; an edge `A -> B` means some input or property of
//! `B` references an output of `A`. Node indices follow registration order,
//! which the planner uses as its tie-break.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::stack::{Stack, Value};

use super::types::GraphError;

/// Directed graph of stack dependencies.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
  /// The underlying graph. Node weight is the stack id.
  graph: DiGraph<String, ()>,

  /// Map from stack id to node index.
  nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
  /// Build the graph from stacks in registration order.
  ///
  /// Validates every reference and each stack's internal wiring. Pure: the
  /// stacks are only read.
  ///
  /// # Errors
  ///
  /// - `DuplicateStack` if two stacks share an id
  /// - `UnknownStackReference` if a reference names an unregistered stack
  /// - `UnknownOutputReference` if a reference names an undeclared output
  /// - `DuplicateResource`, `UnknownOutputSource`, `UnknownInput`,
  ///   `UnknownLocalReference` for stacks that are inconsistent on their own
  pub fn resolve(stacks: &[Stack]) -> Result<Self, GraphError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    // First pass: one node per stack
    for stack in stacks {
      if nodes.contains_key(&stack.id) {
        return Err(GraphError::DuplicateStack(stack.id.clone()));
      }
      let idx = graph.add_node(stack.id.clone());
      nodes.insert(stack.id.clone(), idx);
    }

    let by_id: HashMap<&str, &Stack> = stacks.iter().map(|s| (s.id.as_str(), s)).collect();

    // Second pass: validate and add edges from producer to consumer
    for stack in stacks {
      validate_stack(stack)?;

      let consumer_idx = nodes[&stack.id];
      for reference in stack.references() {
        let Some(producer) = by_id.get(reference.stack.as_str()) else {
          return Err(GraphError::UnknownStackReference {
            consumer: stack.id.clone(),
            stack: reference.stack.clone(),
          });
        };

        if !producer.outputs.contains_key(&reference.output) {
          return Err(GraphError::UnknownOutputReference {
            consumer: stack.id.clone(),
            stack: reference.stack.clone(),
            output: reference.output.clone(),
          });
        }

        // update_edge collapses repeated references into one edge
        graph.update_edge(nodes[&producer.id], consumer_idx, ());
      }
    }

    Ok(Self { graph, nodes })
  }

  /// Number of stacks.
  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// Number of distinct dependency edges.
  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// Stack ids in registration order.
  pub fn stack_ids(&self) -> impl Iterator<Item = &str> {
    self.graph.node_indices().map(|idx| self.graph[idx].as_str())
  }

  /// Whether `consumer` directly depends on `producer`.
  pub fn depends_on(&self, consumer: &str, producer: &str) -> bool {
    match (self.nodes.get(producer), self.nodes.get(consumer)) {
      (Some(&p), Some(&c)) => self.graph.contains_edge(p, c),
      _ => false,
    }
  }

  /// Direct producers of a stack, in registration order.
  pub fn dependencies(&self, stack: &str) -> Vec<&str> {
    self.neighbors(stack, Direction::Incoming)
  }

  /// Direct consumers of a stack, in registration order.
  pub fn dependents(&self, stack: &str) -> Vec<&str> {
    self.neighbors(stack, Direction::Outgoing)
  }

  fn neighbors(&self, stack: &str, direction: Direction) -> Vec<&str> {
    let Some(&idx) = self.nodes.get(stack) else {
      return Vec::new();
    };
    let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
    found.sort();
    found.into_iter().map(|n| self.graph[n].as_str()).collect()
  }

  pub(crate) fn inner(&self) -> &DiGraph<String, ()> {
    &self.graph
  }
}

/// Check a stack's internal wiring: unique resource names, output sources,
/// input reads, and same-stack output reads.
fn validate_stack(stack: &Stack) -> Result<(), GraphError> {
  let mut seen: HashSet<&str> = HashSet::new();
  // Outputs of resources declared so far: (resource, output)
  let mut earlier: BTreeSet<(&str, &str)> = BTreeSet::new();

  for resource in &stack.resources {
    if !seen.insert(resource.name.as_str()) {
      return Err(GraphError::DuplicateResource {
        stack: stack.id.clone(),
        resource: resource.name.clone(),
      });
    }

    for value in resource.properties.values() {
      match value {
        Value::Input(input) if !stack.inputs.contains_key(input) => {
          return Err(GraphError::UnknownInput {
            stack: stack.id.clone(),
            resource: resource.name.clone(),
            input: input.clone(),
          });
        }
        Value::Local {
          resource: source,
          output,
        } if !earlier.contains(&(source.as_str(), output.as_str())) => {
          return Err(GraphError::UnknownLocalReference {
            stack: stack.id.clone(),
            resource: resource.name.clone(),
            source_resource: source.clone(),
            output: output.clone(),
          });
        }
        _ => {}
      }
    }

    for output in &resource.outputs {
      earlier.insert((resource.name.as_str(), output.as_str()));
    }
  }

  for (name, spec) in &stack.outputs {
    if !seen.contains(spec.resource.as_str()) {
      return Err(GraphError::UnknownOutputSource {
        stack: stack.id.clone(),
        output: name.clone(),
        resource: spec.resource.clone(),
      });
    }
  }

  Ok(())
}
