//! Stacks: the unit of dependency and of apply/destroy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::resource::ResourceDescriptor;
use super::value::{Reference, Scalar};

/// How a stack input is bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackInput {
  /// Bound to another stack's output; creates a dependency edge.
  Ref(Reference),
  /// A fixed value.
  Literal(Scalar),
}

/// Which resource output becomes a stack output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
  pub resource: String,
  pub output: String,
}

impl OutputSpec {
  pub fn new(resource: impl Into<String>, output: impl Into<String>) -> Self {
    Self {
      resource: resource.into(),
      output: output.into(),
    }
  }
}

/// A named, ordered collection of resources with declared inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
  /// Globally unique id.
  pub id: String,
  /// Resources in apply order; destroyed in reverse.
  pub resources: Vec<ResourceDescriptor>,
  pub inputs: BTreeMap<String, StackInput>,
  pub outputs: BTreeMap<String, OutputSpec>,
}

impl Stack {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      resources: Vec::new(),
      inputs: BTreeMap::new(),
      outputs: BTreeMap::new(),
    }
  }

  /// Bind an input to another stack's output.
  pub fn input_ref(mut self, name: impl Into<String>, reference: Reference) -> Self {
    self.inputs.insert(name.into(), StackInput::Ref(reference));
    self
  }

  /// Bind an input to a literal value.
  pub fn input_literal(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
    self.inputs.insert(name.into(), StackInput::Literal(value.into()));
    self
  }

  pub fn resource(mut self, resource: ResourceDescriptor) -> Self {
    self.resources.push(resource);
    self
  }

  /// Expose `resource.output` as the stack output `name`.
  pub fn output(mut self, name: impl Into<String>, resource: impl Into<String>, output: impl Into<String>) -> Self {
    self.outputs.insert(name.into(), OutputSpec::new(resource, output));
    self
  }

  pub fn find_resource(&self, name: &str) -> Option<&ResourceDescriptor> {
    self.resources.iter().find(|r| r.name == name)
  }

  /// Every cross-stack reference made by this stack, from inputs and from
  /// resource properties. May contain duplicates.
  pub fn references(&self) -> Vec<&Reference> {
    let from_inputs = self.inputs.values().filter_map(|input| match input {
      StackInput::Ref(reference) => Some(reference),
      StackInput::Literal(_) => None,
    });
    let from_properties = self.resources.iter().flat_map(ResourceDescriptor::references);
    from_inputs.chain(from_properties).collect()
  }
}
