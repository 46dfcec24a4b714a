//! Value resolution during apply.
//!
//! A [`StackResolver`] turns the declared [`Value`]s of one stack's
//! resources into concrete [`Scalar`]s. It knows about:
//! - Outputs of producer stacks, read from run state when the stack starts
//! - The stack's inputs
//! - Outputs of resources earlier in the same stack, pushed as they complete

use std::collections::BTreeMap;

use crate::stack::{Outputs, Reference, ResourceDescriptor, Scalar, Stack, StackInput, Value};
use crate::state::RunStateTracker;

use super::types::ExecuteError;

/// Trait for resolving the three kinds of indirect value.
pub trait Resolver {
  /// Resolve another stack's output.
  fn resolve_reference(&self, reference: &Reference) -> Result<&Scalar, ExecuteError>;

  /// Resolve one of the current stack's inputs.
  fn resolve_input(&self, name: &str) -> Result<&Scalar, ExecuteError>;

  /// Resolve an output of an earlier resource in the current stack.
  fn resolve_local(&self, resource: &str, output: &str) -> Result<&Scalar, ExecuteError>;

  /// Resolve any value.
  fn resolve(&self, value: &Value) -> Result<Scalar, ExecuteError> {
    match value {
      Value::Literal(scalar) => Ok(scalar.clone()),
      Value::Ref(reference) => self.resolve_reference(reference).cloned(),
      Value::Input(name) => self.resolve_input(name).cloned(),
      Value::Local { resource, output } => self.resolve_local(resource, output).cloned(),
    }
  }
}

/// Resolver for one stack's apply.
///
/// Producer outputs are copied out of the tracker up front, so the resolver
/// does not hold a borrow on it while the executor records progress.
#[derive(Debug)]
pub struct StackResolver {
  stack: String,

  /// Outputs of every producer stack this stack references.
  upstream: BTreeMap<String, Outputs>,

  /// Resolved stack inputs.
  inputs: BTreeMap<String, Scalar>,

  /// Outputs of resources provisioned so far in this stack.
  local: BTreeMap<String, Outputs>,
}

impl StackResolver {
  /// Create a resolver for `stack`.
  ///
  /// # Errors
  ///
  /// `UnresolvedReference` if a producer has not completed or its recorded
  /// outputs lack a referenced name.
  pub fn new(stack: &Stack, tracker: &RunStateTracker) -> Result<Self, ExecuteError> {
    let mut upstream: BTreeMap<String, Outputs> = BTreeMap::new();

    for reference in stack.references() {
      if upstream.contains_key(&reference.stack) {
        continue;
      }
      let outputs = tracker
        .outputs_of(&reference.stack)
        .ok_or_else(|| ExecuteError::UnresolvedReference {
          stack: stack.id.clone(),
          reference: reference.clone(),
        })?;
      upstream.insert(reference.stack.clone(), outputs.clone());
    }

    let mut resolver = Self {
      stack: stack.id.clone(),
      upstream,
      inputs: BTreeMap::new(),
      local: BTreeMap::new(),
    };

    for (name, input) in &stack.inputs {
      let value = match input {
        StackInput::Literal(scalar) => scalar.clone(),
        StackInput::Ref(reference) => resolver.resolve_reference(reference)?.clone(),
      };
      resolver.inputs.insert(name.clone(), value);
    }

    Ok(resolver)
  }

  /// The resolved stack inputs.
  pub fn inputs(&self) -> &BTreeMap<String, Scalar> {
    &self.inputs
  }

  /// Resolve every property of a resource.
  pub fn resolve_properties(&self, resource: &ResourceDescriptor) -> Result<BTreeMap<String, Scalar>, ExecuteError> {
    resource
      .properties
      .iter()
      .map(|(key, value)| Ok((key.clone(), self.resolve(value)?)))
      .collect()
  }

  /// Record the outputs of a resource that just completed.
  pub fn push_outputs(&mut self, resource: &str, outputs: Outputs) {
    self.local.insert(resource.to_string(), outputs);
  }

  /// Assemble the stack's declared outputs from its resources' outputs.
  ///
  /// # Errors
  ///
  /// `UnresolvedOutput` if the source resource did not return the value.
  pub fn stack_outputs(&self, stack: &Stack) -> Result<Outputs, ExecuteError> {
    stack
      .outputs
      .iter()
      .map(|(name, spec)| {
        let value = self
          .local
          .get(&spec.resource)
          .and_then(|outputs| outputs.get(&spec.output))
          .ok_or_else(|| ExecuteError::UnresolvedOutput {
            stack: stack.id.clone(),
            output: name.clone(),
          })?;
        Ok((name.clone(), value.clone()))
      })
      .collect()
  }
}

impl Resolver for StackResolver {
  fn resolve_reference(&self, reference: &Reference) -> Result<&Scalar, ExecuteError> {
    self
      .upstream
      .get(&reference.stack)
      .and_then(|outputs| outputs.get(&reference.output))
      .ok_or_else(|| ExecuteError::UnresolvedReference {
        stack: self.stack.clone(),
        reference: reference.clone(),
      })
  }

  fn resolve_input(&self, name: &str) -> Result<&Scalar, ExecuteError> {
    self.inputs.get(name).ok_or_else(|| ExecuteError::UnresolvedInput {
      stack: self.stack.clone(),
      input: name.to_string(),
    })
  }

  fn resolve_local(&self, resource: &str, output: &str) -> Result<&Scalar, ExecuteError> {
    self
      .local
      .get(resource)
      .and_then(|outputs| outputs.get(output))
      .ok_or_else(|| ExecuteError::UnresolvedLocal {
        stack: self.stack.clone(),
        resource: resource.to_string(),
        output: output.to_string(),
      })
  }
}
