//! Resource descriptors: the declared shape of one provisionable unit.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::util::hash::Hashable;

use super::value::{Reference, Value};

/// One provisionable unit within a stack.
///
/// Immutable once its stack is registered with a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
  /// Backend-specific kind, e.g. `network.vpc`.
  pub kind: String,
  /// Unique within the owning stack.
  pub name: String,
  /// Declared properties; may contain unresolved references.
  pub properties: BTreeMap<String, Value>,
  /// Names of the values the backend returns on success.
  pub outputs: BTreeSet<String>,
  /// Left in place when the owning stack is destroyed.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub retain: bool,
}

impl Hashable for ResourceDescriptor {}

impl ResourceDescriptor {
  pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      kind: kind.into(),
      name: name.into(),
      properties: BTreeMap::new(),
      outputs: BTreeSet::new(),
      retain: false,
    }
  }

  /// Add a property.
  pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.properties.insert(key.into(), value.into());
    self
  }

  /// Declare an output produced by the backend.
  pub fn output(mut self, name: impl Into<String>) -> Self {
    self.outputs.insert(name.into());
    self
  }

  /// Keep the resource when its stack is destroyed. Destroy drops the
  /// record without asking the backend to delete it.
  pub fn retain_on_destroy(mut self) -> Self {
    self.retain = true;
    self
  }

  /// Cross-stack references appearing in this resource's properties.
  pub fn references(&self) -> impl Iterator<Item = &Reference> {
    self.properties.values().filter_map(|value| match value {
      Value::Ref(reference) => Some(reference),
      _ => None,
    })
  }
}
