//! Property values and cross-stack references.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A fully resolved value, as handed to a backend and recorded in run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Null,
  Bool(bool),
  Int(i64),
  String(String),
  List(Vec<Scalar>),
}

impl Scalar {
  /// Returns the string content, if this is a string.
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Scalar::String(s) => Some(s),
      _ => None,
    }
  }
}

impl fmt::Display for Scalar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scalar::Null => write!(f, "null"),
      Scalar::Bool(b) => write!(f, "{}", b),
      Scalar::Int(i) => write!(f, "{}", i),
      Scalar::String(s) => write!(f, "{}", s),
      Scalar::List(items) => {
        write!(f, "[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}", item)?;
        }
        write!(f, "]")
      }
    }
  }
}

impl From<&str> for Scalar {
  fn from(value: &str) -> Self {
    Scalar::String(value.to_string())
  }
}

impl From<String> for Scalar {
  fn from(value: String) -> Self {
    Scalar::String(value)
  }
}

impl From<i64> for Scalar {
  fn from(value: i64) -> Self {
    Scalar::Int(value)
  }
}

impl From<u16> for Scalar {
  fn from(value: u16) -> Self {
    Scalar::Int(i64::from(value))
  }
}

impl From<u32> for Scalar {
  fn from(value: u32) -> Self {
    Scalar::Int(i64::from(value))
  }
}

impl From<bool> for Scalar {
  fn from(value: bool) -> Self {
    Scalar::Bool(value)
  }
}

/// Resolved output values keyed by output name.
pub type Outputs = BTreeMap<String, Scalar>;

/// A pointer from a consumer to a producing stack's named output.
///
/// Purely relational: the consumer never owns the producer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Reference {
  /// Id of the producing stack.
  pub stack: String,
  /// Name of an output declared by the producing stack.
  pub output: String,
}

impl Reference {
  pub fn new(stack: impl Into<String>, output: impl Into<String>) -> Self {
    Self {
      stack: stack.into(),
      output: output.into(),
    }
  }
}

impl fmt::Display for Reference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.stack, self.output)
  }
}

/// A declared property value, resolved to a [`Scalar`] at provisioning time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
  /// A literal value.
  Literal(Scalar),
  /// Another stack's output. Counts as a stack dependency.
  Ref(Reference),
  /// One of the owning stack's declared inputs.
  Input(String),
  /// An output of an earlier resource in the same stack.
  Local { resource: String, output: String },
}

impl Value {
  pub fn input(name: impl Into<String>) -> Self {
    Value::Input(name.into())
  }

  pub fn local(resource: impl Into<String>, output: impl Into<String>) -> Self {
    Value::Local {
      resource: resource.into(),
      output: output.into(),
    }
  }
}

impl From<Scalar> for Value {
  fn from(value: Scalar) -> Self {
    Value::Literal(value)
  }
}

macro_rules! literal_from {
  ($($ty:ty),*) => {
    $(
      impl From<$ty> for Value {
        fn from(value: $ty) -> Self {
          Value::Literal(Scalar::from(value))
        }
      }
    )*
  };
}

literal_from!(&str, String, i64, u16, u32, bool);

impl From<Reference> for Value {
  fn from(value: Reference) -> Self {
    Value::Ref(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scalar_serializes_untagged() {
    let mut outputs = Outputs::new();
    outputs.insert("vpc_id".to_string(), Scalar::from("vpc-1234"));
    outputs.insert("azs".to_string(), Scalar::Int(2));
    outputs.insert("public".to_string(), Scalar::Bool(true));
    let json = serde_json::to_string(&outputs).unwrap();
    assert_eq!(json, r#"{"azs":2,"public":true,"vpc_id":"vpc-1234"}"#);

    let parsed: Outputs = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, outputs);
  }

  #[test]
  fn scalar_display() {
    let list = Scalar::List(vec![Scalar::from("a"), Scalar::Int(1), Scalar::Null]);
    assert_eq!(list.to_string(), "[a, 1, null]");
  }

  #[test]
  fn reference_display() {
    assert_eq!(Reference::new("network", "net_id").to_string(), "network.net_id");
  }

  #[test]
  fn value_from_literals() {
    assert_eq!(Value::from("x"), Value::Literal(Scalar::String("x".to_string())));
    assert_eq!(Value::from(8081u16), Value::Literal(Scalar::Int(8081)));
    assert_eq!(
      Value::from(Reference::new("cluster", "lb_handle")),
      Value::Ref(Reference::new("cluster", "lb_handle"))
    );
  }
}
