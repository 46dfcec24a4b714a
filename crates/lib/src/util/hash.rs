//! Content fingerprints for change detection.
//!
//! A resource is re-submitted to the backend only when its fingerprint
//! changes. The fingerprint is a truncated SHA-256 of the JSON-serialized
//! value, so any field that participates in serialization participates in
//! change detection.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::FINGERPRINT_LEN;

pub type HashError = serde_json::Error;

/// A truncated SHA-256 over a serialized value.
///
/// # Format
///
/// Lowercase hexadecimal, [`FINGERPRINT_LEN`] characters, e.g. `"a1b2c3d4e5f6789012ab"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<Fingerprint, HashError> {
    let serialized = serde_json::to_string(self)?;
    Ok(Fingerprint(hash_str(&serialized, FINGERPRINT_LEN)))
  }
}

/// Hex SHA-256 of `input`, truncated to `len` characters.
pub fn hash_str(input: &str, len: usize) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input.as_bytes());
  let full = hex::encode(hasher.finalize());
  full[..len.min(full.len())].to_string()
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use super::*;

  #[derive(Serialize)]
  struct Sample {
    name: String,
    props: BTreeMap<String, i64>,
  }

  impl Hashable for Sample {}

  #[test]
  fn fingerprint_is_truncated_hex() {
    let sample = Sample {
      name: "vpc".to_string(),
      props: BTreeMap::new(),
    };
    let hash = sample.compute_hash().unwrap();
    assert_eq!(hash.0.len(), FINGERPRINT_LEN);
    assert!(hash.0.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn fingerprint_tracks_content() {
    let mut props = BTreeMap::new();
    props.insert("port".to_string(), 8081);
    let a = Sample {
      name: "listener".to_string(),
      props: props.clone(),
    };
    props.insert("port".to_string(), 443);
    let b = Sample {
      name: "listener".to_string(),
      props,
    };
    assert_ne!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
  }

  #[test]
  fn hash_str_is_stable() {
    assert_eq!(hash_str("network/vpc", 8), hash_str("network/vpc", 8));
    assert_eq!(hash_str("network/vpc", 8).len(), 8);
  }
}
