//! Run record types and their errors.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::STATE_VERSION;
use crate::stack::Outputs;
use crate::util::hash::Fingerprint;

/// Provisioning status of a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
  Pending,
  Provisioned,
  Failed,
}

impl std::fmt::Display for ResourceStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ResourceStatus::Pending => write!(f, "pending"),
      ResourceStatus::Provisioned => write!(f, "provisioned"),
      ResourceStatus::Failed => write!(f, "failed"),
    }
  }
}

/// What is known about one `(stack, resource)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
  pub status: ResourceStatus,
  /// Values returned by the backend on the last successful call.
  #[serde(default)]
  pub outputs: Outputs,
  /// Fingerprint of the descriptor and resolved properties last submitted.
  #[serde(default)]
  pub fingerprint: Option<Fingerprint>,
  /// Unix seconds of the last backend call for this resource.
  pub last_attempt: u64,
  #[serde(default)]
  pub last_error: Option<String>,
}

impl ResourceRecord {
  pub fn provisioned(outputs: Outputs, fingerprint: Fingerprint) -> Self {
    Self {
      status: ResourceStatus::Provisioned,
      outputs,
      fingerprint: Some(fingerprint),
      last_attempt: now_unix(),
      last_error: None,
    }
  }

  pub fn failed(error: impl Into<String>, fingerprint: Option<Fingerprint>) -> Self {
    Self {
      status: ResourceStatus::Failed,
      outputs: Outputs::new(),
      fingerprint,
      last_attempt: now_unix(),
      last_error: Some(error.into()),
    }
  }
}

/// Per-stack portion of a run record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackRecord {
  #[serde(default)]
  pub resources: BTreeMap<String, ResourceRecord>,
  /// Resolved stack outputs; present only once every resource is provisioned.
  #[serde(default)]
  pub outputs: Option<Outputs>,
}

/// The whole run record as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
  pub version: u32,
  #[serde(default)]
  pub stacks: BTreeMap<String, StackRecord>,
}

impl Default for RunRecord {
  fn default() -> Self {
    Self {
      version: STATE_VERSION,
      stacks: BTreeMap::new(),
    }
  }
}

impl RunRecord {
  pub fn is_empty(&self) -> bool {
    self.stacks.values().all(|s| s.resources.is_empty() && s.outputs.is_none())
  }

  /// Number of resource records across all stacks.
  pub fn resource_count(&self) -> usize {
    self.stacks.values().map(|s| s.resources.len()).sum()
  }
}

/// Errors that can occur when loading or persisting run state.
#[derive(Debug, Error)]
pub enum StateError {
  /// Failed to read the state file.
  #[error("failed to read run state {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to write the state file.
  #[error("failed to write run state {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to create the state directory.
  #[error("failed to create run state directory: {0}")]
  CreateDir(#[source] io::Error),

  /// Failed to parse the state file.
  #[error("failed to parse run state {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// Failed to serialize the state.
  #[error("failed to serialize run state: {0}")]
  Serialize(#[source] serde_json::Error),

  /// State file written by an incompatible version.
  #[error("unsupported run state version: {0}")]
  UnsupportedVersion(u32),
}

pub(crate) fn now_unix() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_secs()
}
