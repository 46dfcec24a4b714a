//! The run state tracker.
//!
//! The executor is the only writer. Every write goes straight through to
//! disk when the tracker is file-backed, so a run that dies mid-stack can be
//! resumed by a later process.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::consts::STATE_VERSION;
use crate::stack::Outputs;

use super::types::{ResourceRecord, ResourceStatus, RunRecord, StateError};

/// Tracks which resources have been provisioned, and the outputs of
/// completed stacks.
#[derive(Debug, Clone, Default)]
pub struct RunStateTracker {
  record: RunRecord,
  /// Backing file; `None` for an in-memory tracker.
  path: Option<PathBuf>,
}

impl RunStateTracker {
  /// A tracker that only lives as long as this process.
  pub fn in_memory() -> Self {
    Self::default()
  }

  /// Open a durable tracker backed by `path`.
  ///
  /// A missing file is an empty record. A corrupt file or one written by a
  /// different format version is an error.
  pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
    let path = path.into();

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no run state file, starting empty");
        return Ok(Self {
          record: RunRecord::default(),
          path: Some(path),
        });
      }
      Err(source) => return Err(StateError::Read { path, source }),
    };

    let record: RunRecord = serde_json::from_str(&content).map_err(|source| StateError::Parse {
      path: path.clone(),
      source,
    })?;

    if record.version != STATE_VERSION {
      return Err(StateError::UnsupportedVersion(record.version));
    }

    info!(
      path = %path.display(),
      resources = record.resource_count(),
      "loaded run state"
    );

    Ok(Self {
      record,
      path: Some(path),
    })
  }

  /// Backing file, if durable.
  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  /// The full record, for reporting.
  pub fn record(&self) -> &RunRecord {
    &self.record
  }

  /// Status of a resource; `Pending` if never attempted.
  pub fn status(&self, stack: &str, resource: &str) -> ResourceStatus {
    self
      .get(stack, resource)
      .map(|r| r.status)
      .unwrap_or(ResourceStatus::Pending)
  }

  pub fn get(&self, stack: &str, resource: &str) -> Option<&ResourceRecord> {
    self.record.stacks.get(stack)?.resources.get(resource)
  }

  /// Record the outcome of a backend call for one resource.
  pub fn put(&mut self, stack: &str, resource: &str, record: ResourceRecord) -> Result<(), StateError> {
    debug!(stack, resource, status = %record.status, "recording resource state");
    self
      .record
      .stacks
      .entry(stack.to_string())
      .or_default()
      .resources
      .insert(resource.to_string(), record);
    self.persist()
  }

  /// Drop a resource record after it has been deleted.
  pub fn remove(&mut self, stack: &str, resource: &str) -> Result<(), StateError> {
    let removed = self
      .record
      .stacks
      .get_mut(stack)
      .and_then(|s| s.resources.remove(resource))
      .is_some();
    if removed {
      self.persist()?;
    }
    Ok(())
  }

  /// Record the resolved outputs of a fully provisioned stack.
  pub fn complete_stack(&mut self, stack: &str, outputs: Outputs) -> Result<(), StateError> {
    debug!(stack, outputs = outputs.len(), "recording stack outputs");
    self.record.stacks.entry(stack.to_string()).or_default().outputs = Some(outputs);
    self.persist()
  }

  /// Outputs of a completed stack; `None` if the stack has not completed.
  pub fn outputs_of(&self, stack: &str) -> Option<&Outputs> {
    self.record.stacks.get(stack)?.outputs.as_ref()
  }

  /// Mark a stack incomplete after one of its resources failed.
  pub fn invalidate_stack(&mut self, stack: &str) -> Result<(), StateError> {
    let Some(entry) = self.record.stacks.get_mut(stack) else {
      return Ok(());
    };
    if entry.outputs.take().is_some() {
      debug!(stack, "cleared outputs of incomplete stack");
      self.persist()?;
    }
    Ok(())
  }

  /// Remove a stack's outputs and, if it has no resources left, the stack.
  pub fn forget_stack(&mut self, stack: &str) -> Result<(), StateError> {
    let Some(entry) = self.record.stacks.get_mut(stack) else {
      return Ok(());
    };
    entry.outputs = None;
    if entry.resources.is_empty() {
      self.record.stacks.remove(stack);
    }
    self.persist()
  }

  /// Copy the live record next to itself as `<stem>.last.json`.
  ///
  /// Returns the archive path, or `None` for an in-memory tracker.
  pub fn archive(&self) -> Result<Option<PathBuf>, StateError> {
    let Some(path) = &self.path else {
      return Ok(None);
    };
    let archive = archive_path(path);
    write_atomic(&archive, &self.record)?;
    info!(path = %archive.display(), "archived run state");
    Ok(Some(archive))
  }

  fn persist(&self) -> Result<(), StateError> {
    match &self.path {
      Some(path) => write_atomic(path, &self.record),
      None => Ok(()),
    }
  }
}

fn archive_path(path: &Path) -> PathBuf {
  let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("state");
  path.with_file_name(format!("{}.last.json", stem))
}

/// Write to a temp file, then rename over the target.
fn write_atomic(path: &Path, record: &RunRecord) -> Result<(), StateError> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).map_err(StateError::CreateDir)?;
  }

  let content = serde_json::to_string_pretty(record).map_err(StateError::Serialize)?;

  let mut temp_name = path.as_os_str().to_owned();
  temp_name.push(".tmp");
  let temp_path = PathBuf::from(temp_name);

  fs::write(&temp_path, &content).map_err(|source| StateError::Write {
    path: temp_path.clone(),
    source,
  })?;
  fs::rename(&temp_path, path).map_err(|source| StateError::Write {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(())
}
