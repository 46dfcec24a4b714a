//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the topology config
/// and the data directory (run state and local backend).
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// Create from a fixture file, copied to `topology.toml`.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("topology.toml");
    std::fs::write(&config_path, fixture_content(name)).unwrap();
    Self { temp, config_path }
  }

  /// Create an environment with no config file; commands use the defaults.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("topology.toml");
    Self { temp, config_path }
  }

  /// Data path for run state and the local backend.
  pub fn data_path(&self) -> PathBuf {
    let p = self.temp.path().join("data");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn state_path(&self) -> PathBuf {
    self.data_path().join("state.json")
  }

  /// Stored document for one resource in the local backend.
  pub fn backend_document(&self, stack: &str, resource: &str) -> PathBuf {
    self.data_path().join("backend").join(stack).join(format!("{}.json", resource))
  }

  /// Read the live run record as JSON.
  pub fn read_state(&self) -> serde_json::Value {
    let content = std::fs::read_to_string(self.state_path()).unwrap();
    serde_json::from_str(&content).unwrap()
  }

  /// Get a pre-configured Command for the stackup binary.
  ///
  /// Sets `STACKUP_DATA_DIR` to the isolated data path and clears `RUST_LOG`.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("stackup");
    cmd.env("STACKUP_DATA_DIR", self.data_path());
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
