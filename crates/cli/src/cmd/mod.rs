mod apply;
mod destroy;
mod plan;
mod status;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use stackup_lib::backend::LocalBackend;
use stackup_lib::composition::Composition;
use stackup_lib::execute::ExecuteConfig;
use stackup_lib::platform::paths;
use stackup_lib::state::RunStateTracker;
use stackup_lib::topology::{TopologyConfig, assemble};

pub use apply::cmd_apply;
pub use destroy::cmd_destroy;
pub use plan::cmd_plan;
pub use status::cmd_status;

/// Resolved options for apply and destroy.
pub struct RunOptions {
  pub config: Option<PathBuf>,
  pub state: Option<PathBuf>,
  pub backend_dir: Option<PathBuf>,
  pub timeout: Duration,
}

/// Everything a run needs, opened and ready.
struct Session {
  composition: Composition,
  tracker: RunStateTracker,
  backend: LocalBackend,
  execute: ExecuteConfig,
}

impl RunOptions {
  fn open(&self) -> Result<Session> {
    let composition = load_composition(self.config.as_deref())?;

    let state_path = state_path(self.state.clone());
    let tracker = RunStateTracker::open(&state_path)
      .with_context(|| format!("Failed to open run state: {}", state_path.display()))?;

    let backend_dir = self.backend_dir.clone().unwrap_or_else(paths::backend_dir);
    debug!(state = %state_path.display(), backend = %backend_dir.display(), "opened session");

    Ok(Session {
      composition,
      tracker,
      backend: LocalBackend::new(backend_dir),
      execute: ExecuteConfig {
        backend_timeout: self.timeout,
        ..ExecuteConfig::default()
      },
    })
  }
}

/// Load the topology config (or the defaults) and build its stacks.
fn load_composition(config: Option<&Path>) -> Result<Composition> {
  let topology = TopologyConfig::load_or_default(config).context("Failed to load config")?;
  assemble(&topology).context("Invalid topology")
}

fn state_path(flag: Option<PathBuf>) -> PathBuf {
  flag.unwrap_or_else(paths::state_path)
}

/// Build a runtime whose ctrl-c handler cancels the run between stacks.
fn runtime(execute: &ExecuteConfig) -> Result<tokio::runtime::Runtime> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let cancel = execute.cancel.clone();
  rt.spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      cancel.cancel();
    }
  });
  Ok(rt)
}
