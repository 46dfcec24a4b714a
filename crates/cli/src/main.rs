mod cmd;
mod output;
mod prompts;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// stackup - compose stacks and deploy them in dependency order
#[derive(Parser)]
#[command(name = "stackup")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

/// Options shared by apply and destroy.
#[derive(Args)]
struct RunArgs {
  /// Topology config file (TOML). Built-in defaults when omitted.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Run state file [default: $STACKUP_DATA_DIR/state.json]
  #[arg(long)]
  state: Option<PathBuf>,

  /// Directory of the local provisioning backend [default: $STACKUP_DATA_DIR/backend]
  #[arg(long)]
  backend_dir: Option<PathBuf>,

  /// Upper bound on a single backend call, e.g. `30s` or `5m`
  #[arg(long, value_parser = humantime::parse_duration, default_value = "5m")]
  timeout: Duration,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the deployment order without provisioning anything
  Plan {
    /// Topology config file (TOML). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
  },

  /// Provision every stack in dependency order, resuming a previous run
  Apply(RunArgs),

  /// Delete every stack in reverse dependency order
  Destroy {
    #[command(flatten)]
    run: RunArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    force: bool,
  },

  /// Show recorded run state
  Status {
    /// Run state file [default: $STACKUP_DATA_DIR/state.json]
    #[arg(long)]
    state: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Plan { config } => cmd::cmd_plan(config.as_deref(), cli.output),
    Commands::Apply(run) => cmd::cmd_apply(&run.into(), cli.output),
    Commands::Destroy { run, force } => cmd::cmd_destroy(&run.into(), force, cli.output),
    Commands::Status { state } => cmd::cmd_status(state, cli.verbose, cli.output),
  }
}

impl From<RunArgs> for cmd::RunOptions {
  fn from(args: RunArgs) -> Self {
    cmd::RunOptions {
      config: args.config,
      state: args.state,
      backend_dir: args.backend_dir,
      timeout: args.timeout,
    }
  }
}
