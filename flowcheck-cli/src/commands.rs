use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a flow (and optionally an environment) without sending requests.
    Validate {
        path: PathBuf,
        #[arg(long)]
        env: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the dependency levels and unbound variables of a flow.
    Plan {
        path: PathBuf,
        #[command(flatten)]
        env: EnvArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Execute a flow and record the run.
    Run {
        path: PathBuf,
        #[command(flatten)]
        env: EnvArgs,
        #[command(flatten)]
        exec: ExecArgs,
        /// Stream engine events to stdout as JSON lines.
        #[arg(long)]
        events: bool,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// List recorded runs of a flow, newest first.
    History {
        flow_id: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Re-send the last recorded request of a step and diff the responses.
    Replay {
        flow_id: String,
        step_id: String,
        /// Persist the diff.
        #[arg(long)]
        save: bool,
        #[command(flatten)]
        exec: ExecArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
    Migrate {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, default_value_t = 5)]
        max_connections: u32,
        #[command(flatten)]
        output: OutputArgs,
    },
}
