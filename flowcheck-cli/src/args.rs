use std::path::PathBuf;

use clap::Args;
use flowcheck_core::FailurePolicy;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct StoreArgs {
    /// Postgres URL. Falls back to FLOWCHECK_DATABASE_URL, then DATABASE_URL.
    #[arg(long)]
    pub store: Option<String>,
}

/// Where requests go and which variables seed the run.
#[derive(Debug, Args, Clone, Default)]
pub struct EnvArgs {
    /// Environment file (JSON or YAML).
    #[arg(long)]
    pub env: Option<PathBuf>,
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ExecArgs {
    #[arg(long, default_value_t = 8)]
    pub max_concurrency: usize,
    /// Default per-step timeout in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    pub timeout: u64,
    /// Wall-clock budget for the whole run, in milliseconds.
    #[arg(long)]
    pub deadline: Option<u64>,
    #[arg(long, default_value_t = 4_194_304)]
    pub max_response_bytes: usize,
    /// Overrides the flow's own failure policy.
    #[arg(long, value_parser = parse_policy)]
    pub policy: Option<FailurePolicy>,
    /// Run successors of steps that errored (network, timeout).
    #[arg(long)]
    pub continue_after_errors: bool,
    /// Seed for `$randomInt`.
    #[arg(long)]
    pub seed: Option<u64>,
}

fn parse_policy(s: &str) -> Result<FailurePolicy, String> {
    s.parse()
}
