use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;
mod utils;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "flowcheck", version, about = "Run, replay and diff multi-step HTTP API test flows")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Validate { path, env, output } => {
            cmd::validate::validate_cmd(&path, env.as_deref(), output).await
        }
        Command::Plan { path, env, output } => cmd::plan::plan_cmd(&path, env, output).await,
        Command::Run {
            path,
            env,
            exec,
            events,
            output,
            store,
        } => cmd::run::run_cmd(&path, env, exec, events, output, store).await,
        Command::History {
            flow_id,
            limit,
            output,
            store,
        } => cmd::history::history_cmd(&flow_id, limit, output, store).await,
        Command::Replay {
            flow_id,
            step_id,
            save,
            exec,
            output,
            store,
        } => cmd::replay::replay_cmd(&flow_id, &step_id, save, exec, output, store).await,
        Command::Migrate {
            store,
            max_connections,
            output,
        } => cmd::migrate::migrate_cmd(store, max_connections, output).await,
    }
}
