use std::time::Duration;

use flowcheck_core::{parse_environment_str, DocumentFormat, Environment};
use flowcheck_exec::{ExecutorConfig, RunOptions};

use crate::output::print_error;
use crate::utils::read_file;
use crate::{EnvArgs, ExecArgs, OutputArgs};

/// Environment from `--env`, then `--base-url` and `--var` overrides.
///
/// Returns `Ok(None)` when neither a file nor a base URL was given.
pub fn load_environment(args: &EnvArgs, output: &OutputArgs) -> Result<Option<Environment>, ()> {
    let mut env = match &args.env {
        Some(path) => {
            let content = read_file(path, output).ok_or(())?;
            match parse_environment_str(&content, DocumentFormat::Auto) {
                Ok(p) => Some(p.value),
                Err(e) => {
                    print_error(
                        output.format,
                        output.quiet,
                        &format!("invalid environment {}: {e}", path.display()),
                    );
                    return Err(());
                }
            }
        }
        None => None,
    };

    if let Some(base) = &args.base_url {
        match env.as_mut() {
            Some(e) => e.base_url = base.clone(),
            None => env = Some(Environment::new("cli", base.clone())),
        }
    }

    if !args.vars.is_empty() {
        let Some(e) = env.as_mut() else {
            print_error(output.format, output.quiet, "--var needs --env or --base-url");
            return Err(());
        };
        for v in &args.vars {
            let Some((k, val)) = v.split_once('=') else {
                print_error(
                    output.format,
                    output.quiet,
                    &format!("invalid --var `{v}` (expected KEY=VALUE)"),
                );
                return Err(());
            };
            e.variables.insert(k.trim().to_string(), val.to_string());
        }
    }

    if let Some(e) = env.as_mut() {
        if e.environment_id.is_empty() {
            e.environment_id = "cli".to_string();
        }
    }
    Ok(env)
}

pub fn build_executor_config(exec: &ExecArgs) -> ExecutorConfig {
    ExecutorConfig {
        max_concurrency: exec.max_concurrency.max(1),
        default_step_timeout: Duration::from_millis(exec.timeout),
        run_deadline: exec.deadline.map(Duration::from_millis),
        max_response_bytes: exec.max_response_bytes,
        random_seed: exec.seed,
        ..ExecutorConfig::default()
    }
}

pub fn run_options(exec: &ExecArgs) -> RunOptions {
    RunOptions {
        failure_policy: exec.policy,
        continue_after_errors: exec.continue_after_errors,
        ..RunOptions::default()
    }
}
