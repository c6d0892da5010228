use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use flowcheck_core::{parse_flow_str, validate_environment, DocumentFormat};
use flowcheck_exec::executor::{CompositeEventSink, StdoutEventSink, TracingEventSink};
use flowcheck_exec::{ExecutionError, FlowService, ReqwestHttpClient, ServiceError};
use flowcheck_store::{FlowRun, InMemoryStore, StateStore, StepState};
use tokio_util::sync::CancellationToken;

use crate::cmd::config::{build_executor_config, load_environment, run_options};
use crate::exit_codes;
use crate::output::{print_error, print_result, print_text};
use crate::utils::{connect_store, get_database_url, read_file};
use crate::{EnvArgs, ExecArgs, OutputArgs, StoreArgs};

pub async fn run_cmd(
    path: &Path,
    env_args: EnvArgs,
    exec: ExecArgs,
    events: bool,
    output: OutputArgs,
    store: StoreArgs,
) -> i32 {
    let Some(content) = read_file(path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let flow = match parse_flow_str(&content, DocumentFormat::Auto) {
        Ok(p) => p.value,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };
    let env = match load_environment(&env_args, &output) {
        Ok(Some(env)) => env,
        Ok(None) => {
            print_error(output.format, output.quiet, "no environment (use --env or --base-url)");
            return exit_codes::RUNTIME_ERROR;
        }
        Err(()) => return exit_codes::RUNTIME_ERROR,
    };
    if let Err(err) = validate_environment(&env) {
        for v in &err.violations {
            print_error(output.format, output.quiet, &format!("env: {v}"));
        }
        return exit_codes::VALIDATION_FAILED;
    }

    let state: Arc<dyn StateStore> = if get_database_url(&store).is_some() {
        match connect_store(&store, 5, &output).await {
            Some(pg) => Arc::new(pg),
            None => return exit_codes::RUNTIME_ERROR,
        }
    } else {
        Arc::new(InMemoryStore::new())
    };
    if let Err(e) = state.save_flow(&flow).await {
        print_error(output.format, output.quiet, &format!("failed to save flow: {e}"));
        return exit_codes::RUNTIME_ERROR;
    }
    if let Err(e) = state.save_environment(&env).await {
        print_error(output.format, output.quiet, &format!("failed to save environment: {e}"));
        return exit_codes::RUNTIME_ERROR;
    }

    let http = match ReqwestHttpClient::new() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };
    let mut sinks = CompositeEventSink::new();
    sinks.add(Arc::new(TracingEventSink));
    if events {
        sinks.add(Arc::new(StdoutEventSink));
    }

    tracing::info!(flow_id = %flow.flow_id, base_url = %env.base_url, "starting run");
    let service = FlowService::new(build_executor_config(&exec), state, http, Arc::new(sinks));

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });
    let mut options = run_options(&exec);
    options.cancel = Some(cancel);

    match service.run_loaded(&flow, &env, options).await {
        Ok(run) => {
            if !print_text(output.format, output.quiet, &render_run(&run)) {
                print_result(output.format, output.quiet, &run);
            }
            exit_codes::for_status(run.status)
        }
        Err(ServiceError::Execution(ExecutionError::Validation(v))) => {
            print_error(output.format, output.quiet, &format!("{v}"));
            for violation in &v.violations {
                print_error(output.format, output.quiet, &violation.to_string());
            }
            exit_codes::VALIDATION_FAILED
        }
        Err(ServiceError::Execution(ExecutionError::Graph(e))) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            exit_codes::VALIDATION_FAILED
        }
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            exit_codes::RUNTIME_ERROR
        }
    }
}

fn render_run(run: &FlowRun) -> String {
    let mut out = String::new();
    let c = run.counts();
    let _ = writeln!(
        out,
        "run {} flow {} #{}: {} ({} passed, {} failed, {} errored, {} skipped)",
        run.run_id,
        run.flow_id,
        run.ordinal.unwrap_or_default(),
        run.status,
        c.passed,
        c.failed,
        c.errored,
        c.skipped
    );
    for step in &run.steps {
        let tag = match step.state {
            StepState::Passed => "PASS",
            StepState::Failed => "FAIL",
            StepState::Errored => "ERR ",
            StepState::Skipped => "SKIP",
        };
        let _ = write!(out, "  {tag} {}", step.step_id);
        if let Some(req) = &step.request {
            let _ = write!(out, "  {} {}", req.method, req.url);
        }
        if let Some(resp) = &step.response {
            let _ = write!(out, " -> {} ({}ms)", resp.status, resp.duration_ms);
        }
        if let Some(err) = &step.error {
            let _ = write!(out, ": {err}");
        }
        out.push('\n');
        for a in step.failed_assertions() {
            let _ = writeln!(out, "      - {}", a.message);
        }
        if !step.unresolved.is_empty() {
            let _ = writeln!(out, "      unresolved: {}", step.unresolved.join(", "));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use flowcheck_core::FailurePolicy;
    use flowcheck_store::{RunStatus, StepResult};
    use uuid::Uuid;

    use super::*;

    #[test]
    fn text_lists_every_step() {
        let run = FlowRun {
            run_id: Uuid::nil(),
            flow_id: "auth".to_string(),
            environment_id: "cli".to_string(),
            ordinal: Some(3),
            status: RunStatus::Failed,
            failure_policy: FailurePolicy::Abort,
            steps: vec![StepResult::skipped("me", "upstream step `login` failed")],
            scope: Default::default(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };
        let text = render_run(&run);
        assert!(text.starts_with("run 00000000-0000-0000-0000-000000000000 flow auth #3: failed"));
        assert!(text.contains("  SKIP me: upstream step `login` failed"));
    }
}
