use std::fmt::Write as _;
use std::sync::Arc;

use flowcheck_core::StepRef;
use flowcheck_exec::executor::NoOpEventSink;
use flowcheck_exec::{FlowService, ReplayError, ReqwestHttpClient, ServiceError};
use flowcheck_store::{DiffKind, DiffRecord};

use crate::cmd::config::build_executor_config;
use crate::exit_codes;
use crate::output::{print_error, print_result, print_text};
use crate::utils::connect_store;
use crate::{ExecArgs, OutputArgs, StoreArgs};

pub async fn replay_cmd(
    flow_id: &str,
    step_id: &str,
    save: bool,
    exec: ExecArgs,
    output: OutputArgs,
    store: StoreArgs,
) -> i32 {
    let Some(pg) = connect_store(&store, 5, &output).await else {
        return exit_codes::RUNTIME_ERROR;
    };
    let http = match ReqwestHttpClient::new() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };
    let service = FlowService::new(
        build_executor_config(&exec),
        Arc::new(pg),
        http,
        Arc::new(NoOpEventSink),
    );

    let step = StepRef::new(flow_id, step_id);
    let diff = if save {
        service.replay_step_and_save(&step).await.map(|o| o.diff)
    } else {
        service.replay_step(&step).await
    };

    match diff {
        Ok(diff) => {
            if !print_text(output.format, output.quiet, &render_diff(&diff)) {
                print_result(output.format, output.quiet, &diff);
            }
            if diff.has_changes() {
                exit_codes::RUN_FAILED
            } else {
                exit_codes::SUCCESS
            }
        }
        Err(ServiceError::Replay(e @ (ReplayError::NoHistory(_) | ReplayError::NoBaselineResponse(_)))) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            exit_codes::VALIDATION_FAILED
        }
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            exit_codes::RUNTIME_ERROR
        }
    }
}

fn render_diff(diff: &DiffRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "replay {} against run {}: {} added, {} removed, {} changed",
        diff.step,
        diff.baseline_run_id,
        diff.count(DiffKind::Added),
        diff.count(DiffKind::Removed),
        diff.count(DiffKind::Changed)
    );
    for f in diff.changes() {
        let old = f.old.as_deref().unwrap_or("");
        let new = f.new.as_deref().unwrap_or("");
        let _ = match f.kind {
            DiffKind::Added => writeln!(out, "  + {}: {new}", f.path),
            DiffKind::Removed => writeln!(out, "  - {}: {old}", f.path),
            DiffKind::Changed => writeln!(out, "  ~ {}: {old} -> {new}", f.path),
            DiffKind::Unchanged => Ok(()),
        };
    }
    out
}
