use std::fmt::Write as _;

use flowcheck_store::{RunSummary, StateStore};

use crate::exit_codes;
use crate::output::{print_error, print_result, print_text};
use crate::utils::connect_store;
use crate::{OutputArgs, StoreArgs};

pub async fn history_cmd(flow_id: &str, limit: usize, output: OutputArgs, store: StoreArgs) -> i32 {
    let Some(pg) = connect_store(&store, 5, &output).await else {
        return exit_codes::RUNTIME_ERROR;
    };

    let runs = match pg.list_runs(flow_id, limit).await {
        Ok(r) => r,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to list runs: {e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };

    if !print_text(output.format, output.quiet, &render_history(flow_id, &runs)) {
        print_result(output.format, output.quiet, &runs);
    }
    exit_codes::SUCCESS
}

fn render_history(flow_id: &str, runs: &[RunSummary]) -> String {
    if runs.is_empty() {
        return format!("no runs recorded for flow {flow_id}\n");
    }
    let mut out = String::new();
    for r in runs {
        let _ = writeln!(
            out,
            "#{:<4} {} {:<9} {}/{} passed  {}",
            r.ordinal,
            r.run_id,
            r.status.as_str(),
            r.counts.passed,
            r.counts.total(),
            r.started_at.to_rfc3339()
        );
    }
    out
}
