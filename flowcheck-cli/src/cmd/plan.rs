use std::path::Path;

use flowcheck_core::{parse_flow_str, plan_flow, render_plan_text, DocumentFormat, PlanningOutcome};

use crate::cmd::config::load_environment;
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::read_file;
use crate::{EnvArgs, OutputArgs};

pub async fn plan_cmd(path: &Path, env_args: EnvArgs, output: OutputArgs) -> i32 {
    let Some(content) = read_file(path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let Ok(env) = load_environment(&env_args, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };

    let flow = match parse_flow_str(&content, DocumentFormat::Auto) {
        Ok(p) => p.value,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let outcome = match plan_flow(&flow, env.as_ref()) {
        Ok(o) => o,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };

    match output.format {
        OutputFormat::Json => print_result(output.format, output.quiet, &outcome),
        OutputFormat::Text => print_text(&outcome, output.quiet),
        OutputFormat::Dot => print_dot(&outcome, &flow.flow_id, output.quiet),
    }

    if outcome.validation.is_valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_FAILED
    }
}

fn print_text(outcome: &PlanningOutcome, quiet: bool) {
    if quiet {
        return;
    }
    if !outcome.validation.is_valid {
        eprintln!("error: validation failed");
        for e in &outcome.validation.errors {
            eprintln!("- {e}");
        }
        return;
    }
    if let Some(plan) = &outcome.plan {
        print!("{}", render_plan_text(plan));
    }
    for w in &outcome.validation.warnings {
        eprintln!("warning: {w}");
    }
}

fn print_dot(outcome: &PlanningOutcome, flow_id: &str, quiet: bool) {
    if quiet {
        return;
    }
    match &outcome.plan {
        Some(plan) => print!("{}", plan.graph.to_dot(flow_id)),
        None => {
            for e in &outcome.validation.errors {
                eprintln!("- {e}");
            }
        }
    }
}
