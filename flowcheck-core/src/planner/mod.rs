mod dependency;
mod format;
mod model;
mod scan;

use crate::error::ParseError;
use crate::parser::{parse_flow_str, DocumentFormat};
use crate::types::{Environment, Flow};
use crate::validate::validate_flow;

pub use format::{render_plan_text, PlanFormat};
pub use model::{DependencyGraph, Plan, PlanStep, PlanSummary, PlanningOutcome, ValidationSummary};

/// Builds the step graph for `flow`, rejecting duplicate ids, dangling edges
/// and cycles.
pub fn build_graph(flow: &Flow) -> Result<DependencyGraph, GraphError> {
    dependency::build_step_dependency_graph(flow)
}

pub fn plan_from_str(
    input: &str,
    doc_format: DocumentFormat,
    env: Option<&Environment>,
) -> Result<PlanningOutcome, PlannerError> {
    let parsed = parse_flow_str(input, doc_format)?;
    plan_flow(&parsed.value, env)
}

pub fn plan_flow(flow: &Flow, env: Option<&Environment>) -> Result<PlanningOutcome, PlannerError> {
    let validation = match validate_flow(flow) {
        Ok(()) => ValidationSummary::valid(),
        Err(e) => ValidationSummary::invalid_from(e),
    };

    if !validation.is_valid {
        return Ok(PlanningOutcome {
            validation,
            plan: None,
        });
    }

    let plan = build_plan(flow, env)?;
    let mut validation = validation;
    validation.warnings = plan
        .steps
        .iter()
        .flat_map(|s| {
            s.unbound_variables
                .iter()
                .map(move |v| format!("steps.{}: variable `{v}` is never bound", s.step_id))
        })
        .collect();

    Ok(PlanningOutcome {
        validation,
        plan: Some(plan),
    })
}

fn build_plan(flow: &Flow, env: Option<&Environment>) -> Result<Plan, PlannerError> {
    let graph = build_graph(flow)?;
    let scan = scan::scan_flow(flow, &graph, env);

    let steps = graph
        .topo_order
        .iter()
        .filter_map(|id| flow.step(id))
        .map(|s| PlanStep {
            step_id: s.step_id.clone(),
            method: s.method.to_ascii_uppercase(),
            path: s.path.clone(),
            level: graph.level_of(&s.step_id).unwrap_or(0),
            depends_on: graph.predecessors(&s.step_id).to_vec(),
            captures: s.captures.iter().map(|c| c.name.clone()).collect(),
            assertions: s.assertions.clone(),
            referenced_variables: scan
                .referenced_by_step
                .get(&s.step_id)
                .cloned()
                .unwrap_or_default(),
            unbound_variables: scan
                .unbound_by_step
                .get(&s.step_id)
                .cloned()
                .unwrap_or_default(),
        })
        .collect::<Vec<_>>();

    Ok(Plan {
        summary: PlanSummary {
            flow_id: flow.flow_id.clone(),
            name: flow.name.clone(),
            failure_policy: flow.failure_policy.unwrap_or_default(),
            step_count: flow.steps.len(),
            edge_count: flow.edges.len(),
            unbound_variables: scan.unbound_all,
        },
        graph,
        steps,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate step id: {0}")]
    DuplicateStep(String),

    #[error("edge {source_id} -> {target_id} references unknown step `{missing}`")]
    UnknownStep {
        source_id: String,
        target_id: String,
        missing: String,
    },

    #[error("cycle detected in step dependency graph involving: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unable to build dependency graph: {0}")]
    Graph(#[from] GraphError),
}
