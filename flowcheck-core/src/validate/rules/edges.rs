use std::collections::HashSet;

use crate::planner::{build_graph, GraphError};
use crate::types::Flow;
use crate::validate::validator::Validator;

pub(crate) fn validate_edges(v: &mut Validator, flow: &Flow, step_ids: &HashSet<&str>) {
    let before = v.len();

    for (idx, edge) in flow.edges.iter().enumerate() {
        let epath = format!("edges[{idx}]");
        if !step_ids.contains(edge.source.as_str()) {
            v.push(format!("{epath}.source"), format!("unknown step `{}`", edge.source));
        }
        if !step_ids.contains(edge.target.as_str()) {
            v.push(format!("{epath}.target"), format!("unknown step `{}`", edge.target));
        }
        if edge.source == edge.target {
            v.push(epath, "a step cannot depend on itself");
        }
    }

    // Cycle detection only makes sense once every edge resolves.
    if v.len() != before || step_ids.len() != flow.steps.len() {
        return;
    }
    if let Err(GraphError::Cycle(ids)) = build_graph(flow) {
        v.push(
            "edges",
            format!("cycle detected involving steps: {}", ids.join(", ")),
        );
    }
}
