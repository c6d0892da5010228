use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value as JsonValue;

use crate::expressions::parse_template;
use crate::planner::model::DependencyGraph;
use crate::scope::Builtin;
use crate::types::{Environment, Flow, FlowStep};

#[derive(Debug, Default)]
pub(crate) struct ScanResult {
    pub referenced_by_step: BTreeMap<String, BTreeSet<String>>,
    pub unbound_by_step: BTreeMap<String, BTreeSet<String>>,
    pub unbound_all: BTreeSet<String>,
}

/// Finds `{{name}}` references per step and flags the ones neither the
/// environment nor an upstream capture can bind.
///
/// Without an environment only captures count as bindings, so anything the
/// environment would provide shows up as unbound.
pub(crate) fn scan_flow(
    flow: &Flow,
    graph: &DependencyGraph,
    env: Option<&Environment>,
) -> ScanResult {
    let mut out = ScanResult::default();

    let captures_by_step: BTreeMap<&str, BTreeSet<&str>> = flow
        .steps
        .iter()
        .map(|s| {
            (
                s.step_id.as_str(),
                s.captures.iter().map(|c| c.name.as_str()).collect(),
            )
        })
        .collect();

    for step in &flow.steps {
        let referenced = referenced_variables(step);

        let upstream = graph.transitive_predecessors(&step.step_id);
        let bound = |name: &str| {
            if name.starts_with('$') {
                return Builtin::from_name(name).is_some();
            }
            if env.is_some_and(|e| e.variables.contains_key(name)) {
                return true;
            }
            upstream.iter().any(|up| {
                captures_by_step
                    .get(up.as_str())
                    .is_some_and(|c| c.contains(name))
            })
        };

        let unbound: BTreeSet<String> = referenced.iter().filter(|n| !bound(n)).cloned().collect();
        if !unbound.is_empty() {
            out.unbound_all.extend(unbound.iter().cloned());
            out.unbound_by_step.insert(step.step_id.clone(), unbound);
        }
        out.referenced_by_step.insert(step.step_id.clone(), referenced);
    }
    out
}

pub(crate) fn referenced_variables(step: &FlowStep) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    scan_string(&step.path, &mut out);
    for v in step.headers.values() {
        scan_string(v, &mut out);
    }
    if let Some(body) = &step.body {
        scan_value(body, &mut out);
    }
    for a in &step.assertions {
        scan_string(a, &mut out);
    }
    out
}

fn scan_value(value: &JsonValue, out: &mut BTreeSet<String>) {
    match value {
        JsonValue::String(s) => scan_string(s, out),
        JsonValue::Array(items) => items.iter().for_each(|v| scan_value(v, out)),
        JsonValue::Object(map) => map.values().for_each(|v| scan_value(v, out)),
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) => {}
    }
}

fn scan_string(s: &str, out: &mut BTreeSet<String>) {
    out.extend(parse_template(s).variables().map(str::to_string));
}
