use std::collections::HashSet;

use crate::types::Flow;
use crate::validate::rules::{edges, step};
use crate::validate::validator::{Validator, ID_RE};

pub(crate) fn validate_flow(v: &mut Validator, flow: &Flow) {
    if flow.flow_id.trim().is_empty() {
        v.push("flowId", "must not be empty");
    }

    if flow.steps.is_empty() {
        v.push("steps", "must have at least one entry");
    }

    let mut step_ids = HashSet::<&str>::new();
    for (idx, s) in flow.steps.iter().enumerate() {
        let spath = format!("steps[{idx}]");

        if !ID_RE.is_match(&s.step_id) {
            v.push(format!("{spath}.stepId"), "must match regex [A-Za-z0-9_\\-]+");
        }
        if !step_ids.insert(s.step_id.as_str()) {
            v.push(format!("{spath}.stepId"), "must be unique within the flow");
        }

        step::validate_step(v, s, &spath);
    }

    edges::validate_edges(v, flow, &step_ids);
}
