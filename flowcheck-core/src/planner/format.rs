use std::fmt::Write as _;

use crate::planner::model::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanFormat {
    Text,
    Json,
    Dot,
}

/// Human-readable rendering of a plan, one block per level.
pub fn render_plan_text(plan: &Plan) -> String {
    let mut out = String::new();
    let s = &plan.summary;
    let _ = writeln!(
        out,
        "flow {} ({} steps, {} edges, policy {})",
        s.flow_id, s.step_count, s.edge_count, s.failure_policy
    );
    if let Some(name) = &s.name {
        let _ = writeln!(out, "  name: {name}");
    }

    for (i, level) in plan.graph.levels.iter().enumerate() {
        let _ = writeln!(out, "level {i}:");
        for id in level {
            let Some(step) = plan.steps.iter().find(|p| &p.step_id == id) else {
                continue;
            };
            let _ = write!(out, "  {} {} {}", step.step_id, step.method, step.path);
            if !step.depends_on.is_empty() {
                let _ = write!(out, "  (after {})", step.depends_on.join(", "));
            }
            out.push('\n');
            if !step.captures.is_empty() {
                let _ = writeln!(out, "    captures: {}", step.captures.join(", "));
            }
            for a in &step.assertions {
                let _ = writeln!(out, "    assert: {a}");
            }
        }
    }

    if !s.unbound_variables.is_empty() {
        let names: Vec<&str> = s.unbound_variables.iter().map(String::as_str).collect();
        let _ = writeln!(out, "unbound variables: {}", names.join(", "));
    }
    out
}
