use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::ValidationError;
use crate::types::FailurePolicy;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlanningOutcome {
    pub validation: ValidationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationSummary {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn invalid_from(err: ValidationError) -> Self {
        let errors = err.violations.iter().map(ToString::to_string).collect();
        Self {
            is_valid: false,
            errors,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Plan {
    pub summary: PlanSummary,
    pub graph: DependencyGraph,
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlanSummary {
    pub flow_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub failure_policy: FailurePolicy,
    pub step_count: usize,
    pub edge_count: usize,
    /// Variables some step references that nothing is known to bind.
    pub unbound_variables: BTreeSet<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlanStep {
    pub step_id: String,
    pub method: String,
    pub path: String,
    pub level: usize,
    pub depends_on: Vec<String>,
    pub captures: Vec<String>,
    pub assertions: Vec<String>,
    pub referenced_variables: BTreeSet<String>,
    pub unbound_variables: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DependencyGraph {
    /// For each step, the steps it waits for.
    pub depends_on: BTreeMap<String, Vec<String>>,
    /// For each step, the steps waiting for it.
    pub dependents: BTreeMap<String, Vec<String>>,
    /// Steps grouped by parallelizable "levels".
    pub levels: Vec<Vec<String>>,
    /// Topological order, ties broken by declared step order.
    pub topo_order: Vec<String>,
}

impl DependencyGraph {
    pub fn len(&self) -> usize {
        self.topo_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topo_order.is_empty()
    }

    pub fn predecessors(&self, step_id: &str) -> &[String] {
        self.depends_on.get(step_id).map_or(&[], Vec::as_slice)
    }

    pub fn successors(&self, step_id: &str) -> &[String] {
        self.dependents.get(step_id).map_or(&[], Vec::as_slice)
    }

    pub fn level_of(&self, step_id: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|l| l.iter().any(|s| s == step_id))
    }

    /// Every step reachable from `step_id` along edges, excluding itself.
    pub fn transitive_successors(&self, step_id: &str) -> BTreeSet<String> {
        self.walk(step_id, |s| self.successors(s))
    }

    pub fn transitive_predecessors(&self, step_id: &str) -> BTreeSet<String> {
        self.walk(step_id, |s| self.predecessors(s))
    }

    fn walk<'a>(&'a self, start: &str, next: impl Fn(&str) -> &'a [String]) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&str> = next(start).iter().map(String::as_str).collect();
        while let Some(s) = queue.pop_front() {
            if seen.insert(s.to_string()) {
                queue.extend(next(s).iter().map(String::as_str));
            }
        }
        seen
    }

    pub fn to_dot(&self, flow_id: &str) -> String {
        let mut out = String::new();
        out.push_str("digraph flowcheck {\n");
        out.push_str(&format!("  label=\"flow: {flow_id}\";\n"));
        out.push_str("  labelloc=t;\n");
        out.push_str("  rankdir=LR;\n");

        for step in &self.topo_order {
            let deps = self.predecessors(step);
            if deps.is_empty() {
                out.push_str(&format!("  \"{step}\";\n"));
            } else {
                for dep in deps {
                    out.push_str(&format!("  \"{dep}\" -> \"{step}\";\n"));
                }
            }
        }

        for level in &self.levels {
            if level.len() > 1 {
                out.push_str("  { rank=same; ");
                for s in level {
                    out.push_str(&format!("\"{s}\"; "));
                }
                out.push_str("}\n");
            }
        }

        out.push_str("}\n");
        out
    }
}
