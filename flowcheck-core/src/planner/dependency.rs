use std::collections::{BTreeMap, BTreeSet};

use crate::planner::model::DependencyGraph;
use crate::planner::GraphError;
use crate::types::Flow;

pub(crate) fn build_step_dependency_graph(flow: &Flow) -> Result<DependencyGraph, GraphError> {
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, step) in flow.steps.iter().enumerate() {
        if index.insert(step.step_id.as_str(), i).is_some() {
            return Err(GraphError::DuplicateStep(step.step_id.clone()));
        }
    }

    let mut depends_on: BTreeMap<String, Vec<String>> = flow
        .steps
        .iter()
        .map(|s| (s.step_id.clone(), Vec::new()))
        .collect();
    let mut dependents = depends_on.clone();

    for edge in &flow.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !index.contains_key(endpoint.as_str()) {
                return Err(GraphError::UnknownStep {
                    source_id: edge.source.clone(),
                    target_id: edge.target.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        if edge.source == edge.target {
            return Err(GraphError::Cycle(vec![edge.source.clone()]));
        }
        if let Some(deps) = depends_on.get_mut(&edge.target) {
            if !deps.contains(&edge.source) {
                deps.push(edge.source.clone());
            }
        }
        if let Some(next) = dependents.get_mut(&edge.source) {
            if !next.contains(&edge.target) {
                next.push(edge.target.clone());
            }
        }
    }

    // Keep adjacency lists in declared step order so traversal is deterministic.
    let by_index = |v: &mut Vec<String>| v.sort_by_key(|id| index.get(id.as_str()).copied());
    depends_on.values_mut().for_each(by_index);
    dependents.values_mut().for_each(by_index);

    let topo_order = topo_sort(flow, &index, &depends_on, &dependents)?;
    let levels = compute_levels(&topo_order, &depends_on);

    Ok(DependencyGraph {
        depends_on,
        dependents,
        levels,
        topo_order,
    })
}

/// Kahn's algorithm; among ready steps the one declared first wins.
fn topo_sort(
    flow: &Flow,
    index: &BTreeMap<&str, usize>,
    depends_on: &BTreeMap<String, Vec<String>>,
    dependents: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<String>, GraphError> {
    let mut indeg: Vec<usize> = flow
        .steps
        .iter()
        .map(|s| depends_on.get(&s.step_id).map_or(0, Vec::len))
        .collect();

    let mut ready: BTreeSet<usize> = indeg
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();

    let mut out = Vec::with_capacity(flow.steps.len());
    while let Some(i) = ready.pop_first() {
        let id = &flow.steps[i].step_id;
        out.push(id.clone());
        for next in dependents.get(id).into_iter().flatten() {
            let Some(&j) = index.get(next.as_str()) else {
                continue;
            };
            indeg[j] -= 1;
            if indeg[j] == 0 {
                ready.insert(j);
            }
        }
    }

    if out.len() != flow.steps.len() {
        let stuck = flow
            .steps
            .iter()
            .enumerate()
            .filter(|(i, _)| indeg[*i] > 0)
            .map(|(_, s)| s.step_id.clone())
            .collect();
        return Err(GraphError::Cycle(stuck));
    }
    Ok(out)
}

fn compute_levels(topo: &[String], depends_on: &BTreeMap<String, Vec<String>>) -> Vec<Vec<String>> {
    let mut level: BTreeMap<&str, usize> = BTreeMap::new();
    for node in topo {
        let l = depends_on
            .get(node)
            .into_iter()
            .flatten()
            .filter_map(|d| level.get(d.as_str()).copied())
            .max()
            .map_or(0, |m| m + 1);
        level.insert(node.as_str(), l);
    }

    let Some(max_level) = level.values().copied().max() else {
        return Vec::new();
    };
    let mut levels = vec![Vec::<String>::new(); max_level + 1];
    for node in topo {
        levels[level[node.as_str()]].push(node.clone());
    }
    levels
}
