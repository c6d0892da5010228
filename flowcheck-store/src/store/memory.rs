use std::collections::HashMap;

use async_trait::async_trait;
use flowcheck_core::{Environment, Flow, StepRef};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::trait_store::{StateStore, StoreError};
use crate::store::types::*;

#[derive(Debug, Default)]
struct MemoryState {
    flows: HashMap<String, Flow>,
    environments: HashMap<String, Environment>,
    /// Append-only, in save order.
    runs: Vec<FlowRun>,
    diffs: Vec<DiffRecord>,
}

/// Process-local store for tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn diffs(&self) -> Vec<DiffRecord> {
        self.state.read().await.diffs.clone()
    }

    pub async fn run_count(&self) -> usize {
        self.state.read().await.runs.len()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn get_environment(&self, environment_id: &str) -> Result<Option<Environment>, StoreError> {
        Ok(self.state.read().await.environments.get(environment_id).cloned())
    }

    async fn save_environment(&self, env: &Environment) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .environments
            .insert(env.environment_id.clone(), env.clone());
        Ok(())
    }

    async fn load_flow(&self, flow_id: &str) -> Result<Option<Flow>, StoreError> {
        Ok(self.state.read().await.flows.get(flow_id).cloned())
    }

    async fn save_flow(&self, flow: &Flow) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .flows
            .insert(flow.flow_id.clone(), flow.clone());
        Ok(())
    }

    async fn save_run(&self, run: &FlowRun) -> Result<i64, StoreError> {
        let mut state = self.state.write().await;
        if state.runs.iter().any(|r| r.run_id == run.run_id) {
            return Err(StoreError::DuplicateRun(run.run_id));
        }
        let ordinal = state
            .runs
            .iter()
            .filter(|r| r.flow_id == run.flow_id)
            .filter_map(|r| r.ordinal)
            .max()
            .unwrap_or(0)
            + 1;
        let mut stored = run.clone();
        stored.ordinal = Some(ordinal);
        state.runs.push(stored);
        Ok(ordinal)
    }

    async fn get_run(&self, run_id: Uuid) -> Result<Option<FlowRun>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .runs
            .iter()
            .find(|r| r.run_id == run_id)
            .cloned())
    }

    async fn list_runs(&self, flow_id: &str, limit: usize) -> Result<Vec<RunSummary>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .runs
            .iter()
            .rev()
            .filter(|r| r.flow_id == flow_id)
            .take(limit)
            .map(FlowRun::summary)
            .collect())
    }

    async fn load_last_step_result(
        &self,
        step: &StepRef,
    ) -> Result<Option<StoredStepResult>, StoreError> {
        let state = self.state.read().await;
        for run in state.runs.iter().rev().filter(|r| r.flow_id == step.flow_id) {
            let hit = run
                .steps
                .iter()
                .find(|s| s.step_id == step.step_id && s.request.is_some());
            if let Some(result) = hit {
                return Ok(Some(StoredStepResult {
                    run_id: run.run_id,
                    ordinal: run.ordinal.unwrap_or_default(),
                    result: result.clone(),
                }));
            }
        }
        Ok(None)
    }

    async fn save_diff(&self, diff: &DiffRecord) -> Result<(), StoreError> {
        self.state.write().await.diffs.push(diff.clone());
        Ok(())
    }
}
