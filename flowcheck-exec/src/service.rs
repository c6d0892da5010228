use std::sync::Arc;

use flowcheck_core::{Environment, FailurePolicy, Flow, StepRef};
use flowcheck_store::{DiffRecord, FlowRun, StateStore, StoreError};

use crate::executor::{EventSink, ExecutionError, Executor, ExecutorConfig, HttpClient, RunOptions};
use crate::history::{ReplayError, ReplayOutcome, Replayer};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("flow not found: {0}")]
    FlowNotFound(String),
    #[error("environment not found: {0}")]
    EnvironmentNotFound(String),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The two public entry points of the engine: run a stored flow, and replay
/// one step of its history.
pub struct FlowService {
    store: Arc<dyn StateStore>,
    executor: Executor,
    replayer: Replayer,
}

impl FlowService {
    pub fn new(
        config: ExecutorConfig,
        store: Arc<dyn StateStore>,
        http: Arc<dyn HttpClient>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let replayer = Replayer::new(store.clone(), http.clone(), config.clone());
        let executor = Executor::new(config, http, events);
        Self {
            store,
            executor,
            replayer,
        }
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Loads the flow and environment, runs the flow, and saves the run.
    pub async fn run_flow(
        &self,
        flow_id: &str,
        environment_id: &str,
        failure_policy: Option<FailurePolicy>,
    ) -> Result<FlowRun, ServiceError> {
        let options = RunOptions {
            failure_policy,
            ..RunOptions::default()
        };
        self.run_flow_with(flow_id, environment_id, options).await
    }

    pub async fn run_flow_with(
        &self,
        flow_id: &str,
        environment_id: &str,
        options: RunOptions,
    ) -> Result<FlowRun, ServiceError> {
        let flow = self
            .store
            .load_flow(flow_id)
            .await?
            .ok_or_else(|| ServiceError::FlowNotFound(flow_id.to_string()))?;
        let env = self
            .store
            .get_environment(environment_id)
            .await?
            .ok_or_else(|| ServiceError::EnvironmentNotFound(environment_id.to_string()))?;
        self.run_loaded(&flow, &env, options).await
    }

    /// Runs definitions the caller already holds, then saves the run.
    pub async fn run_loaded(
        &self,
        flow: &Flow,
        env: &Environment,
        options: RunOptions,
    ) -> Result<FlowRun, ServiceError> {
        let mut run = self.executor.execute(flow, env, options).await?;
        let ordinal = self.store.save_run(&run).await?;
        run.ordinal = Some(ordinal);
        tracing::info!(run_id = %run.run_id, flow_id = %run.flow_id, ordinal, status = run.status.as_str(), "run saved");
        Ok(run)
    }

    /// Replays the last recorded request of `step` and returns the diff.
    pub async fn replay_step(&self, step: &StepRef) -> Result<DiffRecord, ServiceError> {
        Ok(self.replayer.replay_last(step, false).await?.diff)
    }

    /// Like `replay_step`, but also persists the diff and returns the full outcome.
    pub async fn replay_step_and_save(&self, step: &StepRef) -> Result<ReplayOutcome, ServiceError> {
        Ok(self.replayer.replay_last(step, true).await?)
    }
}
