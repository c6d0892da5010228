use async_trait::async_trait;
use flowcheck_core::{Environment, Flow, StepRef};
use uuid::Uuid;

use crate::store::types::*;

/// Persistence for flow definitions, environments and run history.
///
/// Runs are append-only: `save_run` assigns the next ordinal for the flow and
/// refuses to overwrite an existing run id.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get_environment(&self, environment_id: &str) -> Result<Option<Environment>, StoreError>;

    async fn save_environment(&self, env: &Environment) -> Result<(), StoreError>;

    async fn load_flow(&self, flow_id: &str) -> Result<Option<Flow>, StoreError>;

    async fn save_flow(&self, flow: &Flow) -> Result<(), StoreError>;

    /// Returns the ordinal assigned to the run.
    async fn save_run(&self, run: &FlowRun) -> Result<i64, StoreError>;

    async fn get_run(&self, run_id: Uuid) -> Result<Option<FlowRun>, StoreError>;

    /// Newest first.
    async fn list_runs(&self, flow_id: &str, limit: usize) -> Result<Vec<RunSummary>, StoreError>;

    /// Most recent saved result for the step that carries a sent request.
    async fn load_last_step_result(
        &self,
        step: &StepRef,
    ) -> Result<Option<StoredStepResult>, StoreError>;

    async fn save_diff(&self, diff: &DiffRecord) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("run {0} already saved")]
    DuplicateRun(Uuid),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Other(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}
