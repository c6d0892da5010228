use flowcheck_core::{Environment, Flow, StepRef};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{
    DiffRecord, FlowRun, RunSummary, StateStore, StoreError, StoredStepResult,
};

use super::definitions;
use super::diffs;
use super::runs;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl StateStore for PostgresStore {
    async fn get_environment(&self, environment_id: &str) -> Result<Option<Environment>, StoreError> {
        definitions::get_environment(&self.pool, environment_id).await
    }

    async fn save_environment(&self, env: &Environment) -> Result<(), StoreError> {
        definitions::save_environment(&self.pool, env).await
    }

    async fn load_flow(&self, flow_id: &str) -> Result<Option<Flow>, StoreError> {
        definitions::load_flow(&self.pool, flow_id).await
    }

    async fn save_flow(&self, flow: &Flow) -> Result<(), StoreError> {
        definitions::save_flow(&self.pool, flow).await
    }

    async fn save_run(&self, run: &FlowRun) -> Result<i64, StoreError> {
        runs::save_run(&self.pool, run).await
    }

    async fn get_run(&self, run_id: Uuid) -> Result<Option<FlowRun>, StoreError> {
        runs::get_run(&self.pool, run_id).await
    }

    async fn list_runs(&self, flow_id: &str, limit: usize) -> Result<Vec<RunSummary>, StoreError> {
        runs::list_runs(&self.pool, flow_id, limit).await
    }

    async fn load_last_step_result(&self, step: &StepRef) -> Result<Option<StoredStepResult>, StoreError> {
        runs::load_last_step_result(&self.pool, step).await
    }

    async fn save_diff(&self, diff: &DiffRecord) -> Result<(), StoreError> {
        diffs::save_diff(&self.pool, diff).await
    }
}
