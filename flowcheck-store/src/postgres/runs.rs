use chrono::{DateTime, Utc};
use flowcheck_core::StepRef;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{FlowRun, RunSummary, StepResult, StoreError, StoredStepResult};

#[derive(Debug, sqlx::FromRow)]
struct FlowRunRow {
    run_id: Uuid,
    flow_id: String,
    environment_id: String,
    ordinal: i64,
    status: String,
    failure_policy: String,
    scope: JsonValue,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl FlowRunRow {
    fn into_run(self, steps: Vec<StepResult>) -> Result<FlowRun, StoreError> {
        Ok(FlowRun {
            run_id: self.run_id,
            flow_id: self.flow_id,
            environment_id: self.environment_id,
            ordinal: Some(self.ordinal),
            status: self.status.parse().map_err(StoreError::Corrupt)?,
            failure_policy: self.failure_policy.parse().map_err(StoreError::Corrupt)?,
            steps,
            scope: serde_json::from_value(self.scope)?,
            started_at: self.started_at,
            finished_at: self.finished_at,
        })
    }
}

/// Inserts the run and its step results in one transaction. The per-flow
/// advisory lock serializes ordinal assignment between concurrent savers.
pub async fn save_run(pool: &PgPool, run: &FlowRun) -> Result<i64, StoreError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(&run.flow_id)
        .execute(&mut *tx)
        .await?;

    let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM flow_runs WHERE run_id = $1")
        .bind(run.run_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_some() {
        return Err(StoreError::DuplicateRun(run.run_id));
    }

    let ordinal: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(ordinal), 0) + 1 FROM flow_runs WHERE flow_id = $1",
    )
    .bind(&run.flow_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
INSERT INTO flow_runs
  (run_id, flow_id, environment_id, ordinal, status, failure_policy, scope, started_at, finished_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(run.run_id)
    .bind(&run.flow_id)
    .bind(&run.environment_id)
    .bind(ordinal)
    .bind(run.status.as_str())
    .bind(run.failure_policy.as_str())
    .bind(serde_json::to_value(&run.scope)?)
    .bind(run.started_at)
    .bind(run.finished_at)
    .execute(&mut *tx)
    .await?;

    for (position, step) in run.steps.iter().enumerate() {
        sqlx::query(
            r#"
INSERT INTO step_results (run_id, position, flow_id, step_id, state, has_request, result)
VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(run.run_id)
        .bind(position as i32)
        .bind(&run.flow_id)
        .bind(&step.step_id)
        .bind(step.state.as_str())
        .bind(step.request.is_some())
        .bind(serde_json::to_value(step)?)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(ordinal)
}

pub async fn get_run(pool: &PgPool, run_id: Uuid) -> Result<Option<FlowRun>, StoreError> {
    let row = sqlx::query_as::<_, FlowRunRow>(
        r#"
SELECT run_id, flow_id, environment_id, ordinal, status, failure_policy, scope, started_at, finished_at
FROM flow_runs WHERE run_id = $1
        "#,
    )
    .bind(run_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let steps = get_step_results(pool, run_id).await?;
    Ok(Some(row.into_run(steps)?))
}

async fn get_step_results(pool: &PgPool, run_id: Uuid) -> Result<Vec<StepResult>, StoreError> {
    let rows: Vec<JsonValue> = sqlx::query_scalar(
        "SELECT result FROM step_results WHERE run_id = $1 ORDER BY position",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|v| serde_json::from_value(v).map_err(StoreError::from))
        .collect()
}

pub async fn list_runs(pool: &PgPool, flow_id: &str, limit: usize) -> Result<Vec<RunSummary>, StoreError> {
    let rows = sqlx::query_as::<_, FlowRunRow>(
        r#"
SELECT run_id, flow_id, environment_id, ordinal, status, failure_policy, scope, started_at, finished_at
FROM flow_runs WHERE flow_id = $1
ORDER BY ordinal DESC
LIMIT $2
        "#,
    )
    .bind(flow_id)
    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let steps = get_step_results(pool, row.run_id).await?;
        out.push(row.into_run(steps)?.summary());
    }
    Ok(out)
}

#[derive(Debug, sqlx::FromRow)]
struct LastStepRow {
    run_id: Uuid,
    ordinal: i64,
    result: JsonValue,
}

pub async fn load_last_step_result(
    pool: &PgPool,
    step: &StepRef,
) -> Result<Option<StoredStepResult>, StoreError> {
    let row = sqlx::query_as::<_, LastStepRow>(
        r#"
SELECT r.run_id, r.ordinal, s.result
FROM step_results s
JOIN flow_runs r ON r.run_id = s.run_id
WHERE s.flow_id = $1 AND s.step_id = $2 AND s.has_request
ORDER BY r.ordinal DESC, s.position DESC
LIMIT 1
        "#,
    )
    .bind(&step.flow_id)
    .bind(&step.step_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| -> Result<StoredStepResult, StoreError> {
        Ok(StoredStepResult {
            run_id: r.run_id,
            ordinal: r.ordinal,
            result: serde_json::from_value(r.result)?,
        })
    })
    .transpose()
}
