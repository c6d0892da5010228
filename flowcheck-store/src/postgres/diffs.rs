use sqlx::PgPool;

use crate::store::{DiffRecord, StoreError};

pub async fn save_diff(pool: &PgPool, diff: &DiffRecord) -> Result<(), StoreError> {
    sqlx::query(
        r#"
INSERT INTO step_diffs (diff_id, flow_id, step_id, baseline_run_id, has_changes, diff, created_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(diff.diff_id)
    .bind(&diff.step.flow_id)
    .bind(&diff.step.step_id)
    .bind(diff.baseline_run_id)
    .bind(diff.has_changes())
    .bind(serde_json::to_value(diff)?)
    .bind(diff.created_at)
    .execute(pool)
    .await?;
    Ok(())
}
