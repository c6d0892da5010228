use std::collections::BTreeMap;

use flowcheck_core::{Environment, Flow};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::store::StoreError;

#[derive(Debug, sqlx::FromRow)]
struct EnvironmentRow {
    environment_id: String,
    base_url: String,
    variables: JsonValue,
}

pub async fn get_environment(pool: &PgPool, environment_id: &str) -> Result<Option<Environment>, StoreError> {
    let row = sqlx::query_as::<_, EnvironmentRow>(
        r#"
SELECT environment_id, base_url, variables FROM environments WHERE environment_id = $1
        "#,
    )
    .bind(environment_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| -> Result<Environment, StoreError> {
        let variables: BTreeMap<String, String> = serde_json::from_value(r.variables)?;
        Ok(Environment {
            environment_id: r.environment_id,
            base_url: r.base_url,
            variables,
        })
    })
    .transpose()
}

pub async fn save_environment(pool: &PgPool, env: &Environment) -> Result<(), StoreError> {
    let variables = serde_json::to_value(&env.variables)?;
    sqlx::query(
        r#"
INSERT INTO environments (environment_id, base_url, variables)
VALUES ($1, $2, $3)
ON CONFLICT (environment_id)
DO UPDATE SET base_url = EXCLUDED.base_url, variables = EXCLUDED.variables, updated_at = now()
        "#,
    )
    .bind(&env.environment_id)
    .bind(&env.base_url)
    .bind(variables)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_flow(pool: &PgPool, flow_id: &str) -> Result<Option<Flow>, StoreError> {
    let definition: Option<JsonValue> =
        sqlx::query_scalar(r#"SELECT definition FROM flows WHERE flow_id = $1"#)
            .bind(flow_id)
            .fetch_optional(pool)
            .await?;

    Ok(definition.map(serde_json::from_value).transpose()?)
}

pub async fn save_flow(pool: &PgPool, flow: &Flow) -> Result<(), StoreError> {
    let definition = serde_json::to_value(flow)?;
    sqlx::query(
        r#"
INSERT INTO flows (flow_id, definition)
VALUES ($1, $2)
ON CONFLICT (flow_id)
DO UPDATE SET definition = EXCLUDED.definition, updated_at = now()
        "#,
    )
    .bind(&flow.flow_id)
    .bind(definition)
    .execute(pool)
    .await?;
    Ok(())
}
