use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use flowcheck_core::StepRef;
use flowcheck_store::{DiffRecord, RecordedResponse, StateStore, StoreError, StoredStepResult};
use uuid::Uuid;

use crate::executor::request::{parts_from_recorded, RequestBuildError};
use crate::executor::response::ResponseView;
use crate::executor::{ExecutorConfig, HttpClient, HttpError};
use crate::history::diff::diff_responses;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("no recorded request for step {0}")]
    NoHistory(StepRef),
    #[error("step {0} has a recorded request but no response to compare against")]
    NoBaselineResponse(StepRef),
    #[error(transparent)]
    InvalidRequest(#[from] RequestBuildError),
    #[error("replay request failed: {0}")]
    Http(#[from] HttpError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub baseline: StoredStepResult,
    pub response: RecordedResponse,
    pub diff: DiffRecord,
}

/// Re-sends a stored request verbatim and diffs the answer against history.
pub struct Replayer {
    store: Arc<dyn StateStore>,
    http: Arc<dyn HttpClient>,
    config: ExecutorConfig,
}

impl Replayer {
    pub fn new(store: Arc<dyn StateStore>, http: Arc<dyn HttpClient>, config: ExecutorConfig) -> Self {
        Self {
            store,
            http,
            config,
        }
    }

    /// Replays the most recent recorded request for `step`. The diff is
    /// persisted only when `persist` is set.
    pub async fn replay_last(&self, step: &StepRef, persist: bool) -> Result<ReplayOutcome, ReplayError> {
        let baseline = self
            .store
            .load_last_step_result(step)
            .await?
            .ok_or_else(|| ReplayError::NoHistory(step.clone()))?;
        let (Some(request), Some(old)) = (&baseline.result.request, &baseline.result.response) else {
            return Err(ReplayError::NoBaselineResponse(step.clone()));
        };

        let parts = parts_from_recorded(request)?;
        // The step's own limit applies when its flow still defines it.
        let step_timeout_ms = self
            .store
            .load_flow(&step.flow_id)
            .await?
            .and_then(|flow| flow.step(&step.step_id).and_then(|s| s.timeout_ms));
        let timeout = self.config.step_timeout(step_timeout_ms);
        tracing::info!(%step, url = %request.url, baseline_run = %baseline.run_id, "replaying step");

        let dispatched = Instant::now();
        let sent = tokio::time::timeout(
            timeout,
            self.http.send(parts, timeout, self.config.max_response_bytes),
        )
        .await
        .unwrap_or(Err(HttpError::Timeout))?;
        let response = ResponseView::new(sent, dispatched.elapsed()).recorded;

        let diff = DiffRecord {
            diff_id: Uuid::new_v4(),
            step: step.clone(),
            baseline_run_id: baseline.run_id,
            fields: diff_responses(old, &response),
            created_at: Utc::now(),
        };

        if persist {
            self.store.save_diff(&diff).await?;
        }
        if diff.has_changes() {
            tracing::warn!(%step, changes = diff.changes().count(), "replay differs from history");
        }

        Ok(ReplayOutcome {
            baseline,
            response,
            diff,
        })
    }
}
