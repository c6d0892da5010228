use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use flowcheck_core::{FlowStep, VariableScope};
use flowcheck_store::{RecordedRequest, StepResult, StepState};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::executor::assertions::evaluate_assertions;
use crate::executor::capture::apply_captures;
use crate::executor::concurrency::ConcurrencyLimits;
use crate::executor::events::{Event, EventSink};
use crate::executor::http::{HttpClient, HttpError};
use crate::executor::request::build_request;
use crate::executor::response::ResponseView;

/// Everything one step needs, owned so the task can be spawned.
pub struct StepTask {
    pub run_id: Uuid,
    pub step: FlowStep,
    pub base_url: String,
    /// Snapshot of the run scope when the step became ready.
    pub scope: VariableScope,
    pub timeout: Duration,
    pub max_response_bytes: usize,
    pub cancel: CancellationToken,
}

pub struct Worker {
    pub http: Arc<dyn HttpClient>,
    pub events: Arc<dyn EventSink>,
    pub limits: ConcurrencyLimits,
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub result: StepResult,
    /// Values to commit to the run scope, in capture order.
    pub captured: Vec<(String, String)>,
}

impl StepOutcome {
    fn bare(result: StepResult) -> Self {
        Self {
            result,
            captured: Vec::new(),
        }
    }
}

impl Worker {
    pub async fn run(&self, task: StepTask) -> StepOutcome {
        let step_id = task.step.step_id.clone();

        // Waiting for a permit does not count as dispatched.
        let permit = tokio::select! {
            _ = task.cancel.cancelled() => None,
            p = self.limits.acquire() => p,
        };
        let Some(_permit) = permit else {
            return StepOutcome::bare(StepResult::skipped(step_id, "run cancelled before dispatch"));
        };

        self.events
            .emit(Event::StepStarted {
                run_id: task.run_id,
                step_id: step_id.clone(),
            })
            .await;

        let started_at = Utc::now();
        let errored = |request: Option<RecordedRequest>, unresolved: Vec<String>, error: String| StepResult {
            step_id: step_id.clone(),
            state: StepState::Errored,
            request,
            response: None,
            captures: Vec::new(),
            assertions: Vec::new(),
            unresolved,
            error: Some(error),
            started_at,
            finished_at: Utc::now(),
        };

        let built = match build_request(&task.step, &task.base_url, &task.scope) {
            Ok(b) => b,
            Err(e) => return StepOutcome::bare(errored(None, Vec::new(), e.to_string())),
        };

        if !built.unresolved.is_empty() {
            self.events
                .emit(Event::UnresolvedVariables {
                    run_id: task.run_id,
                    step_id: step_id.clone(),
                    names: built.unresolved.clone(),
                })
                .await;
        }

        self.events
            .emit(Event::RequestSent {
                run_id: task.run_id,
                step_id: step_id.clone(),
                method: built.recorded.method.clone(),
                url: built.recorded.url.clone(),
            })
            .await;

        let dispatched = Instant::now();
        let sent = tokio::select! {
            _ = task.cancel.cancelled() => Err(HttpError::Cancelled),
            r = tokio::time::timeout(
                task.timeout,
                self.http.send(built.parts, task.timeout, task.max_response_bytes),
            ) => r.unwrap_or(Err(HttpError::Timeout)),
        };
        let elapsed = dispatched.elapsed();

        let parts = match sent {
            Ok(p) => p,
            Err(e) => {
                return StepOutcome::bare(errored(
                    Some(built.recorded),
                    built.unresolved,
                    e.to_string(),
                ))
            }
        };

        let view = ResponseView::new(parts, elapsed);
        let captures = apply_captures(&view, &task.step.captures);
        for miss in captures.misses() {
            self.events
                .emit(Event::CaptureMissed {
                    run_id: task.run_id,
                    step_id: step_id.clone(),
                    name: miss.name.clone(),
                    path: miss.path.clone(),
                })
                .await;
        }

        // Assertions see this step's own captures.
        let mut scope = task.scope;
        for (name, value) in &captures.values {
            scope.capture(name.clone(), value.clone());
        }
        let assertions = evaluate_assertions(&task.step.assertions, &view, &scope);

        let state = if assertions.iter().all(|a| a.passed) {
            StepState::Passed
        } else {
            StepState::Failed
        };

        StepOutcome {
            result: StepResult {
                step_id,
                state,
                request: Some(built.recorded),
                response: Some(view.recorded),
                captures: captures.outcomes,
                assertions,
                unresolved: built.unresolved,
                error: None,
                started_at,
                finished_at: Utc::now(),
            },
            captured: captures.values,
        }
    }
}
