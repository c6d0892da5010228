use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use flowcheck_store::{RunStatus, StepState};
use tokio::sync::Mutex;

use crate::executor::{Event, EventSink};

#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    pub run_id: Option<uuid::Uuid>,
    pub flow_id: String,
    pub status: Option<RunStatus>,
    pub started_at: Option<Instant>,
    pub total_duration: Option<Duration>,
    pub steps_total: usize,
    pub steps_passed: usize,
    pub steps_failed: usize,
    pub steps_errored: usize,
    pub steps_skipped: usize,
    pub http_requests: usize,
    pub capture_misses: usize,
    pub unresolved_variables: usize,
}

impl RunMetrics {
    pub fn start(&mut self, run_id: uuid::Uuid, flow_id: String) {
        self.run_id = Some(run_id);
        self.flow_id = flow_id;
        self.started_at = Some(Instant::now());
    }

    pub fn record_step(&mut self, state: StepState) {
        self.steps_total += 1;
        match state {
            StepState::Passed => self.steps_passed += 1,
            StepState::Failed => self.steps_failed += 1,
            StepState::Errored => self.steps_errored += 1,
            StepState::Skipped => self.steps_skipped += 1,
        }
    }

    pub fn record_http_request(&mut self) {
        self.http_requests += 1;
    }

    pub fn record_capture_miss(&mut self) {
        self.capture_misses += 1;
    }

    pub fn record_unresolved(&mut self, count: usize) {
        self.unresolved_variables += count;
    }

    pub fn finish(&mut self, status: RunStatus) {
        self.status = Some(status);
        self.total_duration = self.started_at.map(|s| s.elapsed());
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "run_id": self.run_id.map(|id| id.to_string()),
            "flow_id": self.flow_id,
            "status": self.status.map(|s| s.as_str()),
            "duration_ms": self.total_duration.map(whole_millis),
            "steps": {
                "total": self.steps_total,
                "passed": self.steps_passed,
                "failed": self.steps_failed,
                "errored": self.steps_errored,
                "skipped": self.steps_skipped,
            },
            "http_requests": self.http_requests,
            "capture_misses": self.capture_misses,
            "unresolved_variables": self.unresolved_variables,
        })
    }
}

fn whole_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Default)]
pub struct MetricsCollector {
    metrics: Arc<Mutex<RunMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_metrics(&self) -> RunMetrics {
        self.metrics.lock().await.clone()
    }

    async fn observe(&self, event: &Event) {
        let mut m = self.metrics.lock().await;
        match event {
            Event::RunStarted { run_id, flow_id } => m.start(*run_id, flow_id.clone()),
            Event::RunFinished { status, .. } => m.finish(*status),
            Event::StepStarted { .. } => {}
            Event::RequestSent { .. } => m.record_http_request(),
            Event::StepFinished { state, .. } => m.record_step(*state),
            Event::StepSkipped { .. } => m.record_step(StepState::Skipped),
            Event::CaptureMissed { .. } => m.record_capture_miss(),
            Event::UnresolvedVariables { names, .. } => m.record_unresolved(names.len()),
        }
    }
}

/// Updates a collector, then forwards the event.
pub struct MetricsEventSink {
    collector: Arc<MetricsCollector>,
    base: Arc<dyn EventSink>,
}

impl MetricsEventSink {
    pub fn new(collector: Arc<MetricsCollector>, base: Arc<dyn EventSink>) -> Self {
        Self { collector, base }
    }
}

#[async_trait]
impl EventSink for MetricsEventSink {
    async fn emit(&self, event: Event) {
        self.collector.observe(&event).await;
        self.base.emit(event).await;
    }
}
