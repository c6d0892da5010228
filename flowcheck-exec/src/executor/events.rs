use std::sync::Arc;

use async_trait::async_trait;
use flowcheck_store::{RunStatus, StepState};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStarted {
        run_id: Uuid,
        flow_id: String,
    },
    RunFinished {
        run_id: Uuid,
        status: RunStatus,
    },
    StepStarted {
        run_id: Uuid,
        step_id: String,
    },
    /// The request was built and handed to the HTTP client.
    RequestSent {
        run_id: Uuid,
        step_id: String,
        method: String,
        url: String,
    },
    StepFinished {
        run_id: Uuid,
        step_id: String,
        state: StepState,
        duration_ms: Option<u64>,
    },
    StepSkipped {
        run_id: Uuid,
        step_id: String,
        reason: String,
    },
    CaptureMissed {
        run_id: Uuid,
        step_id: String,
        name: String,
        path: String,
    },
    UnresolvedVariables {
        run_id: Uuid,
        step_id: String,
        names: Vec<String>,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RunStarted { .. } => "run.started",
            Event::RunFinished { .. } => "run.finished",
            Event::StepStarted { .. } => "step.started",
            Event::RequestSent { .. } => "request.sent",
            Event::StepFinished { .. } => "step.finished",
            Event::StepSkipped { .. } => "step.skipped",
            Event::CaptureMissed { .. } => "capture.missed",
            Event::UnresolvedVariables { .. } => "variables.unresolved",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut v = match self {
            Event::RunStarted { run_id, flow_id } => {
                json!({ "run_id": run_id.to_string(), "flow_id": flow_id })
            }
            Event::RunFinished { run_id, status } => {
                json!({ "run_id": run_id.to_string(), "status": status.as_str() })
            }
            Event::StepStarted { run_id, step_id } => {
                json!({ "run_id": run_id.to_string(), "step_id": step_id })
            }
            Event::RequestSent { run_id, step_id, method, url } => {
                json!({ "run_id": run_id.to_string(), "step_id": step_id, "method": method, "url": url })
            }
            Event::StepFinished { run_id, step_id, state, duration_ms } => {
                json!({ "run_id": run_id.to_string(), "step_id": step_id, "state": state.as_str(), "duration_ms": duration_ms })
            }
            Event::StepSkipped { run_id, step_id, reason } => {
                json!({ "run_id": run_id.to_string(), "step_id": step_id, "reason": reason })
            }
            Event::CaptureMissed { run_id, step_id, name, path } => {
                json!({ "run_id": run_id.to_string(), "step_id": step_id, "name": name, "path": path })
            }
            Event::UnresolvedVariables { run_id, step_id, names } => {
                json!({ "run_id": run_id.to_string(), "step_id": step_id, "names": names })
            }
        };
        if let Some(obj) = v.as_object_mut() {
            obj.insert("type".to_string(), json!(self.kind()));
        }
        v
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// One JSON object per line on stdout.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        println!("{}", serde_json::to_string(&event.to_json()).unwrap_or_default());
    }
}

/// Forwards events to `tracing`; warnings for misses and unresolved names.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: Event) {
        match event {
            Event::RunStarted { run_id, flow_id } => {
                tracing::info!(%run_id, %flow_id, "run started");
            }
            Event::RunFinished { run_id, status } => {
                tracing::info!(%run_id, status = status.as_str(), "run finished");
            }
            Event::StepStarted { run_id, step_id } => {
                tracing::debug!(%run_id, %step_id, "step started");
            }
            Event::RequestSent { run_id, step_id, method, url } => {
                tracing::debug!(%run_id, %step_id, %method, %url, "request sent");
            }
            Event::StepFinished { run_id, step_id, state, duration_ms } => match state {
                StepState::Passed => {
                    tracing::info!(%run_id, %step_id, ?duration_ms, "step passed")
                }
                other => {
                    tracing::warn!(%run_id, %step_id, state = other.as_str(), ?duration_ms, "step did not pass")
                }
            },
            Event::StepSkipped { run_id, step_id, reason } => {
                tracing::info!(%run_id, %step_id, %reason, "step skipped");
            }
            Event::CaptureMissed { run_id, step_id, name, path } => {
                tracing::warn!(%run_id, %step_id, %name, %path, "capture missed");
            }
            Event::UnresolvedVariables { run_id, step_id, names } => {
                tracing::warn!(%run_id, %step_id, names = %names.join(","), "unresolved variables left in request");
            }
        }
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
