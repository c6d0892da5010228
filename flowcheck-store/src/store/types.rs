use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use flowcheck_core::{FailurePolicy, StepRef};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Terminal state of one step in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Passed,
    Failed,
    Skipped,
    Errored,
}

impl StepState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepState::Passed => "passed",
            StepState::Failed => "failed",
            StepState::Skipped => "skipped",
            StepState::Errored => "errored",
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(StepState::Passed),
            "failed" => Ok(StepState::Failed),
            "skipped" => Ok(StepState::Skipped),
            "errored" => Ok(StepState::Errored),
            other => Err(format!("unknown step state: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Passed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(RunStatus::Passed),
            "failed" => Ok(RunStatus::Failed),
            "cancelled" => Ok(RunStatus::Cancelled),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// The request exactly as it went on the wire, after interpolation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecordedResponse {
    pub status: u16,
    /// Header names are stored lower-cased.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
    pub duration_ms: u64,
}

impl RecordedResponse {
    /// Body parsed as JSON, if it is JSON.
    pub fn json_body(&self) -> Option<JsonValue> {
        if self.body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptureOutcome {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CaptureOutcome {
    pub fn captured(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AssertionOutcome {
    pub expression: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    pub message: String,
    /// The expression could not be parsed and was never evaluated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub configuration_error: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub state: StepState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RecordedRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<RecordedResponse>,
    #[serde(default)]
    pub captures: Vec<CaptureOutcome>,
    #[serde(default)]
    pub assertions: Vec<AssertionOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    /// Transport error for Errored steps, reason for Skipped ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl StepResult {
    pub fn skipped(step_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            step_id: step_id.into(),
            state: StepState::Skipped,
            request: None,
            response: None,
            captures: Vec::new(),
            assertions: Vec::new(),
            unresolved: Vec::new(),
            error: Some(reason.into()),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn failed_assertions(&self) -> impl Iterator<Item = &AssertionOutcome> {
        self.assertions.iter().filter(|a| !a.passed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StepCounts {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl StepCounts {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }
}

/// Complete record of one execution of a flow. Never mutated once saved.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlowRun {
    pub run_id: Uuid,
    pub flow_id: String,
    pub environment_id: String,
    /// Position in the flow's history, assigned when the run is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<i64>,
    pub status: RunStatus,
    pub failure_policy: FailurePolicy,
    /// In completion order.
    pub steps: Vec<StepResult>,
    /// Variables visible at the end of the run: environment values overlaid
    /// with captures.
    #[serde(default)]
    pub scope: BTreeMap<String, String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl FlowRun {
    pub fn step(&self, step_id: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    pub fn counts(&self) -> StepCounts {
        let mut c = StepCounts::default();
        for s in &self.steps {
            match s.state {
                StepState::Passed => c.passed += 1,
                StepState::Failed => c.failed += 1,
                StepState::Errored => c.errored += 1,
                StepState::Skipped => c.skipped += 1,
            }
        }
        c
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            flow_id: self.flow_id.clone(),
            environment_id: self.environment_id.clone(),
            ordinal: self.ordinal.unwrap_or_default(),
            status: self.status,
            counts: self.counts(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// One row of run history.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub flow_id: String,
    pub environment_id: String,
    pub ordinal: i64,
    pub status: RunStatus,
    pub counts: StepCounts,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A step result together with the run it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredStepResult {
    pub run_id: Uuid,
    pub ordinal: i64,
    pub result: StepResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Added,
    Removed,
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldDiff {
    /// `status`, or a body path such as `body.data.items.0.id`.
    pub path: String,
    pub kind: DiffKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DiffRecord {
    pub diff_id: Uuid,
    pub step: StepRef,
    /// Run whose stored response served as the baseline.
    pub baseline_run_id: Uuid,
    pub fields: Vec<FieldDiff>,
    pub created_at: DateTime<Utc>,
}

impl DiffRecord {
    pub fn count(&self, kind: DiffKind) -> usize {
        self.fields.iter().filter(|f| f.kind == kind).count()
    }

    pub fn has_changes(&self) -> bool {
        self.fields.iter().any(|f| f.kind != DiffKind::Unchanged)
    }

    pub fn changes(&self) -> impl Iterator<Item = &FieldDiff> {
        self.fields.iter().filter(|f| f.kind != DiffKind::Unchanged)
    }
}
