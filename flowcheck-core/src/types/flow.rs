use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Flow {
    #[serde(rename = "flowId", alias = "id")]
    pub flow_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Policy used when the caller does not pick one explicitly.
    #[serde(default, rename = "failurePolicy", skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<FailurePolicy>,

    pub steps: Vec<FlowStep>,

    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl Flow {
    pub fn step(&self, step_id: &str) -> Option<&FlowStep> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }
}

/// One request template plus its captures and assertions.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlowStep {
    #[serde(rename = "stepId", alias = "id")]
    pub step_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub method: String,

    pub path: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// String bodies are sent as-is after interpolation; structured bodies are
    /// interpolated leaf by leaf and serialized as JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub captures: Vec<CaptureSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertions: Vec<String>,

    #[serde(default, rename = "timeoutMs", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl FlowStep {
    pub fn new(step_id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            description: None,
            method: method.into(),
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            captures: Vec::new(),
            assertions: Vec::new(),
            timeout_ms: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn capture(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.captures.push(CaptureSpec::new(name, path));
        self
    }

    pub fn assert(mut self, expr: impl Into<String>) -> Self {
        self.assertions.push(expr.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptureSpec {
    pub name: String,
    pub path: String,
}

impl CaptureSpec {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// `target` must not start before `source` reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FlowEdge {
    #[serde(alias = "from")]
    pub source: String,
    #[serde(alias = "to")]
    pub target: String,
}

impl FlowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    #[serde(alias = "abort-on-failure")]
    Abort,
    Continue,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Continue => "continue",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "abort-on-failure" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(format!("unknown failure policy: {other}")),
        }
    }
}

/// Identifies one step across the run history of its flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct StepRef {
    pub flow_id: String,
    pub step_id: String,
}

impl StepRef {
    pub fn new(flow_id: impl Into<String>, step_id: impl Into<String>) -> Self {
        Self {
            flow_id: flow_id.into(),
            step_id: step_id.into(),
        }
    }
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.flow_id, self.step_id)
    }
}
