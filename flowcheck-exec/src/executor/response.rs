use std::collections::BTreeMap;
use std::time::Duration;

use flowcheck_core::expressions::{canonical_text, Subject};
use flowcheck_store::RecordedResponse;
use serde_json::Value as JsonValue;

use crate::executor::http::HttpResponseParts;

/// A received response plus its parsed JSON body, shared by the capture and
/// assertion engines.
#[derive(Debug, Clone)]
pub struct ResponseView {
    pub recorded: RecordedResponse,
    pub body_json: Option<JsonValue>,
}

impl ResponseView {
    pub fn new(parts: HttpResponseParts, elapsed: Duration) -> Self {
        let headers: BTreeMap<String, String> = parts
            .headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        let recorded = RecordedResponse {
            status: parts.status,
            headers,
            body: String::from_utf8_lossy(&parts.body).into_owned(),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        };
        Self::from_recorded(recorded)
    }

    pub fn from_recorded(recorded: RecordedResponse) -> Self {
        let body_json = recorded.json_body();
        Self {
            recorded,
            body_json,
        }
    }

    pub fn status(&self) -> u16 {
        self.recorded.status
    }

    pub fn duration_ms(&self) -> u64 {
        self.recorded.duration_ms
    }

    /// Canonical text of `subject`, or `None` when it does not exist.
    ///
    /// A root body path yields the raw body text when the body is not JSON;
    /// any deeper path into a non-JSON body does not exist.
    pub fn subject_text(&self, subject: &Subject) -> Option<String> {
        match subject {
            Subject::Status => Some(self.recorded.status.to_string()),
            Subject::Duration => Some(self.recorded.duration_ms.to_string()),
            Subject::Header(name) => self.recorded.header(name).map(str::to_string),
            Subject::Body(path) => match &self.body_json {
                Some(json) => path.lookup(json).map(canonical_text),
                None if path.is_root() && !self.recorded.body.is_empty() => {
                    Some(self.recorded.body.clone())
                }
                None => None,
            },
        }
    }
}
