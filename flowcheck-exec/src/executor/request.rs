use std::collections::BTreeMap;

use flowcheck_core::{FlowStep, VariableScope};
use flowcheck_store::RecordedRequest;
use serde_json::Value as JsonValue;

use crate::executor::http::HttpRequestParts;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestBuildError {
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),
    #[error("invalid URL `{url}`: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("body could not be serialized: {0}")]
    Body(String),
}

#[derive(Debug, Clone)]
pub struct BuiltRequest {
    pub parts: HttpRequestParts,
    pub recorded: RecordedRequest,
    /// Names left unexpanded anywhere in the request, first appearance first.
    pub unresolved: Vec<String>,
}

/// Interpolates the step's path, headers and body against `scope` and
/// resolves the URL against `base_url`.
pub fn build_request(
    step: &FlowStep,
    base_url: &str,
    scope: &VariableScope,
) -> Result<BuiltRequest, RequestBuildError> {
    let method = step.method.trim().to_ascii_uppercase();
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(RequestBuildError::InvalidMethod(step.method.clone()));
    }

    let mut unresolved: Vec<String> = Vec::new();
    let mut note = |names: Vec<String>| {
        for n in names {
            if !unresolved.contains(&n) {
                unresolved.push(n);
            }
        }
    };

    let path = scope.interpolate(&step.path);
    note(path.unresolved);
    let url_text = join_url(base_url, &path.text);
    let url = url::Url::parse(&url_text).map_err(|e| RequestBuildError::InvalidUrl {
        url: url_text.clone(),
        message: e.to_string(),
    })?;

    let mut headers = BTreeMap::new();
    for (name, value) in &step.headers {
        let v = scope.interpolate(value);
        note(v.unresolved);
        headers.insert(name.clone(), v.text);
    }

    let mut body_text = None;
    if !matches!(method.as_str(), "GET" | "HEAD") {
        if let Some(body) = &step.body {
            match body {
                JsonValue::String(s) => {
                    let b = scope.interpolate(s);
                    note(b.unresolved);
                    body_text = Some(b.text);
                }
                other => {
                    let mut missing = Vec::new();
                    let value = scope.interpolate_json(other, &mut missing);
                    note(missing);
                    let text = serde_json::to_string(&value)
                        .map_err(|e| RequestBuildError::Body(e.to_string()))?;
                    if !has_header(&headers, "content-type") {
                        headers.insert("Content-Type".to_string(), "application/json".to_string());
                    }
                    body_text = Some(text);
                }
            }
        }
    }

    let recorded = RecordedRequest {
        method: method.clone(),
        url: url.to_string(),
        headers: headers.clone(),
        body: body_text.clone(),
    };
    let parts = HttpRequestParts {
        method,
        url,
        headers,
        body: body_text.map(String::into_bytes).unwrap_or_default(),
    };

    Ok(BuiltRequest {
        parts,
        recorded,
        unresolved,
    })
}

/// Turns a stored request back into wire parts, byte for byte.
pub fn parts_from_recorded(recorded: &RecordedRequest) -> Result<HttpRequestParts, RequestBuildError> {
    let url = url::Url::parse(&recorded.url).map_err(|e| RequestBuildError::InvalidUrl {
        url: recorded.url.clone(),
        message: e.to_string(),
    })?;
    Ok(HttpRequestParts {
        method: recorded.method.clone(),
        url,
        headers: recorded.headers.clone(),
        body: recorded.body.clone().map(String::into_bytes).unwrap_or_default(),
    })
}

fn has_header(headers: &BTreeMap<String, String>, name: &str) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}

/// An absolute `http(s)://` path is used as-is; anything else is appended to
/// the base URL with exactly one `/` between them.
fn join_url(base_url: &str, path: &str) -> String {
    let path = path.trim();
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim().trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use flowcheck_core::Generators;
    use serde_json::json;

    use super::*;

    fn scope() -> VariableScope {
        let mut s = VariableScope::with_environment(
            Arc::new(Generators::default()),
            [("user".to_string(), "ada".to_string())],
        );
        s.capture("token", "t0k");
        s
    }

    #[test]
    fn joins_base_and_path() {
        assert_eq!(join_url("http://h:1/", "/a"), "http://h:1/a");
        assert_eq!(join_url("http://h:1/api", "a/b"), "http://h:1/api/a/b");
        assert_eq!(join_url("http://h:1", "https://other/x"), "https://other/x");
        assert_eq!(join_url("http://h:1/", ""), "http://h:1");
    }

    #[test]
    fn interpolates_every_part_and_sets_json_content_type() {
        let step = FlowStep::new("s", "post", "/users/{{user}}")
            .header("Authorization", "Bearer {{token}}")
            .body(json!({"name": "{{user}}", "ref": "{{missing}}"}));
        let built = build_request(&step, "http://localhost:8080", &scope()).unwrap();

        assert_eq!(built.parts.method, "POST");
        assert_eq!(built.parts.url.as_str(), "http://localhost:8080/users/ada");
        assert_eq!(built.parts.headers["Authorization"], "Bearer t0k");
        assert_eq!(built.parts.headers["Content-Type"], "application/json");
        let body: JsonValue = serde_json::from_slice(&built.parts.body).unwrap();
        assert_eq!(body, json!({"name": "ada", "ref": "{{missing}}"}));
        assert_eq!(built.unresolved, vec!["missing".to_string()]);
        assert_eq!(built.recorded.body.as_deref(), Some(std::str::from_utf8(&built.parts.body).unwrap()));
    }

    #[test]
    fn get_requests_never_carry_a_body() {
        let step = FlowStep::new("s", "GET", "/x").body(json!({"a": 1}));
        let built = build_request(&step, "http://localhost", &scope()).unwrap();
        assert!(built.parts.body.is_empty());
        assert!(built.recorded.body.is_none());
        assert!(!built.parts.headers.contains_key("Content-Type"));
    }

    #[test]
    fn explicit_content_type_is_kept_and_text_bodies_pass_through() {
        let step = FlowStep::new("s", "PUT", "/x")
            .header("content-type", "text/plain")
            .body(json!("hello {{user}}"));
        let built = build_request(&step, "http://localhost", &scope()).unwrap();
        assert_eq!(built.parts.body, b"hello ada");
        assert_eq!(built.parts.headers.len(), 1);

        let step = FlowStep::new("s", "PATCH", "/x").body(json!({"a": 1})).header("Content-Type", "application/merge-patch+json");
        let built = build_request(&step, "http://localhost", &scope()).unwrap();
        assert_eq!(built.parts.headers["Content-Type"], "application/merge-patch+json");
    }

    #[test]
    fn bad_method_or_url_is_an_error() {
        let step = FlowStep::new("s", "GE T", "/x");
        assert!(matches!(
            build_request(&step, "http://localhost", &scope()),
            Err(RequestBuildError::InvalidMethod(_))
        ));
        let step = FlowStep::new("s", "GET", "/x");
        assert!(matches!(
            build_request(&step, "not a url", &scope()),
            Err(RequestBuildError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn recorded_request_round_trips_to_identical_parts() {
        let step = FlowStep::new("s", "POST", "/x").body(json!({"n": "{{$randomInt}}"}));
        let built = build_request(&step, "http://localhost", &scope()).unwrap();
        assert_eq!(parts_from_recorded(&built.recorded).unwrap(), built.parts);
    }
}
