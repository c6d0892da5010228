use std::collections::HashSet;

use crate::expressions::{parse_assertion, parse_capture};
use crate::types::FlowStep;
use crate::validate::validator::{Validator, HEADER_NAME_RE, METHOD_RE};

pub(crate) fn validate_step(v: &mut Validator, step: &FlowStep, path: &str) {
    if !METHOD_RE.is_match(&step.method) {
        v.push(format!("{path}.method"), "must be an HTTP method token");
    }

    if step.path.trim().is_empty() {
        v.push(format!("{path}.path"), "must not be empty");
    }

    for name in step.headers.keys() {
        if !HEADER_NAME_RE.is_match(name) {
            v.push(format!("{path}.headers.{name}"), "invalid header name");
        }
    }

    if step.timeout_ms == Some(0) {
        v.push(format!("{path}.timeoutMs"), "must be greater than zero");
    }

    let mut names = HashSet::<&str>::new();
    for (idx, c) in step.captures.iter().enumerate() {
        let cpath = format!("{path}.captures[{idx}]");
        if let Err(e) = parse_capture(c) {
            v.push(&cpath, e.to_string());
        }
        if !names.insert(c.name.as_str()) {
            v.push(format!("{cpath}.name"), "captured twice in the same step");
        }
    }

    for (idx, a) in step.assertions.iter().enumerate() {
        if let Err(e) = parse_assertion(a) {
            v.push(format!("{path}.assertions[{idx}]"), e.to_string());
        }
    }
}
