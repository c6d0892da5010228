use std::collections::BTreeSet;

use flowcheck_core::expressions::canonical_text;
use flowcheck_store::{DiffKind, FieldDiff, RecordedResponse};
use serde_json::Value as JsonValue;

/// Field-by-field comparison of two responses to the same request.
///
/// `status` always comes first. JSON bodies are walked leaf by leaf with
/// object key order ignored; everything else is compared as one text leaf
/// at `body`. Headers are not compared.
pub fn diff_responses(old: &RecordedResponse, new: &RecordedResponse) -> Vec<FieldDiff> {
    let mut out = vec![leaf(
        "status",
        Some(old.status.to_string()),
        Some(new.status.to_string()),
    )];

    match (old.json_body(), new.json_body()) {
        (Some(a), Some(b)) => diff_values("body", Some(&a), Some(&b), &mut out),
        _ => out.push(leaf(
            "body",
            non_empty(&old.body),
            non_empty(&new.body),
        )),
    }
    out
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn leaf(path: &str, old: Option<String>, new: Option<String>) -> FieldDiff {
    let kind = match (&old, &new) {
        (None, None) => DiffKind::Unchanged,
        (None, Some(_)) => DiffKind::Added,
        (Some(_), None) => DiffKind::Removed,
        (Some(a), Some(b)) if a == b => DiffKind::Unchanged,
        (Some(_), Some(_)) => DiffKind::Changed,
    };
    FieldDiff {
        path: path.to_string(),
        kind,
        old,
        new,
    }
}

fn diff_values(path: &str, old: Option<&JsonValue>, new: Option<&JsonValue>, out: &mut Vec<FieldDiff>) {
    match (old, new) {
        (Some(JsonValue::Object(a)), Some(JsonValue::Object(b))) if !(a.is_empty() && b.is_empty()) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for k in keys {
                diff_values(&format!("{path}.{k}"), a.get(k), b.get(k), out);
            }
        }
        (Some(JsonValue::Array(a)), Some(JsonValue::Array(b))) if !(a.is_empty() && b.is_empty()) => {
            if a.len() != b.len() {
                out.push(FieldDiff {
                    path: path.to_string(),
                    kind: DiffKind::Changed,
                    old: Some(format!("length {}", a.len())),
                    new: Some(format!("length {}", b.len())),
                });
            }
            for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
                diff_values(&format!("{path}.{i}"), Some(x), Some(y), out);
            }
            let shared = a.len().min(b.len());
            for (i, x) in a.iter().enumerate().skip(shared) {
                flatten(&format!("{path}.{i}"), x, out, |p, v| leaf(p, Some(v), None));
            }
            for (i, y) in b.iter().enumerate().skip(shared) {
                flatten(&format!("{path}.{i}"), y, out, |p, v| leaf(p, None, Some(v)));
            }
        }
        (Some(a), None) => flatten(path, a, out, |p, v| leaf(p, Some(v), None)),
        (None, Some(b)) => flatten(path, b, out, |p, v| leaf(p, None, Some(v))),
        (a, b) => out.push(leaf(path, a.map(canonical_text), b.map(canonical_text))),
    }
}

/// Emits one entry per leaf of a subtree that exists on one side only.
fn flatten(path: &str, value: &JsonValue, out: &mut Vec<FieldDiff>, make: fn(&str, String) -> FieldDiff) {
    match value {
        JsonValue::Object(map) if !map.is_empty() => {
            for (k, v) in map {
                flatten(&format!("{path}.{k}"), v, out, make);
            }
        }
        JsonValue::Array(items) if !items.is_empty() => {
            for (i, v) in items.iter().enumerate() {
                flatten(&format!("{path}.{i}"), v, out, make);
            }
        }
        other => out.push(make(path, canonical_text(other))),
    }
}
