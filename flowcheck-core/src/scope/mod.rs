//! Layered variable scope and `{{name}}` interpolation.
//!
//! Lookup order for a token:
//! 1. names starting with `$` are built-in generators, evaluated per occurrence;
//! 2. variables captured earlier in the run;
//! 3. environment variables.
//!
//! Tokens that resolve nowhere are left verbatim in the output and reported
//! back to the caller as unresolved.

mod generators;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::expressions::{parse_template, Segment};

pub use generators::{Builtin, Generators, DEFAULT_RANDOM_INT_MAX};

#[derive(Debug, Clone, Default)]
pub struct VariableScope {
    generators: Arc<Generators>,
    environment: BTreeMap<String, String>,
    captured: BTreeMap<String, String>,
}

/// Result of interpolating one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolated {
    pub text: String,
    /// Names left unexpanded, in order of first appearance, without duplicates.
    pub unresolved: Vec<String>,
}

impl Interpolated {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

impl VariableScope {
    pub fn new(generators: Arc<Generators>) -> Self {
        Self {
            generators,
            environment: BTreeMap::new(),
            captured: BTreeMap::new(),
        }
    }

    pub fn with_environment(
        generators: Arc<Generators>,
        variables: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut scope = Self::new(generators);
        scope.environment.extend(variables);
        scope
    }

    pub fn set_environment(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.environment.insert(name.into(), value.into());
    }

    /// Writes into the captured layer, replacing any earlier capture of `name`.
    pub fn capture(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.captured.insert(name.into(), value.into());
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn generators(&self) -> &Arc<Generators> {
        &self.generators
    }

    /// Resolves a non-generator name through the captured and environment layers.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.captured
            .get(name)
            .or_else(|| self.environment.get(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Merged view with captured values shadowing environment values.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let mut out = self.environment.clone();
        out.extend(self.captured.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }

    fn resolve(&self, name: &str) -> Option<String> {
        if name.starts_with('$') {
            return self.generators.generate(name);
        }
        self.get(name).map(str::to_string)
    }

    pub fn interpolate(&self, text: &str) -> Interpolated {
        let tpl = parse_template(text);
        let mut out = String::with_capacity(text.len());
        let mut unresolved: Vec<String> = Vec::new();

        for seg in tpl.segments {
            match seg {
                Segment::Literal(l) => out.push_str(&l),
                Segment::Var { name, raw } => match self.resolve(&name) {
                    Some(v) => out.push_str(&v),
                    None => {
                        out.push_str(&raw);
                        if !unresolved.contains(&name) {
                            unresolved.push(name);
                        }
                    }
                },
            }
        }

        Interpolated {
            text: out,
            unresolved,
        }
    }

    pub fn interpolate_str(&self, text: &str) -> String {
        self.interpolate(text).text
    }

    /// Interpolates every string leaf of a JSON value; keys are left untouched.
    pub fn interpolate_json(&self, value: &JsonValue, unresolved: &mut Vec<String>) -> JsonValue {
        match value {
            JsonValue::String(s) => {
                let r = self.interpolate(s);
                for name in r.unresolved {
                    if !unresolved.contains(&name) {
                        unresolved.push(name);
                    }
                }
                JsonValue::String(r.text)
            }
            JsonValue::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|v| self.interpolate_json(v, unresolved))
                    .collect(),
            ),
            JsonValue::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.interpolate_json(v, unresolved)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> VariableScope {
        VariableScope::with_environment(
            Arc::new(Generators::default()),
            [("host".to_string(), "example.test".to_string())],
        )
    }

    #[test]
    fn resolves_bound_names() {
        let mut s = scope();
        s.capture("x", "v");
        assert_eq!(s.interpolate_str("{{x}}"), "v");
        assert_eq!(s.interpolate_str("{{ x }}"), "v");
        assert_eq!(s.interpolate_str("https://{{host}}/a"), "https://example.test/a");
    }

    #[test]
    fn unresolved_names_round_trip_verbatim() {
        let s = VariableScope::default();
        let r = s.interpolate("{{missing}} and {{ missing }} and {{other}}");
        assert_eq!(r.text, "{{missing}} and {{ missing }} and {{other}}");
        assert_eq!(r.unresolved, vec!["missing".to_string(), "other".to_string()]);
        assert!(!r.is_complete());
    }

    #[test]
    fn captured_layer_shadows_environment() {
        let mut s = scope();
        assert_eq!(s.get("host"), Some("example.test"));
        s.capture("host", "override.test");
        assert_eq!(s.get("host"), Some("override.test"));
        assert_eq!(s.environment()["host"], "example.test");
        assert_eq!(s.snapshot()["host"], "override.test");
    }

    #[test]
    fn random_int_is_drawn_per_occurrence() {
        let s = VariableScope::new(Arc::new(Generators::seeded(1_000_000, 7)));
        let out = s.interpolate_str("{{$randomInt}},{{$randomInt}},{{$randomInt}}");
        let values: Vec<u32> = out.split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| *v <= 1_000_000));
        assert!(values.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn timestamp_is_epoch_seconds() {
        let s = VariableScope::default();
        let ts: i64 = s.interpolate_str("{{$timestamp}}").parse().unwrap();
        let now = chrono::Utc::now().timestamp();
        assert!((now - ts).abs() <= 5);
    }

    #[test]
    fn unknown_generator_is_unresolved() {
        let s = VariableScope::default();
        let r = s.interpolate("{{$nope}}");
        assert_eq!(r.text, "{{$nope}}");
        assert_eq!(r.unresolved, vec!["$nope".to_string()]);
    }

    #[test]
    fn interpolates_json_leaves() {
        let mut s = scope();
        s.capture("id", "42");
        let mut unresolved = Vec::new();
        let out = s.interpolate_json(
            &serde_json::json!({"user": {"id": "{{id}}", "tags": ["{{nope}}", 1]}}),
            &mut unresolved,
        );
        assert_eq!(out, serde_json::json!({"user": {"id": "42", "tags": ["{{nope}}", 1]}}));
        assert_eq!(unresolved, vec!["nope".to_string()]);
    }
}
