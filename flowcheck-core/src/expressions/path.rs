use serde_json::Value as JsonValue;

/// Dotted path into a JSON document, e.g. `data.items.0.id` or `data.items[0].id`.
///
/// Parsing never fails. A path with an empty segment is kept but can never
/// match, so lookups on it simply report "does not exist".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    raw: String,
    segments: Vec<String>,
    well_formed: bool,
}

impl PathQuery {
    pub fn parse(input: &str) -> Self {
        let raw = input.trim().to_string();
        let normalized: String = raw
            .chars()
            .filter(|c| *c != ']')
            .map(|c| if c == '[' { '.' } else { c })
            .collect();

        let mut rest = normalized.as_str();
        if let Some(r) = rest.strip_prefix('$') {
            rest = r.strip_prefix('.').unwrap_or(r);
        }
        if rest == "body" {
            rest = "";
        } else if let Some(r) = rest.strip_prefix("body.") {
            rest = r;
        }

        if rest.is_empty() {
            return Self {
                raw,
                segments: Vec::new(),
                well_formed: true,
            };
        }

        let segments: Vec<String> = rest.split('.').map(str::to_string).collect();
        let well_formed = segments.iter().all(|s| !s.is_empty());
        Self {
            raw,
            segments,
            well_formed,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_well_formed(&self) -> bool {
        self.well_formed
    }

    /// Addresses the whole document.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn lookup<'a>(&self, root: &'a JsonValue) -> Option<&'a JsonValue> {
        if !self.well_formed {
            return None;
        }
        let mut cur = root;
        for seg in &self.segments {
            cur = match cur {
                JsonValue::Object(map) => map.get(seg)?,
                JsonValue::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(cur)
    }

    pub fn exists(&self, root: &JsonValue) -> bool {
        self.lookup(root).is_some()
    }
}

impl std::fmt::Display for PathQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Text form used for equality checks and captured variables.
pub fn canonical_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}
