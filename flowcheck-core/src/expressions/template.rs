use std::sync::LazyLock;

use regex::Regex;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// `name` is trimmed; `raw` is the token exactly as written.
    Var { name: String, raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }
}

/// Split `input` into literal text and `{{ name }}` tokens.
///
/// Never fails: anything that is not a well-formed token (unclosed braces,
/// whitespace inside the name) stays literal text.
pub fn parse_template(input: &str) -> Template {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(input) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Literal(input[last..whole.start()].to_string()));
        }
        segments.push(Segment::Var {
            name: name.as_str().to_string(),
            raw: whole.as_str().to_string(),
        });
        last = whole.end();
    }

    if last < input.len() {
        segments.push(Segment::Literal(input[last..].to_string()));
    }

    Template { segments }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_literals_and_tokens() {
        let tpl = parse_template("Bearer {{ token }}!");
        assert_eq!(
            tpl.segments,
            vec![
                Segment::Literal("Bearer ".to_string()),
                Segment::Var {
                    name: "token".to_string(),
                    raw: "{{ token }}".to_string()
                },
                Segment::Literal("!".to_string()),
            ]
        );
    }

    #[test]
    fn unclosed_token_is_literal() {
        let tpl = parse_template("a {{b");
        assert!(tpl.is_literal());
    }

    #[test]
    fn triple_braces_keep_outer_brace() {
        let tpl = parse_template("{{{id}}}");
        assert_eq!(tpl.variables().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(tpl.segments.first(), Some(&Segment::Literal("{".to_string())));
        assert_eq!(tpl.segments.last(), Some(&Segment::Literal("}".to_string())));
    }
}
