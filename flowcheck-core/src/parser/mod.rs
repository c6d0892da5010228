use serde::de::DeserializeOwned;

use crate::error::ParseError;
use crate::types::{Environment, Flow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub format: DocumentFormat,
}

pub fn parse_flow_str(input: &str, format: DocumentFormat) -> Result<Parsed<Flow>, ParseError> {
    parse_str(input, format)
}

pub fn parse_environment_str(
    input: &str,
    format: DocumentFormat,
) -> Result<Parsed<Environment>, ParseError> {
    parse_str(input, format)
}

fn parse_str<T: DeserializeOwned>(input: &str, format: DocumentFormat) -> Result<Parsed<T>, ParseError> {
    match format {
        DocumentFormat::Json => Ok(Parsed {
            value: serde_json::from_str::<T>(input)?,
            format,
        }),
        DocumentFormat::Yaml => Ok(Parsed {
            value: serde_yaml::from_str::<T>(input)?,
            format,
        }),
        DocumentFormat::Auto => parse_auto(input),
    }
}

fn parse_auto<T: DeserializeOwned>(input: &str) -> Result<Parsed<T>, ParseError> {
    // JSON always starts with `{` or `[` after trimming; anything else is tried as YAML first.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str::<T>(input) {
            Ok(value) => Ok(Parsed {
                value,
                format: DocumentFormat::Json,
            }),
            Err(e) => match serde_yaml::from_str::<T>(input) {
                Ok(value) => Ok(Parsed {
                    value,
                    format: DocumentFormat::Yaml,
                }),
                Err(_) => Err(ParseError::Json(e)),
            },
        };
    }

    match serde_yaml::from_str::<T>(input) {
        Ok(value) => Ok(Parsed {
            value,
            format: DocumentFormat::Yaml,
        }),
        Err(e) => {
            if let Ok(value) = serde_json::from_str::<T>(input) {
                return Ok(Parsed {
                    value,
                    format: DocumentFormat::Json,
                });
            }
            Err(ParseError::Yaml(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_flow_with_edge_aliases() {
        let doc = r#"
flowId: login
steps:
  - stepId: a
    method: POST
    path: /login
  - stepId: b
    method: GET
    path: /me
edges:
  - from: a
    to: b
"#;
        let parsed = parse_flow_str(doc, DocumentFormat::Auto).unwrap();
        assert_eq!(parsed.format, DocumentFormat::Yaml);
        assert_eq!(parsed.value.edges[0].source, "a");
        assert_eq!(parsed.value.edges[0].target, "b");
    }

    #[test]
    fn parses_json_environment() {
        let doc = r#"{"environmentId":"dev","baseUrl":"http://localhost:8080","variables":{"user":"alice"}}"#;
        let parsed = parse_environment_str(doc, DocumentFormat::Auto).unwrap();
        assert_eq!(parsed.format, DocumentFormat::Json);
        assert_eq!(parsed.value.variables["user"], "alice");
    }
}
