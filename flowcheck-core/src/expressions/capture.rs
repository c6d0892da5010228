use std::sync::LazyLock;

use regex::Regex;

use super::error::ExpressionError;
use super::subject::Subject;
use crate::types::CaptureSpec;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureExpr {
    pub name: String,
    pub source: Subject,
}

pub fn parse_capture(spec: &CaptureSpec) -> Result<CaptureExpr, ExpressionError> {
    let name = spec.name.trim();
    if !is_valid_variable_name(name) {
        return Err(ExpressionError::InvalidName(spec.name.clone()));
    }
    if spec.path.trim().is_empty() {
        return Err(ExpressionError::InvalidPath(spec.path.clone()));
    }
    let source = Subject::parse(&spec.path)?;
    Ok(CaptureExpr {
        name: name.to_string(),
        source,
    })
}

/// Variable names may not start with `$`; that prefix is reserved for generators.
pub(crate) fn is_valid_variable_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_body_and_header_captures() {
        let c = parse_capture(&CaptureSpec::new("tk", "data.token")).unwrap();
        assert_eq!(c.name, "tk");
        assert!(matches!(c.source, Subject::Body(_)));

        let c = parse_capture(&CaptureSpec::new("loc", "header.Location")).unwrap();
        assert_eq!(c.source, Subject::Header("Location".to_string()));
    }

    #[test]
    fn rejects_reserved_and_empty_names() {
        assert!(matches!(
            parse_capture(&CaptureSpec::new("$randomInt", "data.x")),
            Err(ExpressionError::InvalidName(_))
        ));
        assert!(matches!(
            parse_capture(&CaptureSpec::new("", "data.x")),
            Err(ExpressionError::InvalidName(_))
        ));
        assert!(matches!(
            parse_capture(&CaptureSpec::new("x", " ")),
            Err(ExpressionError::InvalidPath(_))
        ));
    }
}
