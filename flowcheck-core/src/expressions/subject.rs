use super::error::ExpressionError;
use super::path::PathQuery;

/// The part of a response an assertion or capture reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Status,
    Duration,
    Header(String),
    Body(PathQuery),
}

impl Subject {
    pub fn parse(input: &str) -> Result<Self, ExpressionError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ExpressionError::Empty);
        }
        if s == "status" {
            return Ok(Subject::Status);
        }
        if s == "duration" {
            return Ok(Subject::Duration);
        }
        if let Some(name) = s.strip_prefix("header.").or_else(|| s.strip_prefix("headers.")) {
            let name = name.trim();
            if name.is_empty() {
                return Err(ExpressionError::EmptyHeaderName);
            }
            return Ok(Subject::Header(name.to_string()));
        }

        let path = PathQuery::parse(s);
        if !path.is_well_formed() {
            return Err(ExpressionError::InvalidPath(s.to_string()));
        }
        Ok(Subject::Body(path))
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::Status => f.write_str("status"),
            Subject::Duration => f.write_str("duration"),
            Subject::Header(h) => write!(f, "header.{h}"),
            Subject::Body(p) => write!(f, "{p}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_prefixes() {
        assert_eq!(Subject::parse("status").unwrap(), Subject::Status);
        assert_eq!(
            Subject::parse("headers.Content-Type").unwrap(),
            Subject::Header("Content-Type".to_string())
        );
        assert!(matches!(Subject::parse("body.status").unwrap(), Subject::Body(_)));
        assert_eq!(Subject::parse("header."), Err(ExpressionError::EmptyHeaderName));
        assert!(matches!(Subject::parse("a..b"), Err(ExpressionError::InvalidPath(_))));
    }
}
