use super::error::ExpressionError;
use super::subject::Subject;

/// A parsed assertion. The textual grammar is persisted inside flow
/// definitions, so new forms are added as new variants only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    /// `duration < 500ms`
    ResponseTimeBelow { limit_ms: u64 },
    /// `<subject> exists`
    Exists(Subject),
    /// `<subject> !exists`
    NotExists(Subject),
    /// `<subject> == literal`
    Equals { subject: Subject, expected: String },
    /// `<subject> != literal`
    NotEquals { subject: Subject, expected: String },
}

pub fn parse_assertion(input: &str) -> Result<Assertion, ExpressionError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ExpressionError::Empty);
    }

    if let Some((lhs, op, rhs)) = split_equality(s) {
        let subject = Subject::parse(lhs)?;
        let expected = parse_literal(rhs).ok_or_else(|| ExpressionError::MissingOperand(op.to_string()))?;
        match &subject {
            Subject::Duration => {
                return Err(ExpressionError::UnsupportedOperator {
                    op: op.to_string(),
                    subject: subject.to_string(),
                })
            }
            Subject::Status => {
                expected
                    .parse::<u16>()
                    .map_err(|_| ExpressionError::InvalidStatus(expected.clone()))?;
            }
            _ => {}
        }
        return Ok(if op == "==" {
            Assertion::Equals { subject, expected }
        } else {
            Assertion::NotEquals { subject, expected }
        });
    }

    // Only reached when no `==`/`!=` is present, so `x == exists` stays an equality.
    if let Some(lhs) = s.strip_suffix("!exists") {
        return Ok(Assertion::NotExists(existence_subject(lhs, "!exists")?));
    }
    if let Some(lhs) = s.strip_suffix("exists") {
        if lhs.ends_with(char::is_whitespace) {
            return Ok(Assertion::Exists(existence_subject(lhs, "exists")?));
        }
    }

    if let Some((lhs, rhs)) = s.split_once('<') {
        let subject = Subject::parse(lhs)?;
        if subject != Subject::Duration {
            return Err(ExpressionError::UnsupportedOperator {
                op: "<".to_string(),
                subject: subject.to_string(),
            });
        }
        let limit_ms = parse_duration_ms(rhs)?;
        return Ok(Assertion::ResponseTimeBelow { limit_ms });
    }

    Err(ExpressionError::UnknownForm(s.to_string()))
}

fn existence_subject(lhs: &str, op: &str) -> Result<Subject, ExpressionError> {
    let lhs = lhs.trim();
    if lhs.is_empty() {
        return Err(ExpressionError::MissingOperand(op.to_string()));
    }
    let subject = Subject::parse(lhs)?;
    if subject == Subject::Duration {
        return Err(ExpressionError::UnsupportedOperator {
            op: op.to_string(),
            subject: subject.to_string(),
        });
    }
    Ok(subject)
}

/// Splits on the leftmost `==` or `!=` so literals may contain either.
fn split_equality(s: &str) -> Option<(&str, &'static str, &str)> {
    let eq = s.find("==");
    let ne = s.find("!=");
    let (idx, op) = match (eq, ne) {
        (Some(e), Some(n)) if n < e => (n, "!="),
        (Some(e), _) => (e, "=="),
        (None, Some(n)) => (n, "!="),
        (None, None) => return None,
    };
    Some((&s[..idx], op, &s[idx + 2..]))
}

fn parse_literal(rhs: &str) -> Option<String> {
    let s = rhs.trim();
    if s.is_empty() {
        return None;
    }
    let unquoted = if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    };
    Some(unquoted.to_string())
}

fn parse_duration_ms(rhs: &str) -> Result<u64, ExpressionError> {
    let s = rhs.trim();
    let invalid = || ExpressionError::InvalidDuration(s.to_string());
    if let Some(n) = s.strip_suffix("ms") {
        return n.trim().parse::<u64>().map_err(|_| invalid());
    }
    if let Some(n) = s.strip_suffix('s') {
        return n
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|secs| secs.checked_mul(1000))
            .ok_or_else(invalid);
    }
    s.parse::<u64>().map_err(|_| invalid())
}

impl std::fmt::Display for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Assertion::ResponseTimeBelow { limit_ms } => write!(f, "duration < {limit_ms}ms"),
            Assertion::Exists(s) => write!(f, "{s} exists"),
            Assertion::NotExists(s) => write!(f, "{s} !exists"),
            Assertion::Equals { subject, expected } => write!(f, "{subject} == {expected}"),
            Assertion::NotEquals { subject, expected } => write!(f, "{subject} != {expected}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::PathQuery;

    #[test]
    fn parses_status_equality() {
        assert_eq!(
            parse_assertion("status == 200").unwrap(),
            Assertion::Equals {
                subject: Subject::Status,
                expected: "200".to_string()
            }
        );
        assert_eq!(
            parse_assertion("status == ok"),
            Err(ExpressionError::InvalidStatus("ok".to_string()))
        );
    }

    #[test]
    fn parses_duration_bounds() {
        assert_eq!(
            parse_assertion("duration < 500ms").unwrap(),
            Assertion::ResponseTimeBelow { limit_ms: 500 }
        );
        assert_eq!(
            parse_assertion("duration<2s").unwrap(),
            Assertion::ResponseTimeBelow { limit_ms: 2000 }
        );
        assert!(matches!(
            parse_assertion("duration < soon"),
            Err(ExpressionError::InvalidDuration(_))
        ));
        assert!(matches!(
            parse_assertion("data.count < 3"),
            Err(ExpressionError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn parses_existence() {
        assert_eq!(
            parse_assertion("body.username exists").unwrap(),
            Assertion::Exists(Subject::Body(PathQuery::parse("body.username")))
        );
        assert_eq!(
            parse_assertion("data.error !exists").unwrap(),
            Assertion::NotExists(Subject::Body(PathQuery::parse("data.error")))
        );
        assert_eq!(
            parse_assertion("exists"),
            Err(ExpressionError::UnknownForm("exists".to_string()))
        );
    }

    #[test]
    fn literal_may_contain_operators() {
        assert_eq!(
            parse_assertion(r#"data.expr == "a!=b""#).unwrap(),
            Assertion::Equals {
                subject: Subject::Body(PathQuery::parse("data.expr")),
                expected: "a!=b".to_string()
            }
        );
    }

    #[test]
    fn exists_as_a_literal_is_compared_not_checked() {
        let state = || Subject::Body(PathQuery::parse("data.state"));
        assert_eq!(
            parse_assertion("data.state == exists").unwrap(),
            Assertion::Equals {
                subject: state(),
                expected: "exists".to_string()
            }
        );
        assert_eq!(
            parse_assertion("data.state != exists").unwrap(),
            Assertion::NotEquals {
                subject: state(),
                expected: "exists".to_string()
            }
        );
        assert_eq!(
            parse_assertion(r#"data.state == "it exists""#).unwrap(),
            Assertion::Equals {
                subject: state(),
                expected: "it exists".to_string()
            }
        );
        assert_eq!(
            parse_assertion("data.state != !exists").unwrap(),
            Assertion::NotEquals {
                subject: state(),
                expected: "!exists".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_forms() {
        assert!(matches!(parse_assertion("status = 200"), Err(ExpressionError::UnknownForm(_))));
        assert!(matches!(parse_assertion("data.id =="), Err(ExpressionError::MissingOperand(_))));
        assert_eq!(parse_assertion("  "), Err(ExpressionError::Empty));
    }
}
