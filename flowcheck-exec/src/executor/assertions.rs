use flowcheck_core::expressions::{parse_assertion, Assertion, Subject};
use flowcheck_core::VariableScope;
use flowcheck_store::AssertionOutcome;

use crate::executor::response::ResponseView;

/// Evaluates every expression; one failure never stops the rest.
pub fn evaluate_assertions(
    exprs: &[String],
    response: &ResponseView,
    scope: &VariableScope,
) -> Vec<AssertionOutcome> {
    exprs
        .iter()
        .map(|e| evaluate_assertion(e, response, scope))
        .collect()
}

pub fn evaluate_assertion(
    expr: &str,
    response: &ResponseView,
    scope: &VariableScope,
) -> AssertionOutcome {
    let assertion = match parse_assertion(expr) {
        Ok(a) => a,
        Err(e) => {
            return AssertionOutcome {
                expression: expr.to_string(),
                passed: false,
                expected: None,
                actual: None,
                message: format!("configuration error: {e}"),
                configuration_error: true,
            }
        }
    };

    let outcome = |passed: bool, expected: String, actual: Option<String>, message: String| {
        AssertionOutcome {
            expression: expr.to_string(),
            passed,
            expected: Some(expected),
            actual,
            message,
            configuration_error: false,
        }
    };

    match assertion {
        Assertion::ResponseTimeBelow { limit_ms } => {
            let took = response.duration_ms();
            let passed = took < limit_ms;
            outcome(
                passed,
                format!("< {limit_ms}ms"),
                Some(format!("{took}ms")),
                if passed {
                    format!("responded in {took}ms")
                } else {
                    format!("responded in {took}ms, limit {limit_ms}ms")
                },
            )
        }
        Assertion::Exists(subject) => {
            let actual = response.subject_text(&subject);
            let passed = actual.is_some();
            let message = if passed {
                format!("{subject} exists")
            } else {
                format!("{subject} does not exist")
            };
            outcome(passed, "exists".to_string(), actual, message)
        }
        Assertion::NotExists(subject) => {
            let actual = response.subject_text(&subject);
            let passed = actual.is_none();
            let message = if passed {
                format!("{subject} does not exist")
            } else {
                format!("{subject} exists but should not")
            };
            outcome(passed, "not exists".to_string(), actual, message)
        }
        Assertion::Equals { subject, expected } => {
            let expected = scope.interpolate_str(&expected);
            let actual = response.subject_text(&subject);
            let passed = matches_expected(&subject, actual.as_deref(), &expected);
            let message = describe(&subject, "==", &expected, actual.as_deref(), passed);
            outcome(passed, expected, actual, message)
        }
        Assertion::NotEquals { subject, expected } => {
            let expected = scope.interpolate_str(&expected);
            let actual = response.subject_text(&subject);
            // A missing subject is never equal to anything.
            let passed = !matches_expected(&subject, actual.as_deref(), &expected);
            let message = describe(&subject, "!=", &expected, actual.as_deref(), passed);
            outcome(passed, format!("not {expected}"), actual, message)
        }
    }
}

fn matches_expected(subject: &Subject, actual: Option<&str>, expected: &str) -> bool {
    match (subject, actual) {
        (_, None) => false,
        (Subject::Status, Some(a)) => expected.trim().parse::<u16>().ok() == a.parse::<u16>().ok(),
        (_, Some(a)) => a == expected,
    }
}

fn describe(subject: &Subject, op: &str, expected: &str, actual: Option<&str>, passed: bool) -> String {
    let verdict = if passed { "ok" } else { "failed" };
    match actual {
        Some(a) => format!("{verdict}: {subject} {op} {expected} (actual {a})"),
        None => format!("{verdict}: {subject} {op} {expected} ({subject} does not exist)"),
    }
}
