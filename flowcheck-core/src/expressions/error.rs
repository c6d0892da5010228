#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,
    #[error("missing operand after `{0}`")]
    MissingOperand(String),
    #[error("status must be an integer HTTP status code, got `{0}`")]
    InvalidStatus(String),
    #[error("invalid duration bound `{0}` (expected e.g. `500ms` or `2s`)")]
    InvalidDuration(String),
    #[error("operator `{op}` is not supported for `{subject}`")]
    UnsupportedOperator { op: String, subject: String },
    #[error("unrecognized expression `{0}`")]
    UnknownForm(String),
    #[error("invalid path `{0}`")]
    InvalidPath(String),
    #[error("invalid variable name `{0}`")]
    InvalidName(String),
    #[error("header name must not be empty")]
    EmptyHeaderName,
}
