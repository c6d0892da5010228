use flowcheck_core::{GraphError, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("task join error: {0}")]
    TaskJoin(String),
}
