#![forbid(unsafe_code)]

//! Runtime engine for flowcheck: executes flows over HTTP, records every
//! step, and replays recorded requests to catch regressions.

pub mod executor;
pub mod history;
pub mod service;

pub use crate::executor::{
    EventSink, ExecutionError, Executor, ExecutorConfig, HttpClient, HttpError, ReqwestHttpClient,
    RunOptions,
};
pub use crate::history::{ReplayError, ReplayOutcome, Replayer};
pub use crate::service::{FlowService, ServiceError};
