pub mod assertions;
pub mod capture;
pub mod concurrency;
mod config;
mod error;
pub mod events;
pub mod http;
pub mod metrics;
pub mod request;
pub mod response;
mod scheduler;
pub mod worker;

pub use config::ExecutorConfig;
pub use error::ExecutionError;
pub use events::{
    CompositeEventSink, Event, EventSink, NoOpEventSink, StdoutEventSink, TracingEventSink,
};
pub use http::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts, ReqwestHttpClient};
pub use metrics::{MetricsCollector, MetricsEventSink, RunMetrics};
pub use scheduler::{Executor, RunOptions};
pub use worker::{StepOutcome, StepTask, Worker};
