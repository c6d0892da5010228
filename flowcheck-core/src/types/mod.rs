mod environment;
mod flow;

pub use environment::Environment;
pub use flow::{CaptureSpec, FailurePolicy, Flow, FlowEdge, FlowStep, StepRef};
