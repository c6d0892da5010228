#![forbid(unsafe_code)]

pub mod error;
pub mod expressions;
pub mod parser;
pub mod planner;
pub mod scope;
pub mod types;
pub mod validate;

pub use crate::error::{FlowcheckError, ParseError, ValidationError, Violation};
pub use crate::parser::{parse_environment_str, parse_flow_str, DocumentFormat, Parsed};
pub use crate::planner::{
    build_graph, plan_flow, plan_from_str, render_plan_text, DependencyGraph, GraphError, Plan,
    PlanFormat, PlanStep, PlanSummary, PlannerError, PlanningOutcome, ValidationSummary,
};
pub use crate::scope::{Generators, Interpolated, VariableScope};
pub use crate::types::{
    CaptureSpec, Environment, FailurePolicy, Flow, FlowEdge, FlowStep, StepRef,
};
pub use crate::validate::{validate_environment, validate_flow, Validate};
