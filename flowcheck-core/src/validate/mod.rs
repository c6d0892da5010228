mod rules;
mod validator;

use crate::error::ValidationError;
use crate::types::{Environment, Flow};
pub use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for Flow {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_flow(self)
    }
}

impl Validate for Environment {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_environment(self)
    }
}

/// Checks a flow for every configuration error that can be found before a run.
pub fn validate_flow(flow: &Flow) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_flow(flow);
    v.finish()
}

pub fn validate_environment(env: &Environment) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_environment(env);
    v.finish()
}
