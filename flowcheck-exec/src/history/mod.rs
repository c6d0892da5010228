//! Replaying recorded requests and diffing their responses.

mod diff;
mod replay;

pub use diff::diff_responses;
pub use replay::{ReplayError, ReplayOutcome, Replayer};
