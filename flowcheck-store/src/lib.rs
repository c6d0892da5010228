#![forbid(unsafe_code)]

pub mod postgres;
pub mod store;

pub use crate::postgres::{run_migrations, PostgresStore};
pub use crate::store::{
    AssertionOutcome, CaptureOutcome, DiffKind, DiffRecord, FieldDiff, FlowRun, InMemoryStore,
    RecordedRequest, RecordedResponse, RunStatus, RunSummary, StateStore, StepCounts, StepResult,
    StepState, StoreError, StoredStepResult,
};
