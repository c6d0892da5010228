use flowcheck_store::RunStatus;

/// Process exit codes, stable for CI use.
pub const SUCCESS: i32 = 0;
pub const VALIDATION_FAILED: i32 = 2;
/// A run did not pass, or a replay found changes.
pub const RUN_FAILED: i32 = 3;
pub const RUNTIME_ERROR: i32 = 4;

pub fn for_status(status: RunStatus) -> i32 {
    match status {
        RunStatus::Passed => SUCCESS,
        RunStatus::Failed | RunStatus::Cancelled => RUN_FAILED,
    }
}
