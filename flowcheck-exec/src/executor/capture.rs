use flowcheck_core::expressions::parse_capture;
use flowcheck_core::CaptureSpec;
use flowcheck_store::CaptureOutcome;

use crate::executor::response::ResponseView;

#[derive(Debug, Clone, Default)]
pub struct CaptureResults {
    pub outcomes: Vec<CaptureOutcome>,
    /// Successful captures in declaration order; later duplicates win.
    pub values: Vec<(String, String)>,
}

impl CaptureResults {
    pub fn misses(&self) -> impl Iterator<Item = &CaptureOutcome> {
        self.outcomes.iter().filter(|o| !o.captured())
    }
}

/// Extracts every capture from `response`. A capture whose source does not
/// exist is recorded as a miss and leaves the variable unset.
pub fn apply_captures(response: &ResponseView, specs: &[CaptureSpec]) -> CaptureResults {
    let mut out = CaptureResults::default();
    for spec in specs {
        let expr = match parse_capture(spec) {
            Ok(e) => e,
            Err(e) => {
                out.outcomes.push(CaptureOutcome {
                    name: spec.name.clone(),
                    path: spec.path.clone(),
                    value: None,
                    message: Some(format!("invalid capture: {e}")),
                });
                continue;
            }
        };

        match response.subject_text(&expr.source) {
            Some(value) => {
                out.values.push((expr.name.clone(), value.clone()));
                out.outcomes.push(CaptureOutcome {
                    name: expr.name,
                    path: spec.path.clone(),
                    value: Some(value),
                    message: None,
                });
            }
            None => out.outcomes.push(CaptureOutcome {
                name: expr.name,
                path: spec.path.clone(),
                value: None,
                message: Some(format!("`{}` does not exist in the response", spec.path)),
            }),
        }
    }
    out
}
