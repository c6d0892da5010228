mod assertion;
mod capture;
mod error;
mod path;
mod subject;
mod template;

pub use assertion::{parse_assertion, Assertion};
pub use capture::{parse_capture, CaptureExpr};
pub(crate) use capture::is_valid_variable_name;
pub use error::ExpressionError;
pub use path::{canonical_text, PathQuery};
pub use subject::Subject;
pub use template::{parse_template, Segment, Template};
