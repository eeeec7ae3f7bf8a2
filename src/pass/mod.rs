//! Printable visitor passes.
//!
//! [`PassRenderer`] lays a stored [`VisitorRecord`](crate::visitor::VisitorRecord)
//! out as an A6 pass with its photo, fields, issue time, validity window and
//! a QR code of the pass code. A [`PrintSink`] takes it from there.

mod print;
mod render;
mod validity;

pub use print::{CommandPrinter, FilePrinter, PrintError, PrintSink};
pub use render::{PassRenderer, RenderError, RenderedPass, TIMESTAMP_FORMAT};
pub use validity::valid_until;
