//! Output formatting module
//!
//! Live reporting of run events and formatting of the final result.

mod formatter;
mod reporter;

pub use formatter::{write_result_to_file, OutputFormat, ResultFormatter};
pub use reporter::{ConsoleReporter, NullReporter, RecordingReporter, ReportEvent, ReportOutcome, Reporter};
