//! Surfacing user-facing errors.

use tracing::error;

/// Receives error messages placed in the state by a `set` call.
///
/// The desktop front end shows these in a dialog; headless callers log them.
pub trait ErrorReporter: Send {
    fn report(&self, message: &str);
}

/// Reports errors through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, message: &str) {
        error!(title = "NMC Error", message, "error reported to user");
    }
}
