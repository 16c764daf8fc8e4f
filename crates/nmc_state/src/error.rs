//! Store error types.

use nmc_worker::WorkerError;

/// Errors raised while starting the store or migrating legacy settings.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A worker could not be reached.
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Reading or clearing the legacy settings source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The legacy settings source is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The legacy settings file is valid JSON but not an object.
    #[error("legacy settings are not a JSON object")]
    LegacyNotAnObject,
}
