//! Worker error types.

/// Errors that can occur while persisting a document.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backing file holds JSON that is not an object.
    #[error("document is not a JSON object")]
    NotAnObject,

    /// A command arrived before the document was opened.
    #[error("worker `{0}` has no open document")]
    NotOpened(String),

    /// The envelope was built for a different protocol version.
    #[error("protocol version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u16, got: u16 },

    /// The worker task has stopped and no longer accepts commands.
    #[error("worker `{0}` is closed")]
    Closed(String),
}
