//! The sending side of a worker.

use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;

use crate::codec::Document;
use crate::error::WorkerError;
use crate::messages::{Envelope, WorkerCommand, WorkerEvent};

/// Receiver for a worker's events.
pub type WorkerEvents = mpsc::UnboundedReceiver<Envelope<WorkerEvent>>;

/// Receiver for commands addressed to a worker.
pub type WorkerCommands = mpsc::UnboundedReceiver<Envelope<WorkerCommand>>;

/// A cloneable handle for sending commands to one worker.
///
/// Sends never block and never wait for the worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    name: String,
    commands: mpsc::UnboundedSender<Envelope<WorkerCommand>>,
}

impl WorkerHandle {
    /// Create a handle and the command receiver it feeds.
    ///
    /// [`JsonStoreWorker::spawn`](crate::JsonStoreWorker::spawn) uses this to
    /// wire its own task; it is also the way to drive a custom worker.
    #[must_use]
    pub fn channel(name: impl Into<String>) -> (Self, WorkerCommands) {
        let (commands, rx) = mpsc::unbounded_channel();
        (
            Self {
                name: name.into(),
                commands,
            },
            rx,
        )
    }

    /// Returns the worker name (used in logs).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send an already-built envelope.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] if the worker has stopped.
    pub fn send_envelope(&self, envelope: Envelope<WorkerCommand>) -> Result<(), WorkerError> {
        trace!(worker = %self.name, command = ?envelope.body, "sending command");
        self.commands
            .send(envelope)
            .map_err(|_| WorkerError::Closed(self.name.clone()))
    }

    /// Send a command stamped with the current protocol version.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] if the worker has stopped.
    pub fn send(&self, command: WorkerCommand) -> Result<(), WorkerError> {
        self.send_envelope(Envelope::new(command))
    }

    /// Open `config_dir/file_name`, seeding missing keys from `default`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] if the worker has stopped.
    pub fn open(
        &self,
        file_name: impl Into<String>,
        config_dir: impl Into<PathBuf>,
        default: Document,
    ) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Open {
            file_name: file_name.into(),
            config_dir: config_dir.into(),
            default,
        })
    }

    /// Replace one top-level key.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] if the worker has stopped.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Set {
            key: key.into(),
            value,
        })
    }

    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] if the worker has stopped.
    pub fn flush(&self) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Flush)
    }

    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] if the worker has stopped.
    pub fn shutdown(&self) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Shutdown)
    }

    /// Returns `true` once the receiving side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_commands_arrive_in_order() {
        let (handle, mut rx) = WorkerHandle::channel("settings");
        handle.set("a", json!(1)).unwrap();
        handle.set("b", json!(2)).unwrap();
        handle.flush().unwrap();

        let received: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.body)
            .collect();
        assert_eq!(
            received,
            vec![
                WorkerCommand::Set {
                    key: "a".to_string(),
                    value: json!(1)
                },
                WorkerCommand::Set {
                    key: "b".to_string(),
                    value: json!(2)
                },
                WorkerCommand::Flush,
            ]
        );
    }

    #[test]
    fn test_send_after_close_fails() {
        let (handle, rx) = WorkerHandle::channel("cache");
        drop(rx);
        assert!(handle.is_closed());
        assert!(matches!(handle.flush(), Err(WorkerError::Closed(name)) if name == "cache"));
    }
}
