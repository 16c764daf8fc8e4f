//! Message types exchanged between the store and its workers.
//!
//! Every message travels inside an [`Envelope`] stamped with
//! [`PROTOCOL_VERSION`]. Workers reject envelopes from other versions instead
//! of guessing at their layout.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::codec::Document;

/// Version of the command/event layout below.
pub const PROTOCOL_VERSION: u16 = 1;

/// A versioned message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u16,
    pub body: T,
}

impl<T> Envelope<T> {
    /// Wrap `body` with the current protocol version.
    #[must_use]
    pub fn new(body: T) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            body,
        }
    }

    /// Returns `true` if the envelope was built for this protocol version.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.version == PROTOCOL_VERSION
    }
}

// ── Commands ────────────────────────────────────────────────────────────────

/// A request sent to a worker. Commands are handled strictly in arrival
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum WorkerCommand {
    /// Load `config_dir/file_name`, fill missing top-level keys from
    /// `default`, write the result back and reply with
    /// [`WorkerEvent::Loaded`].
    Open {
        file_name: String,
        config_dir: PathBuf,
        default: Document,
    },
    /// Replace one top-level key. The whole document is rewritten.
    Set {
        key: String,
        value: serde_json::Value,
    },
    /// Write pending changes immediately.
    Flush,
    /// Write pending changes and stop the worker.
    Shutdown,
}

// ── Events ──────────────────────────────────────────────────────────────────

/// A notification sent by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    /// The document was opened. Carries its full contents.
    Loaded { file_name: String, document: Document },
    /// Pending changes to `keys` reached the disk.
    Persisted { file_name: String, keys: Vec<String> },
    /// A command could not be carried out. The worker keeps running.
    Failed { message: String },
    /// An envelope from another protocol version was ignored.
    Rejected { expected: u16, got: u16 },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_envelope_is_current() {
        let envelope = Envelope::new(WorkerCommand::Flush);
        assert_eq!(envelope.version, PROTOCOL_VERSION);
        assert!(envelope.is_current());
    }

    #[test]
    fn test_command_wire_shape() {
        let envelope = Envelope::new(WorkerCommand::Set {
            key: "username".to_string(),
            value: json!("Nova"),
        });
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "version": PROTOCOL_VERSION,
                "body": { "method": "set", "key": "username", "value": "Nova" }
            })
        );
    }

    #[test]
    fn test_event_parses_from_wire() {
        let envelope: Envelope<WorkerEvent> = serde_json::from_value(json!({
            "version": 1,
            "body": { "event": "rejected", "expected": 1, "got": 0 }
        }))
        .unwrap();
        assert_eq!(
            envelope.body,
            WorkerEvent::Rejected {
                expected: 1,
                got: 0
            }
        );
    }
}
