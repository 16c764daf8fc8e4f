//! # nmc_worker
//!
//! Background persistence for the galaxy companion.
//!
//! The store never touches the filesystem itself. It sends typed commands to
//! workers, each of which owns one JSON document on disk:
//!
//! - [`messages`]: the versioned command/event protocol.
//! - [`codec`]: JSON document encoding and default merging.
//! - [`handle`]: the non-blocking sending side of a worker.
//! - [`worker`]: the file-backed worker task.
//! - [`error`]: worker error types.

pub mod codec;
pub mod error;
pub mod handle;
pub mod messages;
pub mod worker;

pub use codec::Document;
pub use error::WorkerError;
pub use handle::{WorkerCommands, WorkerEvents, WorkerHandle};
pub use messages::{Envelope, PROTOCOL_VERSION, WorkerCommand, WorkerEvent};
pub use worker::{JsonStoreWorker, WorkerConfig};
