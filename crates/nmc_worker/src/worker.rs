//! The file-backed JSON store worker.
//!
//! Each worker owns one document and the file behind it. The store talks to
//! it only through [`WorkerHandle`]; nothing is shared across tasks.
//!
//! `Set` commands are applied to the in-memory document at once and written
//! after `flush_delay`, so a burst of per-key updates produces one wholesale
//! write. The file is replaced atomically: the document is written to a
//! sibling `.tmp` file and renamed over the target.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::codec::{self, Document};
use crate::error::WorkerError;
use crate::handle::{WorkerCommands, WorkerEvents, WorkerHandle};
use crate::messages::{Envelope, PROTOCOL_VERSION, WorkerCommand, WorkerEvent};

/// Default delay between the first pending `Set` and the write.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(100);

/// Configuration for a store worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker name used in logs (e.g. `"settings"`).
    pub name: String,
    /// How long to coalesce `Set` commands before writing. Zero writes on
    /// every `Set`.
    pub flush_delay: Duration,
    /// Move an unreadable document aside and start from the defaults
    /// instead of failing the `Open`.
    pub discard_corrupt: bool,
}

impl WorkerConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flush_delay: DEFAULT_FLUSH_DELAY,
            discard_corrupt: false,
        }
    }

    /// Override the coalescing delay.
    #[must_use]
    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = delay;
        self
    }

    /// Replace a corrupt document with the defaults rather than failing.
    #[must_use]
    pub fn with_discard_corrupt(mut self, discard: bool) -> Self {
        self.discard_corrupt = discard;
        self
    }
}

/// The open file and its contents.
#[derive(Debug)]
struct OpenDocument {
    file_name: String,
    path: PathBuf,
    document: Document,
}

/// A task that owns one JSON document on disk.
#[derive(Debug)]
pub struct JsonStoreWorker {
    config: WorkerConfig,
    open: Option<OpenDocument>,
    /// Keys changed since the last write, in first-change order.
    pending: Vec<String>,
    /// When the pending keys must be written.
    deadline: Option<Instant>,
    events: mpsc::UnboundedSender<Envelope<WorkerEvent>>,
}

impl JsonStoreWorker {
    /// Spawn a worker on the current tokio runtime.
    ///
    /// Returns the command handle and the event receiver. The task stops on
    /// [`WorkerCommand::Shutdown`] or when every handle has been dropped,
    /// writing pending changes first.
    #[must_use]
    pub fn spawn(config: WorkerConfig) -> (WorkerHandle, WorkerEvents) {
        let (handle, commands) = WorkerHandle::channel(config.name.clone());
        let (events, events_rx) = mpsc::unbounded_channel();
        let worker = Self {
            config,
            open: None,
            pending: Vec::new(),
            deadline: None,
            events,
        };
        tokio::spawn(worker.run(commands));
        (handle, events_rx)
    }

    /// Process commands until shutdown or until the command channel closes.
    pub async fn run(mut self, mut commands: WorkerCommands) {
        info!(worker = %self.config.name, "worker started");

        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(envelope) => {
                        if !self.handle(envelope).await {
                            break;
                        }
                    }
                    None => {
                        self.flush().await;
                        break;
                    }
                },
                () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush().await;
                }
            }
        }

        info!(worker = %self.config.name, "worker stopped");
    }

    /// Handle one envelope. Returns `false` when the worker should stop.
    async fn handle(&mut self, envelope: Envelope<WorkerCommand>) -> bool {
        if !envelope.is_current() {
            warn!(
                worker = %self.config.name,
                expected = PROTOCOL_VERSION,
                got = envelope.version,
                "ignoring envelope from another protocol version"
            );
            self.emit(WorkerEvent::Rejected {
                expected: PROTOCOL_VERSION,
                got: envelope.version,
            });
            return true;
        }

        match envelope.body {
            WorkerCommand::Open {
                file_name,
                config_dir,
                default,
            } => {
                if let Err(err) = self.open(file_name, &config_dir, &default).await {
                    self.fail(&err);
                }
            }
            WorkerCommand::Set { key, value } => {
                let Some(open) = self.open.as_mut() else {
                    self.fail(&WorkerError::NotOpened(self.config.name.clone()));
                    return true;
                };
                open.document.insert(key.clone(), value);
                if !self.pending.contains(&key) {
                    self.pending.push(key);
                }
                if self.config.flush_delay.is_zero() {
                    self.flush().await;
                } else if self.deadline.is_none() {
                    self.deadline = Some(Instant::now() + self.config.flush_delay);
                }
            }
            WorkerCommand::Flush => self.flush().await,
            WorkerCommand::Shutdown => {
                self.flush().await;
                return false;
            }
        }
        true
    }

    async fn open(
        &mut self,
        file_name: String,
        config_dir: &Path,
        default: &Document,
    ) -> Result<(), WorkerError> {
        // Switching files writes whatever the previous one still owes.
        self.flush().await;

        let path = config_dir.join(&file_name);
        let mut document = match tokio::fs::read(&path).await {
            Ok(bytes) => match codec::decode_document(&bytes) {
                Ok(document) => document,
                Err(err) if self.config.discard_corrupt => {
                    let aside = sibling(&path, ".corrupt");
                    warn!(
                        worker = %self.config.name,
                        %err,
                        aside = %aside.display(),
                        "moving unreadable document aside"
                    );
                    tokio::fs::rename(&path, &aside).await?;
                    Document::new()
                }
                Err(err) => return Err(err),
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Document::new(),
            Err(err) => return Err(err.into()),
        };
        let added = codec::merge_defaults(&mut document, default);
        write_document(&path, &document).await?;

        info!(
            worker = %self.config.name,
            path = %path.display(),
            keys = document.len(),
            defaulted = added.len(),
            "document opened"
        );

        self.emit(WorkerEvent::Loaded {
            file_name: file_name.clone(),
            document: document.clone(),
        });
        self.open = Some(OpenDocument {
            file_name,
            path,
            document,
        });
        Ok(())
    }

    /// Write pending keys, if any.
    async fn flush(&mut self) {
        self.deadline = None;
        if self.pending.is_empty() {
            return;
        }
        let Some(open) = self.open.as_ref() else {
            self.pending.clear();
            return;
        };
        let keys = std::mem::take(&mut self.pending);
        match write_document(&open.path, &open.document).await {
            Ok(()) => {
                debug!(worker = %self.config.name, ?keys, "document written");
                let file_name = open.file_name.clone();
                self.emit(WorkerEvent::Persisted { file_name, keys });
            }
            Err(err) => {
                // Kept for the next Set, Flush or Shutdown to retry.
                self.pending = keys;
                self.fail(&err);
            }
        }
    }

    fn fail(&self, err: &WorkerError) {
        warn!(worker = %self.config.name, %err, "worker command failed");
        self.emit(WorkerEvent::Failed {
            message: err.to_string(),
        });
    }

    fn emit(&self, event: WorkerEvent) {
        // The store may have gone away; events are informational.
        let _ = self.events.send(Envelope::new(event));
    }
}

/// Write `document` to `path` through a temporary sibling file.
async fn write_document(path: &Path, document: &Document) -> Result<(), WorkerError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = codec::encode_document(document)?;
    let tmp = sibling(path, ".tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
