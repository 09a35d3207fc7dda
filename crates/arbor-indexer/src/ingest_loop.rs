//! The periodic ingestion task and its control handle.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, warn};

use arbor_chain::ChainConfig;
use arbor_types::FieldElement;

use crate::error::{ErrorClass, IndexerError, IndexerResult};
use crate::indexer::Indexer;
use crate::publisher::{SubmitOutcome, SubmitResult};

/// Administrative requests executed on the loop, which stays the only
/// writer of the root store.
enum Command {
    SubmitRoot {
        root: Option<FieldElement>,
        reply: oneshot::Sender<IndexerResult<SubmitOutcome>>,
    },
    SubmitAll {
        reply: oneshot::Sender<IndexerResult<Vec<SubmitResult>>>,
    },
}

/// Liveness of the ingestion loop as seen by `/health`.
#[derive(Debug, Default)]
pub struct LoopStatus {
    halted: RwLock<Option<String>>,
}

impl LoopStatus {
    /// Reason ingestion stopped for manual intervention, if it did.
    pub fn halted(&self) -> Option<String> {
        self.halted.read().expect("lock poisoned").clone()
    }

    fn halt(&self, reason: String) {
        *self.halted.write().expect("lock poisoned") = Some(reason);
    }
}

/// Cloneable handle for the query surface.
#[derive(Clone)]
pub struct LoopHandle {
    commands: mpsc::Sender<Command>,
    status: Arc<LoopStatus>,
}

impl LoopHandle {
    pub fn status(&self) -> &LoopStatus {
        &self.status
    }

    pub async fn submit_root(&self, root: Option<FieldElement>) -> IndexerResult<SubmitOutcome> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::SubmitRoot { root, reply })
            .await
            .map_err(|_| IndexerError::LoopStopped)?;
        rx.await.map_err(|_| IndexerError::LoopStopped)?
    }

    pub async fn submit_all(&self) -> IndexerResult<Vec<SubmitResult>> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::SubmitAll { reply })
            .await
            .map_err(|_| IndexerError::LoopStopped)?;
        rx.await.map_err(|_| IndexerError::LoopStopped)?
    }
}

/// Timing of the loop.
#[derive(Clone, Copy, Debug)]
pub struct LoopTiming {
    pub poll_interval: Duration,
    pub retry_delay: Duration,
}

impl From<&ChainConfig> for LoopTiming {
    fn from(config: &ChainConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            retry_delay: config.retry_delay(),
        }
    }
}

/// Runs `poll -> ingest -> rebuild -> publish` until shut down.
///
/// Transient errors are retried after `retry_delay`. Integrity errors halt
/// ingestion: the loop then only serves administrative commands, and the
/// last good snapshot stays visible to readers. The shutdown signal is only
/// looked at between cycles.
pub struct IngestLoop {
    indexer: Indexer,
    timing: LoopTiming,
    commands: mpsc::Receiver<Command>,
    shutdown: watch::Receiver<bool>,
    status: Arc<LoopStatus>,
}

impl IngestLoop {
    pub fn new(
        indexer: Indexer,
        timing: LoopTiming,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, LoopHandle) {
        let (tx, rx) = mpsc::channel(16);
        let status = Arc::new(LoopStatus::default());
        let handle = LoopHandle {
            commands: tx,
            status: Arc::clone(&status),
        };
        let ingest = Self {
            indexer,
            timing,
            commands: rx,
            shutdown,
            status,
        };
        (ingest, handle)
    }

    pub async fn run(mut self) -> IndexerResult<()> {
        info!(next_from = self.indexer.next_from(), "ingestion loop started");

        loop {
            if self.shutdown_requested() {
                break;
            }

            let delay = if self.status.halted().is_some() {
                None
            } else {
                match self.indexer.run_cycle().await {
                    Ok(_) => Some(self.timing.poll_interval),
                    Err(e) if e.class() == ErrorClass::Integrity => {
                        error!(
                            error = %e,
                            "data integrity failure; ingestion halted for manual intervention"
                        );
                        self.status.halt(e.to_string());
                        None
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            delay_ms = self.timing.retry_delay.as_millis() as u64,
                            "cycle failed; retrying"
                        );
                        Some(self.timing.retry_delay)
                    }
                }
            };

            if !self.idle(delay).await {
                break;
            }
        }

        info!("ingestion loop stopped");
        Ok(())
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Serve commands until `delay` elapses (forever if `None`).
    /// Returns `false` once shutdown is requested.
    async fn idle(&mut self, delay: Option<Duration>) -> bool {
        let sleep = tokio::time::sleep(delay.unwrap_or(Duration::MAX));
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep, if delay.is_some() => return true,
                Some(command) = self.commands.recv() => self.handle(command).await,
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        return false;
                    }
                }
            }
        }
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::SubmitRoot { root, reply } => {
                let result = self.indexer.publisher().submit_one(root).await;
                let _ = reply.send(result);
            }
            Command::SubmitAll { reply } => {
                let result = self.indexer.publisher().submit_all().await;
                let _ = reply.send(result);
            }
        }
    }
}
