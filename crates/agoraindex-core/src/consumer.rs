//! The index loop — one sequential consumer per subscription.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected → Subscribing → Streaming ──(error)──→ Reconnecting ─┐
//!                     ▲                                             │
//!                     └─────────────────────────────────────────────┘
//! ```
//!
//! Each batch is processed to completion — decoded, dispatched, upserted —
//! before the cursor advances and before the next batch is taken, so the
//! store's cursor always reflects a fully-applied prefix of the stream.
//! Reconnection resumes from the persisted cursor; replayed events are
//! absorbed by the upsert engine's idempotence. Shutdown is graceful: the
//! in-flight batch completes and commits before the subscription drops.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use agoraindex_codec::{DecodeError, SchemaRegistry};

use crate::config::IndexerConfig;
use crate::cursor::{Cursor, CursorManager};
use crate::dispatcher::{BatchContext, Dispatcher};
use crate::engine::{UpsertEngine, UpsertStats};
use crate::error::IndexerError;
use crate::filter::SharedFilterSet;
use crate::provider::{BatchStream, BlockProvider, EventBatch};

/// Runtime state of the index loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Disconnected,
    Subscribing,
    Streaming,
    Reconnecting,
    Stopping,
    Stopped,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Subscribing => "subscribing",
            Self::Streaming => "streaming",
            Self::Reconnecting => "reconnecting",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// Counts from one processed batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchStats {
    pub events: usize,
    pub decoded: usize,
    pub skipped: usize,
    pub handler_errors: usize,
    pub upserts: UpsertStats,
}

/// Requests a graceful stop of the owning `IndexEngine`.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Ask the engine to stop after its in-flight batch commits.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

enum StreamExit {
    Shutdown,
    Resubscribe,
    Disconnected,
}

/// The indexing engine for one subscription.
pub struct IndexEngine<P: BlockProvider> {
    config: IndexerConfig,
    provider: P,
    registry: Arc<SchemaRegistry>,
    dispatcher: Dispatcher,
    upserts: UpsertEngine,
    cursor: CursorManager,
    filter: SharedFilterSet,
    shutdown: watch::Receiver<bool>,
    state: EngineState,
}

impl<P: BlockProvider> IndexEngine<P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: IndexerConfig,
        provider: P,
        registry: Arc<SchemaRegistry>,
        dispatcher: Dispatcher,
        upserts: UpsertEngine,
        cursor: CursorManager,
        filter: SharedFilterSet,
    ) -> (Self, ShutdownHandle) {
        let (tx, rx) = watch::channel(false);
        let engine = Self {
            config,
            provider,
            registry,
            dispatcher,
            upserts,
            cursor,
            filter,
            shutdown: rx,
            state: EngineState::Disconnected,
        };
        (engine, ShutdownHandle { tx: Arc::new(tx) })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Last committed cursor, if any.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.current()
    }

    /// Run until shutdown or until the reconnect budget is exhausted.
    pub async fn run(&mut self) -> Result<(), IndexerError> {
        let mut attempt: u32 = 0;

        while !*self.shutdown.borrow() {
            self.state = EngineState::Subscribing;

            let persisted = self.cursor.load().await?;
            let resume = match persisted {
                Some(c) => Some(c),
                None if self.config.starting_block > 0 => Some(Cursor::new(
                    self.config.starting_block.saturating_sub(1),
                    String::new(),
                )),
                None => None,
            };
            let spec = self.filter.lock().unwrap().apply();

            let stream = match self.provider.subscribe(resume.as_ref(), &spec).await {
                Ok(s) => s,
                Err(e) => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        self.state = EngineState::Stopped;
                        return Err(IndexerError::Aborted {
                            reason: format!("subscribe failed after {attempt} attempts: {e}"),
                        });
                    }
                    self.state = EngineState::Reconnecting;
                    let wait = self.backoff(attempt);
                    warn!(
                        indexer = %self.config.id,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "subscribe failed; backing off"
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
            };

            info!(
                indexer = %self.config.id,
                chain = %self.config.chain,
                from = resume.as_ref().map(|c| c.block_number),
                addresses = spec.entries.len(),
                "subscription open"
            );
            self.state = EngineState::Streaming;
            attempt = 0;

            match self.stream_batches(stream).await {
                StreamExit::Shutdown => break,
                StreamExit::Resubscribe => continue,
                StreamExit::Disconnected => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        self.state = EngineState::Stopped;
                        return Err(IndexerError::Aborted {
                            reason: format!("stream lost after {attempt} reconnect attempts"),
                        });
                    }
                    self.state = EngineState::Reconnecting;
                    let wait = self.backoff(attempt);
                    info!(
                        indexer = %self.config.id,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "reconnecting from persisted cursor"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }

        self.state = EngineState::Stopped;
        info!(indexer = %self.config.id, "index loop stopped");
        Ok(())
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.backoff_ms * 2u64.pow(attempt.saturating_sub(1).min(6)))
    }

    /// Consume one subscription's stream until it ends, fails, needs a
    /// filter reapply, or shutdown is requested.
    async fn stream_batches(&mut self, mut stream: BatchStream) -> StreamExit {
        let mut shutdown = self.shutdown.clone();

        loop {
            let item = tokio::select! {
                _ = wait_shutdown(&mut shutdown) => {
                    self.state = EngineState::Stopping;
                    return StreamExit::Shutdown;
                }
                item = stream.next() => item,
            };

            let batch = match item {
                None => {
                    info!(indexer = %self.config.id, "stream closed by provider");
                    return StreamExit::Disconnected;
                }
                Some(Err(e)) => {
                    warn!(indexer = %self.config.id, error = %e, "stream error");
                    return StreamExit::Disconnected;
                }
                Some(Ok(batch)) => batch,
            };

            match self.process_batch(&batch).await {
                Ok(stats) => {
                    if let Err(e) = self.cursor.commit(&batch.header).await {
                        error!(
                            block = batch.header.block_number,
                            error = %e,
                            "cursor persist failed; batch will replay"
                        );
                        return StreamExit::Disconnected;
                    }
                    debug!(
                        block = batch.header.block_number,
                        events = stats.events,
                        skipped = stats.skipped,
                        applied = stats.upserts.applied,
                        duplicates = stats.upserts.duplicates,
                        "batch committed"
                    );

                    if self.filter.lock().unwrap().should_reapply() {
                        info!(indexer = %self.config.id, "filter set grew; re-issuing subscription");
                        return StreamExit::Resubscribe;
                    }
                    if *shutdown.borrow() {
                        self.state = EngineState::Stopping;
                        return StreamExit::Shutdown;
                    }
                }
                Err(e) => {
                    error!(
                        block = batch.header.block_number,
                        error = %e,
                        "batch failed; retrying whole batch from cursor"
                    );
                    return StreamExit::Disconnected;
                }
            }
        }
    }

    /// Decode, dispatch, and upsert every event of one batch.
    ///
    /// Per-event decode failures are skipped (logged); handler failures are
    /// isolated by the dispatcher; only store failures propagate and abort
    /// the batch.
    pub async fn process_batch(&self, batch: &EventBatch) -> Result<BatchStats, IndexerError> {
        let ctx = BatchContext {
            header: batch.header.clone(),
            indexer_id: self.config.id.clone(),
        };
        let mut stats = BatchStats {
            events: batch.events.len(),
            ..Default::default()
        };

        for raw in &batch.events {
            let decoded = match self.registry.decode(raw) {
                Ok(ev) => ev,
                Err(DecodeError::UnknownSelector { selector }) => {
                    stats.skipped += 1;
                    debug!(
                        selector = %selector,
                        block = raw.block_number,
                        "unregistered event kind; skipping"
                    );
                    continue;
                }
                Err(e @ DecodeError::TruncatedEvent { .. }) => {
                    stats.skipped += 1;
                    warn!(
                        error = %e,
                        block = raw.block_number,
                        keys = ?raw.keys,
                        data = ?raw.data,
                        "truncated event; raw payload logged for shape update"
                    );
                    continue;
                }
                Err(e) => {
                    stats.skipped += 1;
                    warn!(error = %e, block = raw.block_number, "undecodable event; skipping");
                    continue;
                }
            };
            stats.decoded += 1;

            let outcome = self.dispatcher.route(&decoded, &ctx);
            stats.handler_errors += outcome.handler_errors;
            stats.upserts.absorb(self.upserts.apply_all(&outcome.upserts).await?);
        }

        Ok(stats)
    }
}

async fn wait_shutdown(rx: &mut watch::Receiver<bool>) {
    // If every handle is dropped, shutdown can no longer be requested.
    if rx.wait_for(|stop| *stop).await.is_err() {
        futures::future::pending::<()>().await;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
