//! The debounced save queue — one explicit state machine per document.
//!
//! Every mutation enqueues a partial payload; the queue coalesces a burst
//! into one merged write issued after the author pauses. Each document is
//! owned by a dedicated worker task, so flushes for one document are
//! strictly sequential — at-most-one-in-flight needs no lock discipline,
//! it holds by construction.
//!
//! State machine per document:
//!
//! ```text
//!          enqueue                debounce elapsed
//!  Idle ───────────► Pending ───────────────────► Flushing
//!   ▲                  │  ▲                           │
//!   │                  └──┘ enqueue re-arms timer     │
//!   │                                                 │
//!   ├───────────────── success ◄──────────────────────┤
//!   └── retries exhausted (payload retained)          │
//!          Pending ◄── failure: backoff timer ────────┘
//! ```

use crate::gateway::{DocumentKind, GatewayError, PersistenceGateway};
use crate::patch::DocumentPatch;
use folio_core::PageSettings;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("save queue worker for document {0} is gone")]
    QueueClosed(Uuid),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Where a document's queue currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Idle,
    Pending,
    Flushing,
}

/// Events emitted by the save queue.
#[derive(Debug, Clone)]
pub enum SaveEvent {
    /// A merged payload was written durably
    Flushed {
        doc_id: Uuid,
        applied: DocumentPatch,
    },
    /// A flush failed; a retry timer was armed
    RetryScheduled {
        doc_id: Uuid,
        attempt: u32,
        delay: Duration,
    },
    /// The retry ceiling was hit; the payload is retained and the queue
    /// parks until the next enqueue
    RetriesExhausted { doc_id: Uuid, error: GatewayError },
    /// Best-effort thumbnail regeneration failed (the save succeeded)
    ThumbnailFailed { doc_id: Uuid, error: GatewayError },
}

/// Tuning for debounce and retry.
#[derive(Debug, Clone)]
pub struct SaveQueueConfig {
    /// Idle window after the last enqueue before a flush is issued.
    pub debounce: Duration,
    /// First retry delay after a failed flush; doubles per attempt.
    pub retry_backoff_base: Duration,
    /// Ceiling on the retry delay.
    pub max_retry_interval: Duration,
    /// Retries before the queue parks and surfaces the error.
    /// `None` retries indefinitely (capped backoff).
    pub max_retries: Option<u32>,
}

impl Default for SaveQueueConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(2000),
            retry_backoff_base: Duration::from_millis(1000),
            max_retry_interval: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

/// Exponential backoff: `base * 2^(attempt-1)`, capped.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    base.saturating_mul(1u32 << exp).min(cap)
}

/// One queued payload; destroyed the instant it is merged into a flush.
#[derive(Debug, Clone)]
struct QueuedPatch {
    patch: DocumentPatch,
    enqueued_at: Instant,
}

enum QueueCmd {
    Patch(DocumentPatch),
    FlushNow(oneshot::Sender<Result<(), GatewayError>>),
    Close(oneshot::Sender<Result<(), GatewayError>>),
}

struct DocHandle {
    tx: mpsc::Sender<QueueCmd>,
    task: JoinHandle<()>,
    state: Arc<RwLock<FlushState>>,
}

/// Debounced, coalescing save queue over a [`PersistenceGateway`].
///
/// Shared by every open document of a host; per-document ordering and
/// at-most-one-in-flight are guaranteed, cross-document ordering is not
/// (documents are independent).
pub struct SaveQueue<G: PersistenceGateway> {
    gateway: Arc<G>,
    config: SaveQueueConfig,
    docs: Mutex<HashMap<Uuid, DocHandle>>,
    event_tx: mpsc::Sender<SaveEvent>,
    event_rx: Option<mpsc::Receiver<SaveEvent>>,
}

impl<G: PersistenceGateway> SaveQueue<G> {
    pub fn new(gateway: Arc<G>, config: SaveQueueConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            gateway,
            config,
            docs: Mutex::new(HashMap::new()),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    pub fn with_defaults(gateway: Arc<G>) -> Self {
        Self::new(gateway, SaveQueueConfig::default())
    }

    /// Take the event receiver (can only be called once).
    pub fn take_event_rx(&mut self) -> Option<mpsc::Receiver<SaveEvent>> {
        self.event_rx.take()
    }

    /// Queue a partial update for `doc_id`, (re)arming its debounce timer.
    ///
    /// The first enqueue for a document spawns its worker; the call only
    /// ever waits for channel backpressure, never for the flush itself.
    pub async fn enqueue(&self, kind: DocumentKind, doc_id: Uuid, patch: DocumentPatch) {
        if patch.is_empty() {
            return;
        }
        let tx = self.worker_tx(kind, doc_id).await;
        if tx.send(QueueCmd::Patch(patch)).await.is_err() {
            log::error!("save worker for {doc_id} vanished; edit not queued");
        }
    }

    /// Flush whatever is pending for `doc_id` immediately and await the
    /// result (the explicit-save path).
    pub async fn flush_now(&self, doc_id: Uuid) -> Result<(), SaveError> {
        let tx = match self.existing_tx(doc_id).await {
            Some(tx) => tx,
            // Nothing was ever queued.
            None => return Ok(()),
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if tx.send(QueueCmd::FlushNow(ack_tx)).await.is_err() {
            return Err(SaveError::QueueClosed(doc_id));
        }
        ack_rx
            .await
            .map_err(|_| SaveError::QueueClosed(doc_id))?
            .map_err(SaveError::from)
    }

    /// Close a document's queue: flush anything pending, await any
    /// in-flight write, and retire the worker.
    ///
    /// Never abandons the last edit burst — an in-flight flush always
    /// completes before the close is processed.
    pub async fn close(&self, doc_id: Uuid) -> Result<(), SaveError> {
        let handle = match self.docs.lock().await.remove(&doc_id) {
            Some(handle) => handle,
            None => return Ok(()),
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if handle.tx.send(QueueCmd::Close(ack_tx)).await.is_err() {
            return Err(SaveError::QueueClosed(doc_id));
        }
        let result = ack_rx.await.map_err(|_| SaveError::QueueClosed(doc_id))?;
        if handle.task.await.is_err() {
            log::error!("save worker for {doc_id} panicked during close");
        }
        result.map_err(SaveError::from)
    }

    /// Close every open document's queue.
    pub async fn shutdown(&self) {
        let ids: Vec<Uuid> = self.docs.lock().await.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.close(id).await {
                log::error!("shutdown: final flush for {id} failed: {e}");
            }
        }
    }

    /// Current state of a document's queue, if one exists.
    pub async fn state(&self, doc_id: Uuid) -> Option<FlushState> {
        let docs = self.docs.lock().await;
        let handle = docs.get(&doc_id)?;
        let state = *handle.state.read().await;
        Some(state)
    }

    /// Number of documents with live queue workers.
    pub async fn open_documents(&self) -> usize {
        self.docs.lock().await.len()
    }

    async fn existing_tx(&self, doc_id: Uuid) -> Option<mpsc::Sender<QueueCmd>> {
        self.docs.lock().await.get(&doc_id).map(|h| h.tx.clone())
    }

    /// Get or spawn the worker for a document, returning its command
    /// channel. The sender is cloned out so the docs lock is not held
    /// across channel backpressure.
    async fn worker_tx(&self, kind: DocumentKind, doc_id: Uuid) -> mpsc::Sender<QueueCmd> {
        let mut docs = self.docs.lock().await;
        if let Some(handle) = docs.get(&doc_id) {
            if !handle.tx.is_closed() {
                return handle.tx.clone();
            }
            docs.remove(&doc_id);
        }

        let (tx, rx) = mpsc::channel(256);
        let state = Arc::new(RwLock::new(FlushState::Idle));
        let worker = Worker {
            kind,
            doc_id,
            gateway: self.gateway.clone(),
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            state: state.clone(),
            entries: Vec::new(),
            attempt: 0,
            last_settings: None,
        };
        let task = tokio::spawn(worker.run(rx));
        docs.insert(
            doc_id,
            DocHandle {
                tx: tx.clone(),
                task,
                state,
            },
        );
        log::debug!("spawned save worker for {doc_id}");
        tx
    }
}

/// Per-document queue worker. Owns all queue state for its document.
struct Worker<G: PersistenceGateway> {
    kind: DocumentKind,
    doc_id: Uuid,
    gateway: Arc<G>,
    config: SaveQueueConfig,
    event_tx: mpsc::Sender<SaveEvent>,
    state: Arc<RwLock<FlushState>>,
    entries: Vec<QueuedPatch>,
    /// Failed flushes since the last success.
    attempt: u32,
    /// Settings last seen in a payload, for thumbnail regeneration.
    last_settings: Option<PageSettings>,
}

impl<G: PersistenceGateway> Worker<G> {
    async fn run(mut self, mut rx: mpsc::Receiver<QueueCmd>) {
        loop {
            // ── Idle ──────────────────────────────────────────────
            self.set_state(FlushState::Idle).await;
            match rx.recv().await {
                Some(QueueCmd::Patch(patch)) => {
                    self.push(patch);
                    self.attempt = 0;
                }
                Some(QueueCmd::FlushNow(ack)) => {
                    let result = self.try_flush().await;
                    let _ = ack.send(result);
                    continue;
                }
                Some(QueueCmd::Close(ack)) => {
                    let _ = ack.send(self.try_flush().await);
                    return;
                }
                // Queue dropped: flush leftovers, then die.
                None => {
                    if let Err(e) = self.try_flush().await {
                        log::error!("final flush for {} failed: {e}", self.doc_id);
                    }
                    return;
                }
            }
            if self.entries.is_empty() {
                continue;
            }

            // ── Pending / Flushing ────────────────────────────────
            'pending: loop {
                self.set_state(FlushState::Pending).await;
                let delay = if self.attempt == 0 {
                    self.config.debounce
                } else {
                    backoff_delay(
                        self.attempt,
                        self.config.retry_backoff_base,
                        self.config.max_retry_interval,
                    )
                };
                let sleep = tokio::time::sleep(delay);
                tokio::pin!(sleep);

                loop {
                    tokio::select! {
                        _ = &mut sleep => break,
                        cmd = rx.recv() => match cmd {
                            Some(QueueCmd::Patch(patch)) => {
                                self.push(patch);
                                // A fresh edit restarts the idle window; a
                                // retry wait is not extended by typing.
                                if self.attempt == 0 {
                                    sleep.as_mut().reset(Instant::now() + self.config.debounce);
                                }
                            }
                            Some(QueueCmd::FlushNow(ack)) => {
                                let result = self.try_flush().await;
                                let failed = result.is_err();
                                let _ = ack.send(result);
                                if failed {
                                    self.attempt += 1;
                                    continue 'pending;
                                }
                                break 'pending;
                            }
                            Some(QueueCmd::Close(ack)) => {
                                let _ = ack.send(self.try_flush().await);
                                return;
                            }
                            None => {
                                if let Err(e) = self.try_flush().await {
                                    log::error!("final flush for {} failed: {e}", self.doc_id);
                                }
                                return;
                            }
                        }
                    }
                }

                // Debounce (or backoff) elapsed.
                match self.try_flush().await {
                    Ok(()) => break 'pending,
                    Err(error) => {
                        self.attempt += 1;
                        if let Some(max) = self.config.max_retries {
                            if self.attempt > max {
                                log::error!(
                                    "document {} save retries exhausted after {} attempts: {error}",
                                    self.doc_id,
                                    self.attempt
                                );
                                self.send_event(SaveEvent::RetriesExhausted {
                                    doc_id: self.doc_id,
                                    error,
                                });
                                // Park with the payload retained; the next
                                // enqueue revives the cycle.
                                break 'pending;
                            }
                        }
                        let delay = backoff_delay(
                            self.attempt,
                            self.config.retry_backoff_base,
                            self.config.max_retry_interval,
                        );
                        log::warn!(
                            "flush failed for {} (attempt {}), retrying in {delay:?}: {error}",
                            self.doc_id,
                            self.attempt
                        );
                        self.send_event(SaveEvent::RetryScheduled {
                            doc_id: self.doc_id,
                            attempt: self.attempt,
                            delay,
                        });
                    }
                }
            }
        }
    }

    fn push(&mut self, patch: DocumentPatch) {
        if let Some(settings) = patch.settings {
            self.last_settings = Some(settings);
        }
        self.entries.push(QueuedPatch {
            patch,
            enqueued_at: Instant::now(),
        });
    }

    /// Merge the queued payloads and write them. On failure the merged
    /// payload is restored as the head entry — it is never dropped, and
    /// later enqueues still merge on top of it.
    async fn try_flush(&mut self) -> Result<(), GatewayError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        self.set_state(FlushState::Flushing).await;

        let oldest = self.entries[0].enqueued_at;
        let patch = DocumentPatch::merge_all(self.entries.drain(..).map(|e| e.patch));

        match self.gateway.update(self.kind, self.doc_id, patch.clone()).await {
            Ok(applied) => {
                self.attempt = 0;
                log::debug!(
                    "flushed {} ({:?} after first queued edit)",
                    self.doc_id,
                    oldest.elapsed()
                );
                self.spawn_thumbnail(&applied);
                self.send_event(SaveEvent::Flushed {
                    doc_id: self.doc_id,
                    applied,
                });
                Ok(())
            }
            Err(error) => {
                self.entries.insert(
                    0,
                    QueuedPatch {
                        patch,
                        enqueued_at: oldest,
                    },
                );
                Err(error)
            }
        }
    }

    /// Fire-and-forget thumbnail regeneration for payloads carrying
    /// content. Failure never fails the save.
    fn spawn_thumbnail(&self, applied: &DocumentPatch) {
        let Some(content) = applied.content.clone() else {
            return;
        };
        let settings = self.last_settings.unwrap_or_default();
        let gateway = self.gateway.clone();
        let event_tx = self.event_tx.clone();
        let doc_id = self.doc_id;

        tokio::spawn(async move {
            match gateway.generate_thumbnail(&content, &settings).await {
                Ok(Some(blob)) => {
                    log::trace!("thumbnail regenerated for {doc_id} ({} bytes)", blob.len())
                }
                Ok(None) => {}
                Err(error) => {
                    log::warn!("thumbnail regeneration failed for {doc_id}: {error}");
                    let _ = event_tx.try_send(SaveEvent::ThumbnailFailed { doc_id, error });
                }
            }
        });
    }

    async fn set_state(&self, state: FlushState) {
        *self.state.write().await = state;
    }

    /// Events are advisory; when the host is not listening, drop rather
    /// than stall the worker.
    fn send_event(&self, event: SaveEvent) {
        if self.event_tx.try_send(event).is_err() {
            log::trace!("save event dropped (no listener)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let base = Duration::from_secs(1);
        let cap = Duration::from_secs(30);

        assert_eq!(backoff_delay(1, base, cap), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, base, cap), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, base, cap), Duration::from_secs(4));
        assert_eq!(backoff_delay(5, base, cap), Duration::from_secs(16));
        assert_eq!(backoff_delay(6, base, cap), Duration::from_secs(30));
        assert_eq!(backoff_delay(60, base, cap), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_zero_attempt_is_base() {
        let base = Duration::from_millis(500);
        assert_eq!(
            backoff_delay(0, base, Duration::from_secs(30)),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_default_config_matches_product_defaults() {
        let config = SaveQueueConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(2000));
        assert!(config.max_retries.is_none());
    }
}
