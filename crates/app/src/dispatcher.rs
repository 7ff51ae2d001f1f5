//! Event dispatcher — a bounded queue in front of the card event handler.
//!
//! Producers (the HTTP API) enqueue [`CardEvent`]s through a cloneable
//! [`DispatcherHandle`] without waiting for them to be processed. A single
//! worker drains the queue in FIFO order, so events for a card are applied
//! in the order they were accepted.
//!
//! Deduplication is off by default. With a non-zero window, an event whose
//! full payload was already accepted in the same time bucket is dropped, which
//! absorbs redelivered requests without ever merging two distinct events.
//! Failed events are logged and dropped; nothing is retried.

use std::collections::{HashSet, VecDeque};

use chrono::TimeDelta;
use tokio::sync::{mpsc, oneshot};

use kanflow_domain::id::CardId;
use kanflow_domain::time::{self, Timestamp};

use crate::card_events::{CardEvent, CardEventProcessor};

/// Queue sizing and deduplication settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub queue_capacity: usize,
    /// Width of the deduplication bucket; `0` (the default) disables deduplication.
    pub dedupe_window_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            dedupe_window_ms: 0,
        }
    }
}

/// Why an event was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("event queue is full")]
    QueueFull,
    #[error("event dispatcher has stopped")]
    Closed,
}

/// Identity of an event for deduplication purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    pub card_id: CardId,
    pub kind: &'static str,
    /// See [`CardEvent::fingerprint`].
    pub payload: String,
    pub bucket: i64,
}

impl IdempotencyKey {
    #[must_use]
    pub fn new(event: &CardEvent, received_at: Timestamp, window_ms: u64) -> Self {
        Self {
            card_id: event.card_id(),
            kind: event.kind(),
            payload: event.fingerprint(),
            bucket: time::bucket(received_at, window_ms),
        }
    }
}

/// Keys seen recently; entries expire after two windows.
struct RecentKeys {
    ttl: TimeDelta,
    seen: HashSet<IdempotencyKey>,
    order: VecDeque<(Timestamp, IdempotencyKey)>,
}

impl RecentKeys {
    fn new(window_ms: u64) -> Self {
        let ms = i64::try_from(window_ms.saturating_mul(2)).unwrap_or(i64::MAX);
        Self {
            ttl: TimeDelta::try_milliseconds(ms).unwrap_or(TimeDelta::MAX),
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    /// Returns `false` when `key` was already seen.
    fn insert(&mut self, key: IdempotencyKey, at: Timestamp) -> bool {
        while let Some((seen_at, _)) = self.order.front() {
            if at - *seen_at <= self.ttl {
                break;
            }
            if let Some((_, expired)) = self.order.pop_front() {
                self.seen.remove(&expired);
            }
        }
        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.order.push_back((at, key));
        true
    }
}

enum Job {
    Event {
        event: CardEvent,
        received_at: Timestamp,
    },
    Flush(oneshot::Sender<()>),
}

/// Producer side of the queue.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    sender: mpsc::Sender<Job>,
}

impl DispatcherHandle {
    /// Enqueue an event without waiting for it to be processed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::QueueFull`] when the queue is at capacity and
    /// [`DispatchError::Closed`] once the worker has stopped.
    pub fn dispatch(&self, event: CardEvent) -> Result<(), DispatchError> {
        self.dispatch_at(event, time::now())
    }

    fn dispatch_at(&self, event: CardEvent, received_at: Timestamp) -> Result<(), DispatchError> {
        self.sender
            .try_send(Job::Event { event, received_at })
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
            })
    }

    /// Wait until every event enqueued before this call has been processed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] when the worker has stopped.
    pub async fn flush(&self) -> Result<(), DispatchError> {
        let (done, wait) = oneshot::channel();
        self.sender
            .send(Job::Flush(done))
            .await
            .map_err(|_| DispatchError::Closed)?;
        wait.await.map_err(|_| DispatchError::Closed)
    }
}

/// Consumer side of the queue; run it on its own task.
pub struct Dispatcher<P> {
    receiver: mpsc::Receiver<Job>,
    processor: P,
    dedupe_window_ms: u64,
    recent: RecentKeys,
}

impl<P: CardEventProcessor> Dispatcher<P> {
    /// Create the worker and the handle used to feed it.
    #[must_use]
    pub fn new(processor: P, config: DispatcherConfig) -> (Self, DispatcherHandle) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let dispatcher = Self {
            receiver,
            processor,
            dedupe_window_ms: config.dedupe_window_ms,
            recent: RecentKeys::new(config.dedupe_window_ms),
        };
        (dispatcher, DispatcherHandle { sender })
    }

    /// Process events until every handle has been dropped.
    pub async fn run(mut self) {
        tracing::info!("event dispatcher started");
        while let Some(job) = self.receiver.recv().await {
            match job {
                Job::Event { event, received_at } => self.handle(event, received_at).await,
                Job::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::info!("event dispatcher stopped");
    }

    async fn handle(&mut self, event: CardEvent, received_at: Timestamp) {
        if self.dedupe_window_ms > 0 {
            let key = IdempotencyKey::new(&event, received_at, self.dedupe_window_ms);
            if !self.recent.insert(key, received_at) {
                tracing::debug!(
                    card_id = %event.card_id(),
                    kind = event.kind(),
                    "duplicate event dropped"
                );
                return;
            }
        }
        let card_id = event.card_id();
        let kind = event.kind();
        let target = event.target().map(str::to_string);
        if let Err(err) = self.processor.process(event).await {
            tracing::error!(%card_id, kind, ?target, error = %err, "card event failed");
        }
    }
}
