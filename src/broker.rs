//! Message broker
//!
//! Fan-out publish/subscribe used to push change notifications to live
//! client connections. Every subscriber owns a bounded inbox; publishing
//! never blocks on a slow subscriber. When an inbox is full the message is
//! dropped for that subscriber, and a subscriber that stays full for
//! `max_full_strikes` publishes in a row is treated as gone and removed.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub use tokio::sync::mpsc::error::TryRecvError;

/// Message kind announcing that a new tree snapshot was published.
pub const TREE_SYNCED: &str = "tree-synced";

pub type SubscriberId = u64;

/// An event unit: a kind tag and free-form text. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: Arc<str>,
    text: Arc<str>,
}

impl Message {
    pub fn new(kind: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Broker configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Per-subscriber inbox capacity
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
    /// Consecutive full-inbox publishes before a subscriber is dropped
    #[serde(default = "default_max_full_strikes")]
    pub max_full_strikes: u32,
}

fn default_inbox_capacity() -> usize {
    32
}

fn default_max_full_strikes() -> u32 {
    3
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: default_inbox_capacity(),
            max_full_strikes: default_max_full_strikes(),
        }
    }
}

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
    pub removed: usize,
}

struct Subscriber {
    tx: mpsc::Sender<Message>,
    strikes: AtomicU32,
}

/// Receiving end of one subscription. Yields `None` once the subscriber
/// has been removed or the broker shut down and buffered messages drained.
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::Receiver<Message>,
}

impl Inbox {
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Message, TryRecvError> {
        self.rx.try_recv()
    }

    /// Blocking receive for use outside an async runtime.
    pub fn blocking_recv(&mut self) -> Option<Message> {
        self.rx.blocking_recv()
    }
}

pub struct MessageBroker {
    config: BrokerConfig,
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Default for MessageBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl MessageBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config: BrokerConfig {
                inbox_capacity: config.inbox_capacity.max(1),
                max_full_strikes: config.max_full_strikes.max(1),
            },
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Register a consumer. After shutdown the returned inbox is already closed.
    pub fn subscribe(&self) -> (SubscriberId, Inbox) {
        let (tx, rx) = mpsc::channel(self.config.inbox_capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subscribers = self.subscribers.write();
        if self.closed.load(Ordering::Acquire) {
            drop(tx);
        } else {
            subscribers.insert(
                id,
                Subscriber {
                    tx,
                    strikes: AtomicU32::new(0),
                },
            );
            debug!(subscriber = id, total = subscribers.len(), "Subscribed");
        }
        (id, Inbox { rx })
    }

    /// Remove a consumer. Idempotent; returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            debug!(subscriber = id, "Unsubscribed");
        }
        removed
    }

    /// Deliver `message` to every registered subscriber without blocking.
    pub fn publish(&self, message: Message) -> PublishReport {
        let mut report = PublishReport::default();
        let mut gone = Vec::new();
        {
            let subscribers = self.subscribers.read();
            for (id, subscriber) in subscribers.iter() {
                match subscriber.tx.try_send(message.clone()) {
                    Ok(()) => {
                        subscriber.strikes.store(0, Ordering::Relaxed);
                        report.delivered += 1;
                    }
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        report.dropped += 1;
                        let strikes = subscriber.strikes.fetch_add(1, Ordering::Relaxed) + 1;
                        if strikes >= self.config.max_full_strikes {
                            gone.push(*id);
                        }
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => gone.push(*id),
                }
            }
        }

        if !gone.is_empty() {
            let mut subscribers = self.subscribers.write();
            for id in gone {
                if subscribers.remove(&id).is_some() {
                    report.removed += 1;
                    debug!(subscriber = id, "Dropped unresponsive subscriber");
                }
            }
        }
        report
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close every inbox. Consumers drain what is buffered, then see `None`.
    pub fn shutdown(&self) {
        let mut subscribers = self.subscribers.write();
        self.closed.store(true, Ordering::Release);
        let count = subscribers.len();
        subscribers.clear();
        info!(subscribers = count, "Message broker shut down");
    }
}

/// Transport side of one subscription, e.g. a WebSocket write half.
#[async_trait]
pub trait MessageSink: Send {
    type Error: std::fmt::Display + Send;

    async fn send(&mut self, message: &Message) -> Result<(), Self::Error>;

    /// Resolves when the peer is gone. Transports that cannot tell never resolve.
    async fn closed(&mut self) {
        std::future::pending::<()>().await
    }
}

/// Why a forwarding loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardEnd {
    /// The broker shut down or removed the subscriber.
    InboxClosed,
    /// The sink reported its peer gone while waiting.
    SinkClosed,
    /// Writing to the sink failed.
    SinkFailed(String),
}

struct SubscriptionGuard {
    broker: Arc<MessageBroker>,
    id: SubscriberId,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.broker.unsubscribe(self.id);
    }
}

/// Subscribe and drain the inbox into `sink` until either side goes away.
///
/// The subscription is released on every exit path, including the future
/// being dropped, and the sink is dropped before returning.
pub async fn forward<S: MessageSink>(broker: Arc<MessageBroker>, mut sink: S) -> ForwardEnd {
    let (id, mut inbox) = broker.subscribe();
    let _guard = SubscriptionGuard {
        broker: Arc::clone(&broker),
        id,
    };

    loop {
        let message = tokio::select! {
            message = inbox.recv() => message,
            _ = sink.closed() => {
                debug!(subscriber = id, "Sink closed, unsubscribing");
                return ForwardEnd::SinkClosed;
            }
        };
        let Some(message) = message else {
            return ForwardEnd::InboxClosed;
        };
        if let Err(e) = sink.send(&message).await {
            debug!(subscriber = id, error = %e, "Sink write failed, unsubscribing");
            return ForwardEnd::SinkFailed(e.to_string());
        }
    }
}
