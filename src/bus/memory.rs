//! # In-memory provider.
//!
//! One bounded [`tokio::sync::broadcast`] channel per topic id, shared by
//! publishers and subscriptions through [`MemoryChannels`]. The table is what
//! lets a subscription opened before the topic handle (or after it) bind to
//! the same channel.
//!
//! ## Rules
//! - **Fire-and-forget publish**: with no live subscriptions the message is
//!   dropped; `publish` never blocks.
//! - **Fan-out**: every subscription receives every message published after
//!   it was opened.
//! - **Lag handling**: a subscription that falls more than the channel
//!   capacity behind skips the lost messages and keeps receiving.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::warn;

use crate::bus::Message;
use crate::error::BusError;

/// Ring-buffer capacity of each per-topic channel.
pub(crate) const CHANNEL_CAPACITY: usize = 1024;

/// Table of per-topic broadcast channels.
#[derive(Debug)]
pub(crate) struct MemoryChannels {
    channels: Mutex<HashMap<String, broadcast::Sender<Message>>>,
    capacity: usize,
}

impl MemoryChannels {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the channel for `id`, creating it on first use.
    pub(crate) fn sender(&self, id: &str) -> broadcast::Sender<Message> {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for MemoryChannels {
    fn default() -> Self {
        Self::new(CHANNEL_CAPACITY)
    }
}

/// Publish endpoint backed by a broadcast channel.
#[derive(Debug)]
pub(crate) struct MemoryTopic {
    tx: broadcast::Sender<Message>,
}

impl MemoryTopic {
    pub(crate) fn new(tx: broadcast::Sender<Message>) -> Self {
        Self { tx }
    }

    /// Publishes to all live subscriptions; drops the message if there are none.
    pub(crate) fn publish(&self, message: Message) {
        let _ = self.tx.send(message);
    }
}

/// Receive endpoint bound to one topic channel.
#[derive(Debug)]
pub(crate) struct MemorySubscription {
    id: String,
    rx: broadcast::Receiver<Message>,
}

impl MemorySubscription {
    pub(crate) fn new(id: String, rx: broadcast::Receiver<Message>) -> Self {
        Self { id, rx }
    }

    /// Waits for the next message.
    ///
    /// Skips over messages lost to channel overrun; returns
    /// [`BusError::Closed`] once every sender is gone.
    pub(crate) async fn receive(&mut self) -> Result<Message, BusError> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Ok(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(topic = %self.id, skipped, "subscription lagged; skipping lost messages");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(BusError::Closed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_shared_between_topic_and_subscription() {
        let channels = MemoryChannels::default();
        let mut sub =
            MemorySubscription::new("jobs".to_string(), channels.sender("jobs").subscribe());
        let topic = MemoryTopic::new(channels.sender("jobs"));

        topic.publish(Message::new("one"));
        let got = sub.receive().await.expect("message must arrive");
        assert_eq!(got.body, b"one", "both ends must share one channel");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let channels = MemoryChannels::default();
        let topic = MemoryTopic::new(channels.sender("void"));
        // must not block or fail
        topic.publish(Message::new("lost"));
    }

    #[tokio::test]
    async fn test_lagged_subscription_skips_and_recovers() {
        let channels = MemoryChannels::new(1);
        let mut sub =
            MemorySubscription::new("hot".to_string(), channels.sender("hot").subscribe());
        let topic = MemoryTopic::new(channels.sender("hot"));

        topic.publish(Message::new("a"));
        topic.publish(Message::new("b"));
        topic.publish(Message::new("c"));

        let got = sub.receive().await.expect("subscription must recover");
        assert_eq!(got.body, b"c", "only the newest message survives overrun");
    }
}
