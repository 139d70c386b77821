//! # Event bus.
//!
//! Hands out [`Topic`] and [`Subscription`] endpoints for logical topic ids,
//! backed by the provider each id is configured with. Unconfigured ids fall
//! back to the in-memory provider.
//!
//! ## Architecture
//! ```text
//!   init(options) ─────▶ ┌───────────────┐
//!                        │ option table  │ topic id → provider settings
//!                        └───────┬───────┘
//!                                ▼
//!   topic(id) ──────────▶ ┌─────────────┐ hit ──▶ shared Topic handle
//!                         │ topic cache │
//!                         └──────┬──────┘
//!                                ▼ miss
//!                         open provider endpoint, cache it
//!
//!   subscription(id) ───▶ always opens a fresh stream (never cached)
//! ```
//!
//! ## Rules
//! - **Lazy connections**: nothing is dialed at `init`; the first `topic` or
//!   `subscription` call for an id pays the connection cost.
//! - **Shared topics, exclusive subscriptions**: topic handles are cached and
//!   shared, subscriptions belong to exactly one consumer.
//! - **Fail fast**: incomplete external settings (no brokers, no consumer
//!   group) are reported before any connection attempt.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use crate::bus::external::{ExternalSubscription, ExternalTopic};
use crate::bus::memory::{MemoryChannels, MemorySubscription, MemoryTopic};
use crate::bus::options::{ExternalOption, Provider, TopicOption};
use crate::bus::topic::{Subscription, Topic};
use crate::error::BusError;

/// Topic registry with per-topic provider configuration.
#[derive(Debug)]
pub struct EventBus {
    options: RwLock<HashMap<String, TopicOption>>,
    topics: RwLock<HashMap<String, Topic>>,
    channels: MemoryChannels,
}

impl EventBus {
    /// Creates an empty bus; every topic defaults to the memory provider
    /// until [`init`](Self::init) configures it otherwise.
    pub fn new() -> Self {
        Self {
            options: RwLock::new(HashMap::new()),
            topics: RwLock::new(HashMap::new()),
            channels: MemoryChannels::default(),
        }
    }

    /// Registers provider settings, keyed by each entry's `topic_id`.
    ///
    /// Later calls override earlier entries for the same id. Only settings
    /// are touched; no connection is opened here.
    pub fn init<I>(&self, options: I)
    where
        I: IntoIterator<Item = TopicOption>,
    {
        let mut table = self
            .options
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for option in options {
            if option.topic_id.is_empty() {
                warn!("ignoring topic option with empty topic_id");
                continue;
            }
            table.insert(option.topic_id.clone(), option);
        }
    }

    /// Returns the shared publish handle for `id`, opening it on first use.
    ///
    /// Handles are cached: every caller sees the same endpoint for the same
    /// id until [`close`](Self::close).
    pub async fn topic(&self, id: &str) -> Result<Topic, BusError> {
        if let Some(topic) = self.cached(id) {
            return Ok(topic);
        }

        let option = self.resolve(id);
        let opened = self.open_topic(id, &option).await?;

        // another caller may have opened the same id while we were connecting
        let existing = {
            let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
            match topics.get(id) {
                Some(existing) => Some(existing.clone()),
                None => {
                    topics.insert(id.to_string(), opened.clone());
                    None
                }
            }
        };
        if let Some(existing) = existing {
            let _ = opened.shutdown().await;
            return Ok(existing);
        }
        Ok(opened)
    }

    /// Opens a fresh receive stream for `id`.
    ///
    /// Unlike topics, subscriptions are never cached: each call binds its own
    /// stream, so independent consumers each see every message.
    pub async fn subscription(&self, id: &str) -> Result<Subscription, BusError> {
        let option = self.resolve(id);
        match option.provider {
            Provider::Memory => {
                let rx = self.channels.sender(id).subscribe();
                let sub = MemorySubscription::new(id.to_string(), rx);
                Ok(Subscription::memory(id.to_string(), sub))
            }
            Provider::External => {
                let external = external_option(id, &option)?;
                let group = external
                    .subscription
                    .as_ref()
                    .map(|s| s.group.clone())
                    .filter(|g| !g.is_empty())
                    .ok_or_else(|| BusError::MissingGroup {
                        topic: id.to_string(),
                    })?;
                let remote = external.remote_topic(id);
                debug!(topic = %id, remote = %remote, group = %group, "opening external subscription");
                let sub = ExternalSubscription::open(&external.brokers, remote, group).await?;
                Ok(Subscription::external(id.to_string(), sub))
            }
        }
    }

    /// Shuts down every cached topic and empties the cache.
    ///
    /// All endpoints are attempted even when some fail; the failures are
    /// reported together in [`BusError::Shutdown`].
    pub async fn close(&self) -> Result<(), BusError> {
        let drained: Vec<(String, Topic)> = {
            let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
            topics.drain().collect()
        };

        let mut failures = Vec::new();
        for (id, topic) in drained {
            if let Err(error) = topic.shutdown().await {
                warn!(topic = %id, error = %error, "topic shutdown failed");
                failures.push((id, error));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BusError::Shutdown { failures })
        }
    }

    fn cached(&self, id: &str) -> Option<Topic> {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn resolve(&self, id: &str) -> TopicOption {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .unwrap_or_else(|| TopicOption::memory(id))
    }

    async fn open_topic(&self, id: &str, option: &TopicOption) -> Result<Topic, BusError> {
        match option.provider {
            Provider::Memory => {
                let topic = MemoryTopic::new(self.channels.sender(id));
                Ok(Topic::memory(id.to_string(), topic))
            }
            Provider::External => {
                let external = external_option(id, option)?;
                let remote = external.remote_topic(id);
                debug!(topic = %id, remote = %remote, "opening external topic");
                let topic = ExternalTopic::open(&external.brokers, remote).await?;
                Ok(Topic::external(id.to_string(), topic))
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn external_option<'a>(id: &str, option: &'a TopicOption) -> Result<&'a ExternalOption, BusError> {
    option
        .external
        .as_ref()
        .filter(|external| !external.brokers.is_empty())
        .ok_or_else(|| BusError::MissingBrokers {
            topic: id.to_string(),
        })
}
