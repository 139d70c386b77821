//! # Topic and subscription handles.
//!
//! [`Topic`] and [`Subscription`] are the provider-agnostic endpoints handed
//! out by the bus. A topic is a shared publish handle (cheap to clone, cached
//! by the bus), a subscription is an exclusive receive stream owned by one
//! consumer.

use std::sync::Arc;

use crate::bus::external::{ExternalSubscription, ExternalTopic};
use crate::bus::memory::{MemorySubscription, MemoryTopic};
use crate::bus::Message;
use crate::error::BusError;

/// Publish handle for one logical topic.
///
/// Clones share the same underlying endpoint, so a topic obtained twice from
/// the bus publishes through one provider connection.
#[derive(Clone, Debug)]
pub struct Topic {
    inner: Arc<TopicInner>,
}

#[derive(Debug)]
struct TopicInner {
    id: String,
    kind: TopicKind,
}

#[derive(Debug)]
enum TopicKind {
    Memory(MemoryTopic),
    External(ExternalTopic),
}

impl Topic {
    pub(crate) fn memory(id: String, topic: MemoryTopic) -> Self {
        Self {
            inner: Arc::new(TopicInner {
                id,
                kind: TopicKind::Memory(topic),
            }),
        }
    }

    pub(crate) fn external(id: String, topic: ExternalTopic) -> Self {
        Self {
            inner: Arc::new(TopicInner {
                id,
                kind: TopicKind::External(topic),
            }),
        }
    }

    /// Logical topic id this handle publishes to.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Publishes one message to every subscription of this topic.
    pub async fn publish(&self, message: Message) -> Result<(), BusError> {
        match &self.inner.kind {
            TopicKind::Memory(topic) => {
                topic.publish(message);
                Ok(())
            }
            TopicKind::External(topic) => topic.publish(message).await,
        }
    }

    /// Releases provider resources held by this topic.
    pub(crate) async fn shutdown(&self) -> Result<(), BusError> {
        match &self.inner.kind {
            TopicKind::Memory(_) => Ok(()),
            TopicKind::External(topic) => topic.shutdown().await,
        }
    }

    /// True if both handles came from the same cache entry.
    pub(crate) fn same_handle(&self, other: &Topic) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Receive stream for one logical topic.
///
/// Subscriptions are never cached or shared; every call to the bus opens a
/// fresh stream.
#[derive(Debug)]
pub struct Subscription {
    id: String,
    kind: SubscriptionKind,
}

#[derive(Debug)]
enum SubscriptionKind {
    Memory(MemorySubscription),
    External(ExternalSubscription),
}

impl Subscription {
    pub(crate) fn memory(id: String, sub: MemorySubscription) -> Self {
        Self {
            id,
            kind: SubscriptionKind::Memory(sub),
        }
    }

    pub(crate) fn external(id: String, sub: ExternalSubscription) -> Self {
        Self {
            id,
            kind: SubscriptionKind::External(sub),
        }
    }

    /// Logical topic id this subscription listens on.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Waits for the next message on this topic.
    pub async fn receive(&mut self) -> Result<Message, BusError> {
        match &mut self.kind {
            SubscriptionKind::Memory(sub) => sub.receive().await,
            SubscriptionKind::External(sub) => sub.receive().await,
        }
    }

    /// Detaches from the topic and releases provider resources.
    pub async fn shutdown(self) -> Result<(), BusError> {
        match self.kind {
            SubscriptionKind::Memory(_) => Ok(()),
            SubscriptionKind::External(sub) => sub.shutdown().await,
        }
    }
}
