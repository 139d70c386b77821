//! # Per-topic configuration.
//!
//! [`TopicOption`] entries are supplied to [`EventBus::init`](crate::EventBus::init)
//! before first use, typically deserialized from a configuration file the
//! caller loaded. A topic with no entry (or an explicit `memory` provider)
//! is backed by the in-process provider; `external` entries carry the broker
//! settings under [`ExternalOption`].
//!
//! ## Wire shape (JSON)
//! ```json
//! {
//!   "provider": "external",
//!   "topic_id": "orders",
//!   "external": {
//!     "brokers": ["10.0.0.5:9092", "10.0.0.6:9092"],
//!     "topic": "orders-v1",
//!     "subscription": { "group": "billing" }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Transport backing a topic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// In-process channel-backed topic (the default).
    #[default]
    Memory,
    /// Externally-configured broker connection.
    External,
}

/// Configuration entry for one logical topic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicOption {
    /// Which provider backs the topic.
    pub provider: Provider,

    /// The logical topic identifier this entry applies to.
    pub topic_id: String,

    /// Broker settings; required only for [`Provider::External`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalOption>,
}

impl TopicOption {
    /// Creates an in-memory entry for `topic_id`.
    pub fn memory(topic_id: impl Into<String>) -> Self {
        Self {
            provider: Provider::Memory,
            topic_id: topic_id.into(),
            external: None,
        }
    }

    /// Creates an external entry for `topic_id` with the given broker settings.
    pub fn external(topic_id: impl Into<String>, external: ExternalOption) -> Self {
        Self {
            provider: Provider::External,
            topic_id: topic_id.into(),
            external: Some(external),
        }
    }
}

/// Broker settings for an external topic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalOption {
    /// Broker addresses, tried in order until one accepts a connection.
    pub brokers: Vec<String>,

    /// Remote topic name. Empty means "same as the logical topic id".
    pub topic: String,

    /// Consumer settings; required only to open subscriptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionOption>,
}

impl ExternalOption {
    /// Creates broker settings for the given addresses and remote topic name.
    pub fn new(brokers: Vec<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers,
            topic: topic.into(),
            subscription: None,
        }
    }

    /// Sets the consumer group (builder style).
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.subscription = Some(SubscriptionOption {
            group: group.into(),
        });
        self
    }

    /// Remote topic name to use on the broker, falling back to the logical id.
    pub(crate) fn remote_topic(&self, logical: &str) -> String {
        if self.topic.is_empty() {
            logical.to_string()
        } else {
            self.topic.clone()
        }
    }
}

/// Consumer settings for external subscriptions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionOption {
    /// Consumer-group identifier; required for external subscriptions.
    pub group: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_external_entry() {
        let opt: TopicOption = serde_json::from_str(
            r#"{
                "provider": "external",
                "topic_id": "orders",
                "external": {
                    "brokers": ["127.0.0.1:9092"],
                    "topic": "orders-v1",
                    "subscription": { "group": "billing" }
                }
            }"#,
        )
        .expect("entry must deserialize");

        assert_eq!(opt.provider, Provider::External);
        assert_eq!(opt.topic_id, "orders");
        let external = opt.external.expect("external block must be present");
        assert_eq!(external.brokers, vec!["127.0.0.1:9092".to_string()]);
        assert_eq!(external.topic, "orders-v1");
        assert_eq!(
            external.subscription.map(|s| s.group),
            Some("billing".to_string())
        );
    }

    #[test]
    fn test_provider_defaults_to_memory() {
        let opt: TopicOption =
            serde_json::from_str(r#"{"topic_id":"jobs"}"#).expect("entry must deserialize");
        assert_eq!(opt.provider, Provider::Memory);
        assert!(opt.external.is_none());
    }

    #[test]
    fn test_builders_match_serde_shape() {
        let built = TopicOption::external(
            "orders",
            ExternalOption::new(vec!["b1:9092".to_string()], "orders-v1").with_group("billing"),
        );
        let encoded = serde_json::to_string(&built).expect("entry must encode");
        let parsed: TopicOption = serde_json::from_str(&encoded).expect("entry must decode");
        assert_eq!(parsed, built);
    }
}
