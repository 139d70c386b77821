//! # Message model.
//!
//! [`Message`] is the unit of data carried by topics: an opaque body plus
//! string metadata. Both survive the round trip through either provider
//! unchanged (identity is asserted by the bus tests).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A published unit of data: opaque body plus string metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque payload bytes.
    pub body: Vec<u8>,

    /// Transport metadata attached by the publisher.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Message {
    /// Creates a message from the given body.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attaches one metadata entry (builder style).
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_attaches_metadata() {
        let msg = Message::new("payload")
            .with_metadata("kind", "order")
            .with_metadata("region", "eu");
        assert_eq!(msg.body, b"payload");
        assert_eq!(msg.metadata.get("kind").map(String::as_str), Some("order"));
        assert_eq!(msg.metadata.len(), 2);
    }

    #[test]
    fn test_serde_round_trip_identity() {
        let msg = Message::new(vec![0u8, 159, 146, 150]).with_metadata("k", "v");
        let encoded = serde_json::to_vec(&msg).expect("message must encode");
        let decoded: Message = serde_json::from_slice(&encoded).expect("message must decode");
        assert_eq!(decoded, msg, "body and metadata must survive the codec");
    }
}
