//! # Pluggable event bus.
//!
//! Topic-addressed messaging behind one interface: [`EventBus`] resolves
//! logical topic ids to provider endpoints, [`Topic`] publishes, and
//! [`Subscription`] receives. The memory provider runs in-process; the
//! external provider speaks a framed JSON protocol to a broker over TCP.

mod bus;
mod external;
mod memory;
mod message;
mod options;
mod topic;
mod wire;

pub use bus::EventBus;
pub use message::Message;
pub use options::{ExternalOption, Provider, SubscriptionOption, TopicOption};
pub use topic::{Subscription, Topic};
