//! # Component model.
//!
//! Everything the supervisor runs implements [`Component`]: a named unit with
//! a setup phase, a cancellable run phase, and an optional health probe.
//! [`ComponentFn`] lifts plain async closures into components, [`Subscriber`]
//! is the bus-consuming flavor, and [`ProduceOption`] sizes factory
//! deployments.

mod component;
mod func;
mod health;
mod producer;
mod subscriber;

pub use component::{Component, ComponentRef};
pub use func::ComponentFn;
pub use health::Health;
pub(crate) use health::HealthList;
pub use producer::ProduceOption;
pub use subscriber::{MessageHandler, Subscriber};
