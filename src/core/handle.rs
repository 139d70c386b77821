//! # Capability handle passed to components at init.
//!
//! [`Handle`] is the narrow surface a component sees instead of the concrete
//! [`Supervisor`](crate::Supervisor): event-bus access, configuration,
//! process identity, hook registration, health aggregation, and an explicit
//! close trigger. Components hold the handle; the supervisor holds the
//! components. Neither side holds the other's concrete type.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::component::{ComponentRef, HealthList};
use crate::core::{Config, Hooks, Options};

/// Narrow capability surface handed to [`Component::init`](crate::Component::init).
///
/// Cheap to clone: every field is shared. Handles stay valid for the
/// lifetime of the supervisor that issued them.
#[derive(Clone)]
pub struct Handle {
    pub(crate) bus: Arc<EventBus>,
    pub(crate) config: Arc<Config>,
    pub(crate) options: Arc<Options>,
    pub(crate) hooks: Arc<Hooks>,
    pub(crate) health: Arc<HealthList>,
    pub(crate) root: CancellationToken,
}

impl Handle {
    /// The shared event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Application configuration values.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Identity and shutdown settings of the running process.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Lifecycle hook registry, for registering cleanup during `init`.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Snapshot of every component deployed so far, for health aggregation.
    pub fn health_checks(&self) -> Vec<ComponentRef> {
        self.health.snapshot()
    }

    /// Requests coordinated shutdown of the whole component group.
    ///
    /// Equivalent to an OS termination signal: the run ends cleanly unless
    /// some component fails while unwinding.
    pub fn close(&self) {
        self.root.cancel();
    }
}
