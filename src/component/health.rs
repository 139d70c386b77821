//! # Health reporting helpers.
//!
//! [`Health`] is a shared healthy/unhealthy flag components can flip from
//! their `start` loop and read back from `check_health`. The supervisor
//! additionally keeps a [`HealthList`] of every deployed component so
//! callers (e.g. an HTTP health endpoint component) can aggregate checks
//! through [`Handle::health_checks`](crate::Handle::health_checks).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::component::ComponentRef;
use crate::error::ComponentError;

/// Shared healthy/unhealthy flag.
///
/// Starts unhealthy; components typically flip it once their `start` loop
/// is serving and flip it back on the way out.
#[derive(Debug, Default)]
pub struct Health {
    healthy: AtomicBool,
}

impl Health {
    /// Creates a flag with the given initial state.
    pub fn new(healthy: bool) -> Self {
        Self {
            healthy: AtomicBool::new(healthy),
        }
    }

    /// Sets the current state.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Release);
    }

    /// Returns the current state.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Returns `Ok(())` when healthy, [`ComponentError::Unhealthy`] otherwise.
    pub fn check(&self) -> Result<(), ComponentError> {
        if self.is_healthy() {
            Ok(())
        } else {
            Err(ComponentError::Unhealthy)
        }
    }
}

/// Accumulating list of health-checkable components, shared between the
/// supervisor and every issued handle.
#[derive(Default)]
pub(crate) struct HealthList {
    components: Mutex<Vec<ComponentRef>>,
}

impl HealthList {
    pub(crate) fn push(&self, component: ComponentRef) {
        self.lock().push(component);
    }

    pub(crate) fn snapshot(&self) -> Vec<ComponentRef> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ComponentRef>> {
        self.components
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
