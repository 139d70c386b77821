//! # Function-backed component (`ComponentFn`)
//!
//! [`ComponentFn`] wraps a closure `F: Fn(CancellationToken) -> Fut` as a
//! one-shot command component: `start` runs the closure's future once and
//! returns its result. Because the group applies first-terminal-wins, a
//! completed command ends the whole run, which is the usual shape for batch
//! jobs and process-style entrypoints.
//!
//! ## Concurrency semantics
//! - Each `start` call builds a **new** future owning its own state.
//! - Shared state across instances must be explicit (`Arc<...>` captured by
//!   the closure).
//!
//! ## Example
//! ```
//! use tokio_util::sync::CancellationToken;
//! use servisor::{ComponentFn, ComponentRef, ComponentError};
//!
//! let cmd: ComponentRef = ComponentFn::arc("migrate", |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Ok(());
//!     }
//!     // run the job...
//!     Ok::<_, ComponentError>(())
//! });
//!
//! assert_eq!(cmd.name(), "migrate");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::component::Component;
use crate::error::ComponentError;

/// Function-backed component implementation.
///
/// Wraps a closure that *creates* a new future per start.
#[derive(Debug)]
pub struct ComponentFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ComponentFn<F> {
    /// Creates a new function-backed component.
    ///
    /// Prefer [`ComponentFn::arc`] when you immediately need a
    /// [`ComponentRef`](crate::ComponentRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the component and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Component for ComponentFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ComponentError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        (self.f)(ctx).await
    }
}
