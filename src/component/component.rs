//! # Component abstraction.
//!
//! This module defines the [`Component`] trait, the polymorphic unit of work
//! the supervisor deploys, and [`ComponentRef`], the shared handle type
//! (`Arc<dyn Component>`) used across the runtime.
//!
//! ## Lifecycle
//! ```text
//! init(handle)  — exactly once, before start; capability wiring
//! start(ctx)    — the component's lifetime; must select on ctx
//! stop(ctx)     — exactly once, during group shutdown; ctx is already
//!                 cancelled; safe to run concurrently with an in-flight start
//! ```
//!
//! A server-like component satisfies this contract unchanged; "server" is a
//! naming convention, not a distinct type.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::Handle;
use crate::error::ComponentError;

/// Shared handle to a component.
pub type ComponentRef = Arc<dyn Component>;

/// # Named unit of work with a supervised lifecycle.
///
/// All methods take `&self`: the supervisor keeps one shared instance and
/// calls `stop` while `start` may still be in flight, so state that `stop`
/// must reach lives behind interior mutability.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use servisor::{Component, ComponentError};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Component for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
///         ctx.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Returns a stable, human-readable component name.
    fn name(&self) -> &str;

    /// Wires capabilities before start. Invoked exactly once per instance.
    ///
    /// An error aborts the whole deploy batch; nothing from the batch is
    /// registered or started.
    async fn init(&self, handle: Handle) -> Result<(), ComponentError> {
        let _ = handle;
        Ok(())
    }

    /// Runs the component until completion, failure, or cancellation.
    ///
    /// Returning (with or without an error) is the terminal event for the
    /// whole component group. Long-lived components block here and exit when
    /// `ctx` is cancelled.
    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError>;

    /// Releases resources during group shutdown. Invoked exactly once,
    /// regardless of whether `start` returned or is still running.
    ///
    /// `ctx` is the component's private token and is already cancelled when
    /// `stop` runs.
    async fn stop(&self, ctx: CancellationToken) {
        let _ = ctx;
    }

    /// Reports current health. Defaults to healthy.
    fn check_health(&self) -> Result<(), ComponentError> {
        Ok(())
    }
}
