//! # Lifecycle hook registry.
//!
//! Ordered pre-start and post-stop callbacks around the component group's
//! lifetime. Registration order is execution order: later-registered cleanup
//! may depend on earlier-registered setup.
//!
//! ## Rules
//! - Pre-start hooks run sequentially **before** any component starts;
//!   the first error aborts the run.
//! - Post-stop hooks run sequentially **after** every component stopped;
//!   errors are logged and the sequence continues (best-effort cleanup).
//! - The registry is shared through [`Handle`](crate::Handle), so components
//!   may register cleanup from within `init`.
//! - Execution snapshots the list; hooks registered mid-run are not picked up.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// Stored lifecycle callback.
///
/// The token passed in differs per phase: pre-start hooks receive the live
/// root token, post-stop hooks receive a token tied to the shutdown budget.
pub type HookFn =
    Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Ordered registry of pre-start and post-stop callbacks.
#[derive(Default)]
pub struct Hooks {
    on_start: Mutex<Vec<HookFn>>,
    on_stop: Mutex<Vec<HookFn>>,
}

impl Hooks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pre-start hook.
    ///
    /// ## Example
    /// ```
    /// use servisor::Hooks;
    ///
    /// let hooks = Hooks::new();
    /// hooks.on_start(|_ctx| async { Ok(()) });
    /// ```
    pub fn on_start<F, Fut>(&self, f: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.lock(&self.on_start).push(wrap(f));
    }

    /// Appends a post-stop hook.
    pub fn on_stop<F, Fut>(&self, f: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.lock(&self.on_stop).push(wrap(f));
    }

    /// Snapshot of the pre-start sequence in registration order.
    pub(crate) fn start_hooks(&self) -> Vec<HookFn> {
        self.lock(&self.on_start).clone()
    }

    /// Snapshot of the post-stop sequence in registration order.
    pub(crate) fn stop_hooks(&self) -> Vec<HookFn> {
        self.lock(&self.on_stop).clone()
    }

    fn lock<'a>(&self, list: &'a Mutex<Vec<HookFn>>) -> std::sync::MutexGuard<'a, Vec<HookFn>> {
        list.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn wrap<F, Fut>(f: F) -> HookFn
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}
