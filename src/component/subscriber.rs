//! # Bus-driven subscriber component.
//!
//! [`Subscriber`] bridges the bus into the component lifecycle: it opens a
//! subscription when started, feeds every message through a handler, and
//! reports healthy only while the stream is live.
//!
//! ### Notes
//! - One message is in flight at a time; the next receive waits for the
//!   handler to finish.
//! - A handler error is logged and the stream continues; a stream error
//!   terminates the component.

use std::borrow::Cow;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::bus::Message;
use crate::component::{Component, ComponentRef, Health};
use crate::core::Handle;
use crate::error::{BoxError, ComponentError};

/// Shared message callback.
pub type MessageHandler =
    Arc<dyn Fn(Message) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Component that consumes one bus topic with a handler.
///
/// ```no_run
/// use servisor::Subscriber;
///
/// let worker = Subscriber::arc("mailer", "emails", |message| async move {
///     println!("sending {} bytes", message.body.len());
///     Ok::<_, servisor::BoxError>(())
/// });
/// # let _ = worker;
/// ```
pub struct Subscriber {
    name: Cow<'static, str>,
    topic: String,
    handler: MessageHandler,
    handle: OnceLock<Handle>,
    health: Health,
}

impl Subscriber {
    /// Creates a subscriber for `topic` with the given handler.
    pub fn new<F, Fut>(
        name: impl Into<Cow<'static, str>>,
        topic: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self::with_handler(name.into(), topic.into(), wrap(handler))
    }

    /// Like [`new`](Self::new), but wrapped in an [`Arc`] ready to deploy.
    pub fn arc<F, Fut>(
        name: impl Into<Cow<'static, str>>,
        topic: impl Into<String>,
        handler: F,
    ) -> ComponentRef
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Arc::new(Self::new(name, topic, handler))
    }

    /// Builds a factory producing numbered subscriber instances that share
    /// one handler, for scaling a topic across several consumers.
    pub fn producer<F, Fut>(
        name: impl Into<Cow<'static, str>>,
        topic: impl Into<String>,
        handler: F,
    ) -> impl Fn() -> ComponentRef
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let base = name.into();
        let topic = topic.into();
        let handler = wrap(handler);
        let counter = AtomicUsize::new(0);
        move || {
            let n = counter.fetch_add(1, Ordering::Relaxed);
            Arc::new(Self::with_handler(
                Cow::Owned(format!("{base}-{n}")),
                topic.clone(),
                Arc::clone(&handler),
            ))
        }
    }

    fn with_handler(name: Cow<'static, str>, topic: String, handler: MessageHandler) -> Self {
        Self {
            name,
            topic,
            handler,
            handle: OnceLock::new(),
            health: Health::default(),
        }
    }
}

fn wrap<F, Fut>(f: F) -> MessageHandler
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move |message| Box::pin(f(message)))
}

#[async_trait]
impl Component for Subscriber {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, handle: Handle) -> Result<(), ComponentError> {
        self.handle.set(handle).map_err(|_| ComponentError::Setup {
            error: "init called twice".to_string(),
        })
    }

    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        let handle = self.handle.get().ok_or_else(|| ComponentError::Setup {
            error: "started before init".to_string(),
        })?;
        let mut sub = handle.event_bus().subscription(&self.topic).await?;
        self.health.set_healthy(true);

        loop {
            tokio::select! {
                _ = ctx.cancelled() => break,
                received = sub.receive() => match received {
                    Ok(message) => {
                        if let Err(error) = (self.handler)(message).await {
                            warn!(
                                component = %self.name,
                                topic = %self.topic,
                                error = %error,
                                "message handler failed"
                            );
                        }
                    }
                    Err(error) => {
                        self.health.set_healthy(false);
                        return Err(error.into());
                    }
                },
            }
        }

        self.health.set_healthy(false);
        let _ = sub.shutdown().await;
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) {
        self.health.set_healthy(false);
    }

    fn check_health(&self) -> Result<(), ComponentError> {
        self.health.check()
    }
}
