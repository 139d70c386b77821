//! # App: process-level runner.
//!
//! Thin entrypoint that owns a [`Supervisor`] and splits a service `main`
//! into two phases: a fallible setup closure (deploy components, register
//! hooks, configure the bus) and the supervised run. Once the run ends the
//! app closes the event bus; close failures are logged, never escalated.

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::core::{Config, Options, Supervisor};
use crate::error::{BoxError, ComponentError, RuntimeError};

/// Owns the supervisor for one process lifetime.
///
/// ```no_run
/// use tokio_util::sync::CancellationToken;
/// use servisor::{App, ComponentFn, ComponentRef, Options};
///
/// #[tokio::main]
/// async fn main() -> Result<(), servisor::RuntimeError> {
///     let app = App::new(Options::new("ticker", "1.0.0"));
///     app.run(|supervisor| async move {
///         let tick: ComponentRef = ComponentFn::arc("tick", |ctx: CancellationToken| async move {
///             ctx.cancelled().await;
///             Ok(())
///         });
///         supervisor.deploy(vec![tick]).await?;
///         Ok(())
///     })
///     .await
/// }
/// ```
pub struct App {
    supervisor: Arc<Supervisor>,
}

impl App {
    /// Creates an app with the given options and an empty config.
    pub fn new(options: Options) -> Self {
        Self::with_config(options, Config::default())
    }

    /// Creates an app with the given options and application config.
    pub fn with_config(options: Options, config: Config) -> Self {
        Self {
            supervisor: Arc::new(Supervisor::with_config(options, config)),
        }
    }

    /// The supervisor this app drives.
    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    /// Applies `setup`, then runs the supervised group to completion.
    ///
    /// A setup error is returned as [`RuntimeError::Setup`] under the
    /// app's name, before any component starts.
    pub async fn run<F, Fut>(self, setup: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(Arc<Supervisor>) -> Fut,
        Fut: Future<Output = Result<(), BoxError>>,
    {
        if let Err(error) = setup(Arc::clone(&self.supervisor)).await {
            return Err(RuntimeError::Setup {
                name: self.supervisor.options().name.clone(),
                source: ComponentError::Setup {
                    error: error.to_string(),
                },
            });
        }

        let result = self.supervisor.run().await;
        if let Err(error) = self.supervisor.event_bus().close().await {
            warn!(error = %error, "event bus close failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::component::{ComponentFn, ComponentRef};

    #[tokio::test]
    async fn test_setup_runs_before_the_group() {
        let app = App::new(Options::new("app-test", "0.0.0"));

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        app.run(|supervisor| async move {
            let flag = Arc::clone(&flag);
            let once: ComponentRef = ComponentFn::arc("once", move |_ctx| {
                let flag = Arc::clone(&flag);
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            });
            supervisor.deploy(vec![once]).await?;
            Ok(())
        })
        .await
        .expect("clean run");

        assert!(ran.load(Ordering::SeqCst), "deployed component must run");
    }

    #[tokio::test]
    async fn test_setup_error_aborts_under_the_app_name() {
        let app = App::new(Options::new("app-test", "0.0.0"));
        let err = app
            .run(|_supervisor| async { Err::<(), BoxError>("wiring failed".into()) })
            .await
            .expect_err("setup failure must abort");
        assert!(
            matches!(&err, RuntimeError::Setup { name, .. } if name == "app-test"),
            "unexpected error: {err}"
        );
    }
}
