//! # ComponentActor: one component's run.
//!
//! Drives a single [`Component`](crate::Component) start-to-finish and
//! reports how it ended. Panics inside `start` are caught and surfaced as
//! failures, so one misbehaving component cannot take down the process.
//!
//! ## Rules
//! - Exactly one [`ActorOutcome`] per actor, whatever the exit path.
//! - `Canceled` is a graceful exit, not a failure.

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::component::ComponentRef;
use crate::error::ComponentError;

/// Terminal state of one component run.
pub(crate) struct ActorOutcome {
    pub(crate) name: String,
    pub(crate) result: Result<(), ComponentError>,
}

impl ActorOutcome {
    pub(crate) fn clean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: Ok(()),
        }
    }
}

/// Runs one component until its `start` returns or panics.
pub(crate) struct ComponentActor {
    component: ComponentRef,
    token: CancellationToken,
}

impl ComponentActor {
    pub(crate) fn new(component: ComponentRef, token: CancellationToken) -> Self {
        Self { component, token }
    }

    pub(crate) async fn run(self) -> ActorOutcome {
        let name = self.component.name().to_string();
        debug!(component = %name, "component starting");

        let fut = self.component.start(self.token.clone());
        let result = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(panic_err) => Err(ComponentError::Fail {
                error: format!("start panicked: {}", panic_message(&*panic_err)),
            }),
        };

        let result = match result {
            // the component saw the cancellation and stepped down
            Err(ComponentError::Canceled) => Ok(()),
            other => other,
        };
        ActorOutcome { name, result }
    }
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentFn;

    #[tokio::test]
    async fn test_success_is_reported_under_component_name() {
        let component = ComponentFn::arc("steady", |_ctx| async { Ok(()) });
        let outcome = ComponentActor::new(component, CancellationToken::new())
            .run()
            .await;

        assert_eq!(outcome.name, "steady");
        assert!(outcome.result.is_ok());
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let component = ComponentFn::arc("bomb", |_ctx| async { panic!("wires crossed") });
        let outcome = ComponentActor::new(component, CancellationToken::new())
            .run()
            .await;

        let err = outcome.result.expect_err("panic must surface as an error");
        assert!(
            err.to_string().contains("wires crossed"),
            "panic payload must be preserved: {err}"
        );
    }

    #[tokio::test]
    async fn test_canceled_is_a_clean_exit() {
        let component = ComponentFn::arc("polite", |_ctx| async { Err(ComponentError::Canceled) });
        let outcome = ComponentActor::new(component, CancellationToken::new())
            .run()
            .await;

        assert!(
            outcome.result.is_ok(),
            "acknowledged cancellation is not a failure"
        );
    }
}
