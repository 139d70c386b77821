//! # Supervisor: component group lifecycle and coordinated shutdown.
//!
//! The [`Supervisor`] owns the root cancellation token, the deployed
//! component set, the [`Hooks`] registry, the [`EventBus`], and runtime
//! [`Options`]/[`Config`]. Components are deployed before `run`; `run` drives
//! the whole group to a single coordinated exit.
//!
//! ## High-level architecture
//! ```text
//! Preparation:
//!   deploy(components) ──► init(handle) per component ──► register entries
//!   hooks().on_start / on_stop ──► ordered hook sequences
//!
//! run():
//!   1. pre-start hooks, in order (first error aborts the run)
//!   2. spawn one ComponentActor per entry + one signal-watch actor
//!         entry tokens = root.child_token()
//!   3. wait for the FIRST actor to finish (component exit, crash, or signal)
//!   4. root.cancel() ──► every sibling sees its child token cancelled
//!   5. concurrently: stop(entry.token) per component + drain the JoinSet
//!   6. post-stop hooks, in order, bounded by Options::shutdown_timeout
//!   7. return the triggering error (or Ok for signal/close/clean exits)
//! ```
//!
//! ## Rules
//! - **First terminal wins**: whichever actor finishes first decides the
//!   outcome and triggers shutdown for everyone else.
//! - **Symmetric teardown**: a component crash stops the signal watcher, a
//!   signal stops every component. No partial-shutdown state.
//! - **One shot**: `run` consumes the group; a second `run` (or a `deploy`
//!   after `run` began) returns [`RuntimeError::AlreadyRunning`].
//! - Stops receive the component's already-cancelled private token and run
//!   concurrently with the actor drain, so a `start` that only exits once
//!   `stop` is called cannot deadlock the shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bus::EventBus;
use crate::component::{ComponentRef, HealthList, ProduceOption};
use crate::core::actor::{ActorOutcome, ComponentActor};
use crate::core::{shutdown, Config, Handle, Hooks, Options};
use crate::error::{ComponentError, RuntimeError};

/// One deployed component with its private cancellation token.
#[derive(Clone)]
struct Entry {
    component: ComponentRef,
    token: CancellationToken,
}

/// Coordinates component actors, lifecycle hooks, and graceful shutdown.
pub struct Supervisor {
    options: Arc<Options>,
    config: Arc<Config>,
    bus: Arc<EventBus>,
    hooks: Arc<Hooks>,
    health: Arc<HealthList>,
    root: CancellationToken,
    entries: Mutex<Vec<Entry>>,
    started: AtomicBool,
}

impl Supervisor {
    /// Creates a supervisor with the given options and an empty config.
    pub fn new(options: Options) -> Self {
        Self::with_config(options, Config::default())
    }

    /// Creates a supervisor with the given options and application config.
    ///
    /// Blank option fields are resolved here (`id`, `shutdown_timeout`), so
    /// every component sees fully-populated options through its [`Handle`].
    pub fn with_config(mut options: Options, config: Config) -> Self {
        options.ensure_defaults();
        Self {
            options: Arc::new(options),
            config: Arc::new(config),
            bus: Arc::new(EventBus::new()),
            hooks: Arc::new(Hooks::new()),
            health: Arc::new(HealthList::default()),
            root: CancellationToken::new(),
            entries: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Initializes and registers a batch of components.
    ///
    /// The whole batch is initialized before any of it is registered: an init
    /// failure aborts the call and registers nothing from this batch, while
    /// components from earlier calls stay deployed. Registered components
    /// start when [`run`](Self::run) is called.
    pub async fn deploy(&self, components: Vec<ComponentRef>) -> Result<(), RuntimeError> {
        if self.started.load(Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyRunning);
        }

        for component in &components {
            if let Err(source) = component.init(self.handle()).await {
                return Err(RuntimeError::Setup {
                    name: component.name().to_string(),
                    source,
                });
            }
        }

        let mut entries = self.lock_entries();
        for component in components {
            debug!(component = %component.name(), "component deployed");
            self.health.push(Arc::clone(&component));
            entries.push(Entry {
                token: self.root.child_token(),
                component,
            });
        }
        Ok(())
    }

    /// Materializes `options.count()` instances from the factory and deploys
    /// them as one batch.
    ///
    /// Returns the produced components so the caller can aggregate their
    /// health or hold on to them.
    pub async fn deploy_from_producer<F>(
        &self,
        producer: F,
        options: ProduceOption,
    ) -> Result<Vec<ComponentRef>, RuntimeError>
    where
        F: Fn() -> ComponentRef,
    {
        let components: Vec<ComponentRef> = (0..options.count()).map(|_| producer()).collect();
        self.deploy(components.clone()).await?;
        Ok(components)
    }

    /// Runs the deployed group until the first actor finishes, then drives
    /// the coordinated shutdown.
    ///
    /// Returns the first component error (wrapped with the component's name),
    /// or `Ok(())` when the exit was triggered by a termination signal,
    /// [`close`](Self::close), or a component finishing cleanly.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyRunning);
        }

        info!(
            name = %self.options.name,
            version = %self.options.version,
            id = %self.options.id,
            "runtime starting"
        );
        self.run_start_hooks().await?;

        let entries = self.snapshot_entries();
        let mut set = JoinSet::new();
        for entry in &entries {
            let actor = ComponentActor::new(Arc::clone(&entry.component), entry.token.clone());
            set.spawn(actor.run());
        }
        self.spawn_signal_watch(&mut set);

        // first terminal actor decides the outcome for the whole group
        let terminal = match set.join_next().await {
            Some(joined) => outcome_error(joined),
            None => None,
        };
        self.root.cancel();

        let drain = async {
            while let Some(joined) = set.join_next().await {
                if let Some(failure) = outcome_error(joined) {
                    warn!(error = %failure, "component failed during shutdown");
                }
            }
        };
        tokio::join!(self.stop_all(&entries), drain);

        self.run_stop_hooks().await;

        match terminal {
            Some(failure) => {
                error!(error = %failure, "runtime stopped after component failure");
                Err(failure)
            }
            None => {
                info!("runtime stopped");
                Ok(())
            }
        }
    }

    /// Cancels the root token, ending [`run`](Self::run) as a clean exit.
    ///
    /// Equivalent to receiving a termination signal; safe to call any number
    /// of times.
    pub fn close(&self) {
        self.root.cancel();
    }

    /// Capability surface handed to components in `init`; the same handle
    /// every other component sees.
    pub fn handle(&self) -> Handle {
        Handle {
            bus: Arc::clone(&self.bus),
            config: Arc::clone(&self.config),
            options: Arc::clone(&self.options),
            hooks: Arc::clone(&self.hooks),
            health: Arc::clone(&self.health),
            root: self.root.clone(),
        }
    }

    /// Runtime options (identity and shutdown budget).
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Application configuration shared with every component.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The bus components publish and subscribe through.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Lifecycle hook registry.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Snapshot of every component deployed so far, for health aggregation.
    pub fn health_checks(&self) -> Vec<ComponentRef> {
        self.health.snapshot()
    }

    /// Runs pre-start hooks in order; the first error aborts the run before
    /// any component starts.
    async fn run_start_hooks(&self) -> Result<(), RuntimeError> {
        for (index, hook) in self.hooks.start_hooks().iter().enumerate() {
            if let Err(error) = hook(self.root.clone()).await {
                return Err(RuntimeError::PreStartHook {
                    index,
                    error: error.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Runs post-stop hooks in order under the shutdown budget.
    ///
    /// Hook errors are logged and do not abort the sequence. When the budget
    /// expires the remaining hooks are abandoned: they keep the budget token
    /// (now cancelled) but exit no longer waits for them.
    async fn run_stop_hooks(&self) {
        let hooks = self.hooks.stop_hooks();
        if hooks.is_empty() {
            return;
        }

        let budget = self.options.shutdown_timeout;
        let token = CancellationToken::new();
        let sequence = {
            let token = token.clone();
            tokio::spawn(async move {
                for (index, hook) in hooks.iter().enumerate() {
                    if let Err(error) = hook(token.clone()).await {
                        warn!(index, error = %error, "post-stop hook failed");
                    }
                }
            })
        };

        match tokio::time::timeout(budget, sequence).await {
            Ok(Ok(())) => {}
            Ok(Err(join_err)) => warn!(error = %join_err, "post-stop hook sequence crashed"),
            Err(_) => {
                token.cancel();
                warn!(
                    timeout = ?budget,
                    "post-stop hooks still running after shutdown timeout; abandoning"
                );
            }
        }
    }

    /// Invokes every component's `stop` concurrently, each with its own
    /// already-cancelled token, and waits for all of them.
    async fn stop_all(&self, entries: &[Entry]) {
        let mut stops = JoinSet::new();
        for entry in entries {
            let component = Arc::clone(&entry.component);
            let token = entry.token.clone();
            stops.spawn(async move {
                component.stop(token).await;
            });
        }
        while stops.join_next().await.is_some() {}
    }

    /// Adds the signal-watch actor: a sibling of the component actors that
    /// finishes cleanly on SIGINT/SIGTERM or when the root token cancels.
    fn spawn_signal_watch(&self, set: &mut JoinSet<ActorOutcome>) {
        let root = self.root.clone();
        set.spawn(async move {
            tokio::select! {
                res = shutdown::wait_for_shutdown_signal() => match res {
                    Ok(()) => info!("termination signal received"),
                    Err(e) => {
                        // no listener: stay alive so the group exit stays
                        // close/component driven
                        warn!(error = %e, "signal listener failed");
                        root.cancelled().await;
                    }
                },
                _ = root.cancelled() => {}
            }
            ActorOutcome::clean("signal-watch")
        });
    }

    fn snapshot_entries(&self) -> Vec<Entry> {
        self.lock_entries().clone()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Maps one joined actor to the error `run` should report, logging clean
/// exits along the way.
fn outcome_error(
    joined: Result<ActorOutcome, tokio::task::JoinError>,
) -> Option<RuntimeError> {
    match joined {
        Ok(outcome) => match outcome.result {
            Ok(()) => {
                info!(component = %outcome.name, "component stopped");
                None
            }
            Err(source) => Some(RuntimeError::Component {
                name: outcome.name,
                source,
            }),
        },
        Err(join_err) => Some(RuntimeError::Component {
            name: "actor".to_string(),
            source: ComponentError::Fail {
                error: join_err.to_string(),
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    use crate::component::{Component, ComponentFn};
    use crate::error::BoxError;

    fn quick() -> ComponentRef {
        ComponentFn::arc("quick", |_ctx| async { Ok(()) })
    }

    #[tokio::test]
    async fn test_first_error_wins_and_siblings_observe_cancellation() {
        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));

        let failing: ComponentRef = ComponentFn::arc("failing", |_ctx| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(ComponentError::Fail {
                error: "exploded".to_string(),
            })
        });

        let sibling_saw_cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&sibling_saw_cancel);
        let sibling: ComponentRef = ComponentFn::arc("steady", move |ctx: CancellationToken| {
            let flag = Arc::clone(&flag);
            async move {
                ctx.cancelled().await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        });

        supervisor
            .deploy(vec![failing, sibling])
            .await
            .expect("deploy");

        let err = supervisor.run().await.expect_err("failure must surface");
        assert!(
            matches!(&err, RuntimeError::Component { name, .. } if name == "failing"),
            "unexpected error: {err}"
        );
        assert!(
            sibling_saw_cancel.load(Ordering::SeqCst),
            "sibling must be cancelled by the failure"
        );
    }

    #[tokio::test]
    async fn test_close_during_run_is_a_clean_exit() {
        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));
        let handle = supervisor.handle();

        let worker: ComponentRef = ComponentFn::arc("worker", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Ok(())
        });
        supervisor.deploy(vec![worker]).await.expect("deploy");

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.close();
        });

        supervisor.run().await.expect("close-driven exit is clean");
    }

    #[tokio::test]
    async fn test_run_is_one_shot() {
        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));
        supervisor.deploy(vec![quick()]).await.expect("deploy");
        supervisor.run().await.expect("first run is clean");

        let err = supervisor.run().await.expect_err("second run");
        assert!(matches!(err, RuntimeError::AlreadyRunning));
    }

    #[tokio::test]
    async fn test_deploy_after_run_is_refused() {
        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));
        supervisor.deploy(vec![quick()]).await.expect("deploy");
        supervisor.run().await.expect("run");

        let err = supervisor
            .deploy(vec![quick()])
            .await
            .expect_err("late deploy");
        assert!(matches!(err, RuntimeError::AlreadyRunning));
    }

    #[tokio::test]
    async fn test_hooks_bracket_the_component_lifecycle_in_order() {
        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));
        let order = Arc::new(Mutex::new(Vec::<&'static str>::new()));

        let record = |tag: &'static str, order: &Arc<Mutex<Vec<&'static str>>>| {
            let order = Arc::clone(order);
            move |_ctx: CancellationToken| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().unwrap().push(tag);
                    Ok::<_, BoxError>(())
                }
            }
        };
        supervisor.hooks().on_start(record("start-1", &order));
        supervisor.hooks().on_start(record("start-2", &order));
        supervisor.hooks().on_stop(record("stop-1", &order));
        supervisor.hooks().on_stop(record("stop-2", &order));

        let trace = Arc::clone(&order);
        let component: ComponentRef = ComponentFn::arc("recorder", move |_ctx| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().unwrap().push("component");
                Ok(())
            }
        });
        supervisor.deploy(vec![component]).await.expect("deploy");
        supervisor.run().await.expect("run");

        assert_eq!(
            order.lock().unwrap().as_slice(),
            ["start-1", "start-2", "component", "stop-1", "stop-2"],
            "hooks must bracket the run in registration order"
        );
    }

    #[tokio::test]
    async fn test_pre_start_hook_error_aborts_before_components() {
        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));
        supervisor
            .hooks()
            .on_start(|_ctx| async { Err::<(), BoxError>("no database".into()) });

        let second_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&second_ran);
        supervisor.hooks().on_start(move |_ctx| {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        });

        let component_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&component_ran);
        let component: ComponentRef = ComponentFn::arc("never", move |_ctx| {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        });
        supervisor.deploy(vec![component]).await.expect("deploy");

        let err = supervisor.run().await.expect_err("hook failure must abort");
        assert!(
            matches!(err, RuntimeError::PreStartHook { index: 0, .. }),
            "unexpected error: {err}"
        );
        assert!(!second_ran.load(Ordering::SeqCst), "later hooks must not run");
        assert!(
            !component_ran.load(Ordering::SeqCst),
            "components must not start"
        );
    }

    #[tokio::test]
    async fn test_post_stop_hook_error_does_not_stop_the_sequence() {
        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));
        supervisor
            .hooks()
            .on_stop(|_ctx| async { Err::<(), BoxError>("flush failed".into()) });

        let second_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&second_ran);
        supervisor.hooks().on_stop(move |_ctx| {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        });

        supervisor.deploy(vec![quick()]).await.expect("deploy");
        supervisor.run().await.expect("hook errors never fail the run");
        assert!(
            second_ran.load(Ordering::SeqCst),
            "the sequence must continue past a failing hook"
        );
    }

    #[tokio::test]
    async fn test_post_stop_hooks_are_abandoned_at_the_deadline() {
        let mut options = Options::new("test", "0.0.0");
        options.shutdown_timeout = Duration::from_millis(50);
        let supervisor = Supervisor::new(options);

        supervisor.hooks().on_stop(|_ctx| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, BoxError>(())
        });
        let late_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&late_ran);
        supervisor.hooks().on_stop(move |_ctx| {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        });

        supervisor.deploy(vec![quick()]).await.expect("deploy");
        tokio::time::timeout(Duration::from_secs(2), supervisor.run())
            .await
            .expect("exit must not wait for the stuck hook")
            .expect("run is clean");
        assert!(
            !late_ran.load(Ordering::SeqCst),
            "hooks after the stuck one are abandoned"
        );
    }

    #[tokio::test]
    async fn test_producer_materializes_requested_instances() {
        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));
        let built = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&built);
        let produce = move || -> ComponentRef {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            ComponentFn::arc(format!("worker-{n}"), |_ctx| async { Ok(()) })
        };

        let deployed = supervisor
            .deploy_from_producer(&produce, ProduceOption::new(3))
            .await
            .expect("deploy");
        assert_eq!(deployed.len(), 3);
        assert_eq!(built.load(Ordering::SeqCst), 3);
        assert_eq!(supervisor.health_checks().len(), 3);

        // zero instances fall back to one
        let defaulted = supervisor
            .deploy_from_producer(&produce, ProduceOption::new(0))
            .await
            .expect("deploy");
        assert_eq!(defaulted.len(), 1);
        assert_eq!(supervisor.health_checks().len(), 4);
    }

    #[tokio::test]
    async fn test_init_failure_registers_nothing_from_the_batch() {
        struct BrokenInit;

        #[async_trait]
        impl Component for BrokenInit {
            fn name(&self) -> &str {
                "broken"
            }

            async fn init(&self, _handle: Handle) -> Result<(), ComponentError> {
                Err(ComponentError::Setup {
                    error: "refused".to_string(),
                })
            }

            async fn start(&self, _ctx: CancellationToken) -> Result<(), ComponentError> {
                Ok(())
            }
        }

        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));
        let err = supervisor
            .deploy(vec![quick(), Arc::new(BrokenInit)])
            .await
            .expect_err("batch must fail");
        assert!(
            matches!(&err, RuntimeError::Setup { name, .. } if name == "broken"),
            "unexpected error: {err}"
        );
        assert!(
            supervisor.health_checks().is_empty(),
            "a failed batch must register nothing"
        );
    }

    #[tokio::test]
    async fn test_stop_unblocks_a_start_that_waits_for_it() {
        struct Gated {
            gate: Arc<Notify>,
        }

        #[async_trait]
        impl Component for Gated {
            fn name(&self) -> &str {
                "gated"
            }

            async fn start(&self, _ctx: CancellationToken) -> Result<(), ComponentError> {
                // ignores its token on purpose; only stop releases it
                self.gate.notified().await;
                Ok(())
            }

            async fn stop(&self, _ctx: CancellationToken) {
                self.gate.notify_one();
            }
        }

        let supervisor = Supervisor::new(Options::new("test", "0.0.0"));
        let gated = Arc::new(Gated {
            gate: Arc::new(Notify::new()),
        });
        supervisor
            .deploy(vec![quick(), gated])
            .await
            .expect("deploy");

        tokio::time::timeout(Duration::from_secs(2), supervisor.run())
            .await
            .expect("concurrent stop must unblock the drain")
            .expect("run is clean");
    }

    #[tokio::test]
    async fn test_config_flows_through_the_handle() {
        let config = Config::from_value(json!({ "app": { "debug": true } }));
        let supervisor = Supervisor::with_config(Options::new("test", "0.0.0"), config);

        let handle = supervisor.handle();
        assert_eq!(handle.options().name, "test");
        assert!(
            !handle.options().id.is_empty(),
            "blank id must be resolved at construction"
        );
        assert_eq!(handle.config().get_bool("app.debug"), Some(true));
    }
}
