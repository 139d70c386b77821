//! # servisor
//!
//! **Servisor** is a component supervision runtime for Rust services.
//!
//! It runs a group of long-lived components as one unit: deploy them, run
//! them concurrently under a shared cancellation root, and get a single
//! coordinated shutdown on the first failure, a termination signal, or an
//! explicit close. Components talk to each other through a pluggable
//! topic-based event bus.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Component   │   │  Component   │   │  Subscriber  │
//!     │  (user #1)   │   │  (user #2)   │   │ (bus-driven) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ deploy           ▼ deploy           ▼ deploy_from_producer
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Supervisor (runtime orchestrator)                              │
//! │  - root CancellationToken (one child token per component)       │
//! │  - Hooks (ordered pre-start / post-stop callbacks)              │
//! │  - EventBus (memory or external provider, per topic)            │
//! │  - Options + Config (identity, shutdown budget, app settings)   │
//! └───────┬──────────────────────┬──────────────────────┬──────────┘
//!         ▼                      ▼                      ▼
//!   ComponentActor         ComponentActor        signal-watch actor
//!  (start → outcome)      (start → outcome)      (SIGINT / SIGTERM)
//!         │                      │                      │
//!         └────────────── first terminal ───────────────┘
//!                                ▼
//!        root.cancel() ─► stop() per component ─► post-stop hooks
//! ```
//!
//! ### Lifecycle
//! ```text
//! deploy(components) ──► init(handle) per component ──► registered entries
//!
//! run() {
//!   ├─► pre-start hooks, in order (first error aborts the run)
//!   ├─► spawn one ComponentActor per entry + the signal watch
//!   ├─► wait: the FIRST actor to finish decides the outcome
//!   ├─► root.cancel() ──► every component's child token fires
//!   ├─► stop(token) per component, concurrent with the actor drain
//!   ├─► post-stop hooks, in order, bounded by Options::shutdown_timeout
//!   └─► return the first component error, or Ok(()) for a
//!       signal / close / clean-exit shutdown
//! }
//! ```
//!
//! ## Features
//! | Area            | Description                                                      | Key types / traits                          |
//! |-----------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Supervision** | Deploy component groups and run them to a coordinated exit.      | [`Supervisor`], [`App`]                     |
//! | **Components**  | Named lifecycle units; closures and bus consumers included.      | [`Component`], [`ComponentFn`], [`Subscriber`] |
//! | **Scaling**     | Factory deployment of N independent instances.                   | [`ProduceOption`]                           |
//! | **Hooks**       | Ordered pre-start / post-stop callbacks around the group.        | [`Hooks`]                                   |
//! | **Event bus**   | Topic publish/subscribe, in-memory or external TCP broker.       | [`EventBus`], [`Topic`], [`Subscription`], [`Message`] |
//! | **Errors**      | Typed errors for each layer.                                     | [`RuntimeError`], [`ComponentError`], [`BusError`] |
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use servisor::{ComponentFn, ComponentRef, Options, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), servisor::RuntimeError> {
//!     let supervisor = Supervisor::new(Options::new("hello", "1.0.0"));
//!
//!     // A component that runs until the runtime shuts down
//!     let hello: ComponentRef = ComponentFn::arc("hello", |ctx: CancellationToken| async move {
//!         println!("hello from a component!");
//!         ctx.cancelled().await;
//!         Ok(())
//!     });
//!     supervisor.deploy(vec![hello]).await?;
//!
//!     supervisor.hooks().on_stop(|_ctx| async {
//!         println!("goodbye");
//!         Ok::<_, servisor::BoxError>(())
//!     });
//!
//!     // Normally SIGINT/SIGTERM ends the run; do it explicitly here
//!     supervisor.close();
//!     supervisor.run().await
//! }
//! ```
mod bus;
mod component;
mod core;
mod error;

// ---- Public re-exports ----

pub use bus::{
    EventBus, ExternalOption, Message, Provider, Subscription, SubscriptionOption, Topic,
    TopicOption,
};
pub use component::{
    Component, ComponentFn, ComponentRef, Health, MessageHandler, ProduceOption, Subscriber,
};
pub use core::{App, Config, Handle, HookFn, Hooks, Options, Supervisor, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{BoxError, BusError, ComponentError, RuntimeError};
