//! Error types used by the servisor runtime, components, and the event bus.
//!
//! This module defines three main error enums:
//!
//! - [`RuntimeError`] — errors raised by the supervision runtime itself.
//! - [`ComponentError`] — errors raised by individual component lifecycles.
//! - [`BusError`] — errors raised by event-bus resolution and transport.
//!
//! All types provide `as_label` for stable snake_case tags in logs/metrics;
//! the runtime and component enums additionally provide `as_message`.

use thiserror::Error;

/// Boxed error type accepted from lifecycle hooks and message handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by the servisor runtime.
///
/// These represent failures in the orchestration system itself:
/// a batch that failed to initialize, a pre-start hook that refused
/// startup, or the terminal error of the component group.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A component's `init` failed; the whole deploy batch was aborted.
    #[error("component {name} failed to initialize: {source}")]
    Setup {
        /// Name of the component whose `init` failed.
        name: String,
        /// The underlying initialization error.
        #[source]
        source: ComponentError,
    },

    /// A pre-start hook failed; the run was aborted before any component started.
    #[error("pre-start hook #{index} failed: {error}")]
    PreStartHook {
        /// Zero-based registration index of the failing hook.
        index: usize,
        /// The underlying error message.
        error: String,
    },

    /// A component's `start` returned an error; this was the terminal event
    /// that brought the whole group down.
    #[error("component {name} failed: {source}")]
    Component {
        /// Name of the failing component.
        name: String,
        /// The error the component returned.
        #[source]
        source: ComponentError,
    },

    /// `run` (or `deploy` after `run`) was called on an already-started supervisor.
    #[error("supervisor already running")]
    AlreadyRunning,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::AlreadyRunning.as_label(), "runtime_already_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Setup { .. } => "runtime_setup_failed",
            RuntimeError::PreStartHook { .. } => "runtime_pre_start_hook",
            RuntimeError::Component { .. } => "runtime_component_failed",
            RuntimeError::AlreadyRunning => "runtime_already_running",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::Setup { name, source } => format!("init failed: {name}: {source}"),
            RuntimeError::PreStartHook { index, error } => {
                format!("pre-start hook #{index}: {error}")
            }
            RuntimeError::Component { name, source } => format!("component {name}: {source}"),
            RuntimeError::AlreadyRunning => "supervisor already running".to_string(),
        }
    }
}

/// # Errors produced by component lifecycles.
///
/// These represent failures of individual components managed by the runtime,
/// from `init` refusals to `start` errors and failed health checks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ComponentError {
    /// Component setup failed during `init`.
    #[error("setup failed: {error}")]
    Setup {
        /// The underlying error message.
        error: String,
    },

    /// Component execution failed during `start`.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// An event-bus operation performed by the component failed.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Component reported an unhealthy state.
    #[error("unhealthy")]
    Unhealthy,

    /// Component gave up due to shutdown cancellation.
    #[error("cancelled")]
    Canceled,
}

impl ComponentError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::ComponentError;
    ///
    /// let err = ComponentError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "component_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ComponentError::Setup { .. } => "component_setup",
            ComponentError::Fail { .. } => "component_failed",
            ComponentError::Bus(_) => "component_bus",
            ComponentError::Unhealthy => "component_unhealthy",
            ComponentError::Canceled => "component_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ComponentError::Setup { error } => format!("setup: {error}"),
            ComponentError::Fail { error } => format!("error: {error}"),
            ComponentError::Bus(err) => format!("bus: {err}"),
            ComponentError::Unhealthy => "unhealthy".to_string(),
            ComponentError::Canceled => "cancelled".to_string(),
        }
    }
}

/// # Errors produced by the event bus.
///
/// Configuration errors (`MissingGroup`, `MissingBrokers`) surface
/// synchronously from `topic`/`subscription` resolution; transport errors
/// surface from publish/receive on the external provider.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// Subscription requested for an external topic with no consumer group configured.
    #[error("topic {topic}: no subscription group configured")]
    MissingGroup {
        /// The logical topic identifier.
        topic: String,
    },

    /// External provider selected for a topic but no broker addresses configured.
    #[error("topic {topic}: no broker addresses configured")]
    MissingBrokers {
        /// The logical topic identifier.
        topic: String,
    },

    /// None of the configured broker addresses accepted a connection.
    #[error("unable to reach brokers {brokers:?}: {error}")]
    Connect {
        /// The addresses that were tried, in order.
        brokers: Vec<String>,
        /// The last connection error message.
        error: String,
    },

    /// Transport-level I/O failure.
    #[error("broker i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Frame payload could not be encoded or decoded.
    #[error("codec: {0}")]
    Codec(#[from] serde_json::Error),

    /// The broker rejected a request.
    #[error("broker rejected request: {reason}")]
    Rejected {
        /// The reason reported by the broker.
        reason: String,
    },

    /// A frame exceeded the maximum accepted size.
    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Size of the offending frame.
        len: usize,
        /// Maximum accepted frame size.
        max: usize,
    },

    /// The peer sent a frame that does not fit the current exchange.
    #[error("unexpected frame: {frame}")]
    Unexpected {
        /// Short tag of the offending frame.
        frame: &'static str,
    },

    /// The underlying channel or connection is closed.
    #[error("channel closed")]
    Closed,

    /// One or more cached topics failed to shut down during `close`.
    #[error("event bus shutdown failed for {} topic(s)", failures.len())]
    Shutdown {
        /// Per-topic shutdown failures, in close order.
        failures: Vec<(String, BusError)>,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::BusError;
    ///
    /// let err = BusError::MissingGroup { topic: "orders".into() };
    /// assert_eq!(err.as_label(), "bus_missing_group");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::MissingGroup { .. } => "bus_missing_group",
            BusError::MissingBrokers { .. } => "bus_missing_brokers",
            BusError::Connect { .. } => "bus_connect",
            BusError::Io(_) => "bus_io",
            BusError::Codec(_) => "bus_codec",
            BusError::Rejected { .. } => "bus_rejected",
            BusError::FrameTooLarge { .. } => "bus_frame_too_large",
            BusError::Unexpected { .. } => "bus_unexpected_frame",
            BusError::Closed => "bus_closed",
            BusError::Shutdown { .. } => "bus_shutdown",
        }
    }
}
