//! Runtime core: orchestration and lifecycle.
//!
//! Everything that drives a process lives here: [`Supervisor`] runs the
//! component group, [`App`] wraps it for `main`, [`Handle`] is the capability
//! surface components receive, and [`Options`]/[`Config`]/[`Hooks`] carry the
//! runtime's settings and lifecycle callbacks.
//!
//! Internal modules:
//! - [`actor`]: runs one component and reports its terminal state;
//! - [`supervisor`]: first-terminal-wins group lifecycle and shutdown;
//! - [`shutdown`]: cross-platform termination signal handling.

mod actor;
mod app;
mod config;
mod handle;
mod hooks;
mod options;
mod shutdown;
mod supervisor;

pub use app::App;
pub use config::Config;
pub use handle::Handle;
pub use hooks::{HookFn, Hooks};
pub use options::{Options, DEFAULT_SHUTDOWN_TIMEOUT};
pub use supervisor::Supervisor;
