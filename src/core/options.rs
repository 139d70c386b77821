//! # Runtime options for a supervised process.
//!
//! Provides [`Options`], the identity and shutdown settings of one
//! supervisor instance. Options are plain data: they travel through the
//! [`Handle`](crate::Handle) so components can read the process identity.
//!
//! ## Sentinel values
//! - `id = ""` → replaced with a generated UUID by [`Options::ensure_defaults`]
//! - `shutdown_timeout = 0s` → replaced with [`DEFAULT_SHUTDOWN_TIMEOUT`]

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default bound on total post-stop hook execution.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity and shutdown settings of a supervised process.
///
/// ## Field semantics
/// - `id`: unique instance identifier; empty means "generate one"
/// - `name`: logical service name, shared across instances
/// - `version`: build/release tag, informational
/// - `shutdown_timeout`: deadline for the post-stop hook phase (`0s` = use default)
///
/// All fields are public; [`Options::ensure_defaults`] resolves the sentinels.
/// The struct round-trips through serde with the timeout in humantime form
/// (e.g. `"5s"`), so it can be embedded in caller-loaded configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Unique identifier of this process instance.
    pub id: String,

    /// Logical service name.
    pub name: String,

    /// Version tag of the running build.
    pub version: String,

    /// Maximum time granted to post-stop hooks after all components stopped.
    ///
    /// Hooks still running when the budget expires are abandoned; they never
    /// block process exit.
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Options {
    /// Creates options for the given service name and version with defaults applied.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let mut options = Self {
            id: String::new(),
            name: name.into(),
            version: version.into(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        };
        options.ensure_defaults();
        options
    }

    /// Resolves sentinel values in place.
    ///
    /// - empty `id` → fresh UUID v4
    /// - zero `shutdown_timeout` → [`DEFAULT_SHUTDOWN_TIMEOUT`]
    pub fn ensure_defaults(&mut self) {
        if self.id.is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        if self.shutdown_timeout.is_zero() {
            self.shutdown_timeout = DEFAULT_SHUTDOWN_TIMEOUT;
        }
    }
}

impl Default for Options {
    /// Default options: empty identity, default shutdown timeout.
    ///
    /// The empty `id` is a sentinel; the supervisor calls
    /// [`Options::ensure_defaults`] on construction.
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            version: String::new(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}
