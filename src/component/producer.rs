//! # Produce options for fan-out deployment.
//!
//! A producer is a zero-argument factory paired with [`ProduceOption`]: the
//! supervisor invokes the factory `instances` times and deploys the results
//! as independent components. The factory must hand out fresh internal state
//! on every call, since all instances run concurrently.

use serde::{Deserialize, Serialize};

/// Fan-out settings for [`Supervisor::deploy_from_producer`](crate::Supervisor::deploy_from_producer).
///
/// ## Sentinel values
/// - `instances = 0` → treated as 1 (see [`ProduceOption::count`])
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProduceOption {
    /// How many independent component instances to materialize.
    pub instances: usize,
}

impl ProduceOption {
    /// Creates options for the given instance count.
    pub fn new(instances: usize) -> Self {
        Self { instances }
    }

    /// Resolves the zero sentinel in place.
    pub fn ensure_defaults(&mut self) {
        if self.instances == 0 {
            self.instances = 1;
        }
    }

    /// Returns the effective instance count, clamped to a minimum of 1.
    #[inline]
    pub fn count(&self) -> usize {
        self.instances.max(1)
    }
}

impl Default for ProduceOption {
    /// Defaults to a single instance.
    fn default() -> Self {
        Self { instances: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_instances_count_as_one() {
        let mut opt = ProduceOption::new(0);
        assert_eq!(opt.count(), 1, "zero must clamp to one");
        opt.ensure_defaults();
        assert_eq!(opt.instances, 1, "ensure_defaults must resolve the sentinel");
    }

    #[test]
    fn test_deserialize_instances_field() {
        let opt: ProduceOption =
            serde_json::from_str(r#"{"instances":3}"#).expect("options must deserialize");
        assert_eq!(opt.count(), 3);

        let opt: ProduceOption = serde_json::from_str("{}").expect("empty object must default");
        assert_eq!(opt.count(), 1, "absent instances defaults to one");
    }
}
