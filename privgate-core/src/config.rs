//! Export engine configuration.
//!
//! Everything the coordinator needs to size a pipeline: queue capacity,
//! middle-stage worker count, and the k-anonymity target. Values come from
//! defaults, builder methods, or the environment override for deployments
//! that tune the queue without a config file.

use serde::{Deserialize, Serialize};

/// Environment variable overriding the inter-stage queue capacity.
pub const QUEUE_SIZE_ENV: &str = "PRIVGATE_QUEUE_SIZE";

/// Default capacity of each bounded inter-stage queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Default k-anonymity target.
pub const DEFAULT_K_TARGET: u64 = 2;

/// Default worker count for the normalize and de-identify stages.
pub fn default_worker_count() -> usize {
    std::cmp::max(4, num_cpus::get())
}

/// Tuning knobs for one export request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Capacity of each of the three bounded inter-stage queues
    pub queue_capacity: usize,
    /// Worker count for each of the two parallel middle stages
    pub worker_count: usize,
    /// Minimum equivalence-class size the evaluator tests against
    pub k_target: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_count: default_worker_count(),
            k_target: DEFAULT_K_TARGET,
        }
    }
}

impl ExportConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config with defaults, honoring the queue-size environment
    /// override when it parses as a positive integer.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(QUEUE_SIZE_ENV) {
            match raw.parse::<usize>() {
                Ok(size) if size > 0 => config.queue_capacity = size,
                _ => tracing::warn!(
                    "Ignoring {}={:?}: not a positive integer",
                    QUEUE_SIZE_ENV,
                    raw
                ),
            }
        }
        config
    }

    /// Builder method to set the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Builder method to set the worker count.
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Builder method to set the k-anonymity target.
    pub fn with_k_target(mut self, k: u64) -> Self {
        self.k_target = k;
        self
    }
}
