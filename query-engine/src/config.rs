//! Execution configuration.

/// Comparisons between two heartbeat polls inside a sort.
pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 4096;

/// Tunables shared by every operator of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// The sort operator triggers the transaction heartbeat once every
    /// `heartbeat_interval` pairwise comparisons. Never zero.
    pub heartbeat_interval: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

impl ExecutionConfig {
    pub fn with_heartbeat_interval(mut self, interval: u64) -> Self {
        self.heartbeat_interval = interval.max(1);
        self
    }
}
