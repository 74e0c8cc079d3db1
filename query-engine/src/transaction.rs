//! The per-query transaction handle.
//!
//! Scalar function callbacks and operators receive the transaction to reach
//! shared services: the function registry, the configuration, the clock and
//! the heartbeat used for cooperative cancellation.

use crate::config::ExecutionConfig;
use crate::function::FunctionRegistry;
use common::time::{Clock, SystemClock};
use common::Result;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Liveness check polled from long-running loops. Returning an error cancels
/// the query with that error.
pub type HeartbeatCallback = Arc<dyn Fn() -> Result<()> + Send + Sync>;

pub struct Transaction {
    registry: Arc<FunctionRegistry>,
    config: ExecutionConfig,
    clock: Arc<dyn Clock>,
    heartbeat: Option<HeartbeatCallback>,
    heartbeat_count: AtomicU64,
}

impl Transaction {
    /// Creates a transaction with the default config, the system clock and no
    /// heartbeat callback.
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            config: ExecutionConfig::default(),
            clock: Arc::new(SystemClock),
            heartbeat: None,
            heartbeat_count: AtomicU64::new(0),
        }
    }

    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: HeartbeatCallback) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Current wall-clock time in microseconds since the epoch.
    pub fn now(&self) -> u64 {
        self.clock.unix_micros()
    }

    /// Polls the heartbeat. Succeeds when no callback is installed.
    pub fn trigger_heartbeat(&self) -> Result<()> {
        let count = self.heartbeat_count.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(count, "triggering heartbeat");
        match &self.heartbeat {
            Some(heartbeat) => heartbeat(),
            None => Ok(()),
        }
    }

    /// How many times the heartbeat was triggered.
    pub fn heartbeat_count(&self) -> u64 {
        self.heartbeat_count.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("config", &self.config)
            .field("has_heartbeat", &self.heartbeat.is_some())
            .field("heartbeat_count", &self.heartbeat_count())
            .finish()
    }
}
