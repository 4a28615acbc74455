//! Dispatcher configuration.

use std::{num::NonZeroUsize, thread};

use crate::error::DispatchError;

/// Default name prefix for worker threads.
pub const DEFAULT_THREAD_NAME: &str = "event-dispatch";

/// Settings for a [`Dispatcher`](crate::Dispatcher).
///
/// ```rust,ignore
/// let config = Config::default()
///     .with_workers(2)
///     .with_thread_name("audit-events");
/// let dispatcher = Dispatcher::with_config(registry, config)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of worker threads delivering asynchronous batches.
    pub workers: usize,
    /// Worker threads are named `{thread_name}-{index}`.
    pub thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }
}

impl Config {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Checks that the settings can start a worker pool.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.workers == 0 {
            return Err(DispatchError::InvalidConfig(
                "workers must be greater than 0".to_owned(),
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(DispatchError::InvalidConfig(
                "thread_name must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
