//! Dispatch coordinator and delivery strategies.
//!
//! [`Dispatcher`] is the single entry point producers use. For every event it:
//! 1. Takes a snapshot of the listeners registered for the event's type
//! 2. Returns early when the snapshot is empty
//! 3. Hands the event and snapshot to a [`Strategy`]
//!
//! # Strategies
//!
//! - [`Strategy::Immediate`]: runs every handler on the calling thread before
//!   returning. The first handler error aborts the rest of the batch and is
//!   returned to the caller.
//! - [`Strategy::Deferred`]: schedules the batch on the dispatcher's worker pool
//!   and returns right away. Failures are isolated per listener and reported to
//!   the [`FailureSink`].
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = Arc::new(Registry::new());
//! registry.register(listener_fn(|ping: &Ping| {
//!     log::info!("ping {}", ping.seq);
//!     Ok(())
//! }));
//!
//! let dispatcher = Dispatcher::new(Arc::clone(&registry))?;
//!
//! dispatcher.dispatch(&Ping { seq: 1 })?;        // blocks until handled
//! dispatcher.dispatch_async(Ping { seq: 2 })?;   // returns once scheduled
//! Ping { seq: 3 }.dispatch(&dispatcher)?;        // mode chosen by Ping::is_async()
//! ```

mod deferred;
mod failure;
mod immediate;

pub use deferred::Pending;
pub use failure::{DeliveryFailure, FailureCause, FailureSink};

use std::sync::Arc;

use crate::{
    config::Config,
    error::DispatchError,
    event::Event,
    registry::Registry,
    tasks::Executor,
};

/// The two ways a batch can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Same thread, blocking.
    Immediate,
    /// Worker pool, non-blocking.
    Deferred,
}

impl Strategy {
    /// Picks the strategy for a delivery mode flag.
    #[inline]
    pub fn select(is_async: bool) -> Self {
        if is_async {
            Strategy::Deferred
        } else {
            Strategy::Immediate
        }
    }

    /// The strategy for `event`, according to [`Event::is_async()`].
    #[inline]
    pub fn for_event<E: Event>(event: &E) -> Self {
        Self::select(event.is_async())
    }
}

/// Outcome of one delivery batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Listeners that handled the event successfully.
    pub delivered: usize,
    /// Listeners whose failure was isolated. Always 0 for synchronous delivery.
    pub failed: usize,
}

/// Resolves listeners for events and delivers to them.
///
/// A dispatcher owns its worker pool. Dropping it lets every batch that was
/// already scheduled finish, then joins the workers.
pub struct Dispatcher {
    registry: Arc<Registry>,
    executor: Executor,
    failures: FailureSink,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry` with the default [`Config`].
    pub fn new(registry: Arc<Registry>) -> Result<Self, DispatchError> {
        Self::with_config(registry, Config::default())
    }

    /// Creates a dispatcher over `registry` with a custom [`Config`].
    pub fn with_config(registry: Arc<Registry>, config: Config) -> Result<Self, DispatchError> {
        config.validate()?;
        let executor = Executor::new(config.workers, &config.thread_name)?;
        log::debug!(
            "started event dispatcher with {} worker(s) named {}-*",
            executor.size(),
            config.thread_name
        );

        Ok(Self {
            registry,
            executor,
            failures: FailureSink::default(),
        })
    }

    /// Routes failures isolated during asynchronous delivery to `sink`.
    pub fn with_failure_sink(mut self, sink: FailureSink) -> Self {
        self.failures = sink;
        self
    }

    /// The registry this dispatcher resolves listeners from.
    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Number of worker threads delivering asynchronous batches.
    #[inline]
    pub fn workers(&self) -> usize {
        self.executor.size()
    }

    /// Delivers `event` synchronously on the calling thread.
    ///
    /// Returns after every listener ran, or with the first handler error. With no
    /// listeners registered this is a no-op.
    pub fn dispatch<E: Event>(&self, event: &E) -> Result<BatchReport, DispatchError> {
        let listeners = self.registry.listeners_for(event);
        if listeners.is_empty() {
            log::trace!("no listeners for {}", std::any::type_name::<E>());
            return Ok(BatchReport::default());
        }

        log::trace!(
            "dispatching {} to {} listener(s)",
            std::any::type_name::<E>(),
            listeners.len()
        );
        immediate::dispatch_to(event, &listeners)
    }

    /// Schedules delivery of `event` on the worker pool and returns without
    /// waiting for any handler.
    ///
    /// The returned [`Pending`] can be ignored or waited on. With no listeners
    /// registered nothing is scheduled.
    pub fn dispatch_async<E: Event>(&self, event: E) -> Result<Pending, DispatchError> {
        let listeners = self.registry.listeners_for(&event);
        if listeners.is_empty() {
            log::trace!("no listeners for {}", std::any::type_name::<E>());
            return Ok(Pending::done::<E>(BatchReport::default()));
        }

        log::trace!(
            "scheduling {} for {} listener(s)",
            std::any::type_name::<E>(),
            listeners.len()
        );
        deferred::dispatch_to(event, listeners, &self.executor.handle(), &self.failures)
    }

    /// Dispatches `event` on the path selected by [`Event::is_async()`].
    pub fn post<E: Event>(&self, event: E) -> Result<(), DispatchError> {
        match Strategy::for_event(&event) {
            Strategy::Immediate => self.dispatch(&event).map(|_| ()),
            Strategy::Deferred => self.dispatch_async(event).map(|_| ()),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.workers())
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}
