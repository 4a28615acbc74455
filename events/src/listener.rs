//! Typed event listeners.
//!
//! A listener is bound to exactly one event type through its associated
//! [`Event`](Listener::Event) type. The binding is part of the type, so the
//! registry can key a listener without inspecting it at runtime.
//!
//! # Example
//!
//! ```rust,ignore
//! struct PingCounter { calls: AtomicUsize }
//!
//! impl Listener for PingCounter {
//!     type Event = Ping;
//!
//!     fn handle(&self, _event: &Ping) -> HandlerResult {
//!         self.calls.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//!
//! registry.register(Arc::new(PingCounter { calls: AtomicUsize::new(0) }));
//! ```
//!
//! Handlers should return quickly. Heavy work belongs on another thread, or in an
//! event delivered asynchronously.

use std::{any, fmt, marker::PhantomData, sync::Arc};

use crate::{
    error::HandlerResult,
    event::{Event, EventType},
};

/// A handler bound to a single event type.
pub trait Listener: Send + Sync + 'static {
    /// The event type this listener handles.
    type Event: Event;

    /// Handles a dispatched event.
    fn handle(&self, event: &Self::Event) -> HandlerResult;

    /// Name used in logs and failure reports.
    fn name(&self) -> &'static str {
        any::type_name::<Self>()
    }
}

/// Accessors derived from a listener's bound event type.
///
/// Implemented for every [`Listener`] by a blanket impl, so no listener can
/// report a key other than the one the registry files it under.
pub trait ListenerExt: Listener {
    /// The registry key of the bound event type.
    fn event_type(&self) -> EventType;
}

impl<L: Listener + ?Sized> ListenerExt for L {
    #[inline]
    fn event_type(&self) -> EventType {
        EventType::of::<L::Event>()
    }
}

/// A listener backed by a closure.
///
/// Created through [`listener_fn()`] or [`FnListener::named()`].
pub struct FnListener<E, F> {
    name: &'static str,
    handler: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    E: Event,
    F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
{
    /// Wraps `handler` with a name shown in logs and failure reports.
    pub fn named(name: &'static str, handler: F) -> Self {
        Self {
            name,
            handler,
            _event: PhantomData,
        }
    }
}

impl<E, F> Listener for FnListener<E, F>
where
    E: Event,
    F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
{
    type Event = E;

    #[inline]
    fn handle(&self, event: &E) -> HandlerResult {
        (self.handler)(event)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<E, F> fmt::Debug for FnListener<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener")
            .field("name", &self.name)
            .field("event", &any::type_name::<E>())
            .finish()
    }
}

/// Builds a shareable closure listener for event type `E`.
///
/// ```rust,ignore
/// let listener = listener_fn(|ping: &Ping| {
///     log::info!("ping {}", ping.seq);
///     Ok(())
/// });
/// registry.register(listener.clone());
/// ```
pub fn listener_fn<E, F>(handler: F) -> Arc<FnListener<E, F>>
where
    E: Event,
    F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(FnListener::named(any::type_name::<F>(), handler))
}

/// Data pointer of a shared listener, used as its identity in the registry.
///
/// The registry holds a strong reference for every registered listener, so the
/// address cannot be reused while the entry exists.
#[inline]
pub(crate) fn identity<L: ?Sized>(listener: &Arc<L>) -> *const () {
    Arc::as_ptr(listener) as *const ()
}
