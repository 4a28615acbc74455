//! Event marker trait and the type key used by the registry.
//!
//! Any `Send + Sync + 'static` type can become an event by implementing [`Event`].
//! Events carry no required data; the only thing the dispatch engine reads from
//! them is their delivery mode.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Ping;
//! impl Event for Ping {}
//!
//! struct AuditRecord { line: String }
//! impl Event for AuditRecord {
//!     const ASYNC: bool = true;
//! }
//! ```

use std::{
    any::{self, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

use crate::{
    dispatch::Dispatcher,
    error::DispatchError,
};

/// Marker trait for event types.
///
/// Events must be:
/// - `'static`: No borrowed data
/// - `Send + Sync`: Asynchronous delivery moves the event to a worker thread
///
/// The delivery mode is fixed per type through [`ASYNC`](Self::ASYNC). Types that
/// need a per-value decision can override [`is_async()`](Self::is_async) instead.
pub trait Event: Send + Sync + 'static {
    /// Whether instances of this type are delivered asynchronously by default.
    const ASYNC: bool = false;

    /// Returns whether this event is delivered asynchronously when dispatched
    /// through [`dispatch()`](Self::dispatch) or [`Dispatcher::post()`].
    #[inline]
    fn is_async(&self) -> bool {
        Self::ASYNC
    }

    /// Dispatches this event, choosing the synchronous or asynchronous path from
    /// [`is_async()`](Self::is_async).
    fn dispatch(self, dispatcher: &Dispatcher) -> Result<(), DispatchError>
    where
        Self: Sized,
    {
        dispatcher.post(self)
    }
}

/// Registry key identifying a concrete event type.
///
/// Equality and hashing only consider the [`TypeId`]; the name is kept for
/// diagnostics. Matching is exact: there is no relation between distinct types.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Returns the key for event type `E`.
    #[inline]
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: any::type_name::<E>(),
        }
    }

    /// The Rust `TypeId` of the event type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name of the event type.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    impl Event for Ping {}

    struct Audit;
    impl Event for Audit {
        const ASYNC: bool = true;
    }

    struct Flagged {
        background: bool,
    }
    impl Event for Flagged {
        fn is_async(&self) -> bool {
            self.background
        }
    }

    // ==================== Delivery Mode ====================

    #[test]
    fn events_are_sync_by_default() {
        assert!(!Ping.is_async());
    }

    #[test]
    fn type_level_async_flag_applies_to_every_instance() {
        assert!(Audit.is_async());
        assert!(<Audit as Event>::ASYNC);
    }

    #[test]
    fn is_async_can_be_decided_per_value() {
        assert!(Flagged { background: true }.is_async());
        assert!(!Flagged { background: false }.is_async());
    }

    // ==================== Event Type Keys ====================

    #[test]
    fn same_type_yields_equal_keys() {
        assert_eq!(EventType::of::<Ping>(), EventType::of::<Ping>());
    }

    #[test]
    fn different_types_yield_different_keys() {
        assert_ne!(EventType::of::<Ping>(), EventType::of::<Audit>());
    }

    #[test]
    fn name_reports_type_name() {
        let key = EventType::of::<Ping>();

        assert!(key.name().ends_with("Ping"));
        assert_eq!(key.to_string(), key.name());
        assert_eq!(key.type_id(), TypeId::of::<Ping>());
    }
}
