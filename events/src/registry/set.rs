//! Per-type listener storage and read-only snapshots.
//!
//! Each event type gets one [`ListenerSet`]. The set keeps its listeners in an
//! immutable, shared list that is replaced on every change (copy-on-write), so a
//! lookup is a reference-count bump and never observes a half-applied update.
//!
//! # Type Erasure
//!
//! The registry stores sets of different event types side by side as
//! `Arc<dyn ErasedListenerSet>` and downcasts back to `ListenerSet<E>` through
//! [`as_any()`](ErasedListenerSet::as_any) when the event type is known.

use std::{
    any::{self, Any},
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{
    event::Event,
    listener::{self, Listener},
};

/// A shared, type-erased listener of event type `E`.
pub type SharedListener<E> = Arc<dyn Listener<Event = E>>;

/// Ordered, duplicate-free listeners for one event type.
pub(crate) struct ListenerSet<E: Event> {
    listeners: RwLock<Arc<[SharedListener<E>]>>,
}

impl<E: Event> ListenerSet<E> {
    pub(crate) fn new() -> Self {
        Self {
            listeners: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Appends `listener` unless the same allocation is already present.
    pub(crate) fn insert(&self, listener: SharedListener<E>) -> bool {
        let mut current = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let id = listener::identity(&listener);
        if current.iter().any(|l| listener::identity(l) == id) {
            return false;
        }

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(listener);
        *current = Arc::from(next);
        true
    }

    /// Removes the listener with the given identity. Order of the others is kept.
    pub(crate) fn remove(&self, id: *const ()) -> bool {
        let mut current = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !current.iter().any(|l| listener::identity(l) == id) {
            return false;
        }

        let next: Vec<_> = current
            .iter()
            .filter(|l| listener::identity(l) != id)
            .cloned()
            .collect();
        *current = Arc::from(next);
        true
    }

    pub(crate) fn contains(&self, id: *const ()) -> bool {
        self.read().iter().any(|l| listener::identity(l) == id)
    }

    /// Returns the current listeners as an immutable snapshot.
    pub(crate) fn snapshot(&self) -> Listeners<E> {
        Listeners {
            listeners: self.read(),
        }
    }

    fn read(&self) -> Arc<[SharedListener<E>]> {
        Arc::clone(&self.listeners.read().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Type-erased interface for listener sets.
///
/// Covers the operations that do not need the concrete event type, plus
/// [`as_any()`](Self::as_any) for downcasting back to `ListenerSet<E>`.
pub(crate) trait ErasedListenerSet: Send + Sync {
    /// Removes every listener.
    fn clear(&self);

    /// Returns the number of registered listeners.
    fn len(&self) -> usize;

    /// Returns a reference to self as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<E: Event> ErasedListenerSet for ListenerSet<E> {
    fn clear(&self) {
        let mut current = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Arc::from(Vec::new());
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Read-only snapshot of the listeners registered for event type `E`.
///
/// Iteration yields listeners in registration order. Later registry changes do
/// not affect a snapshot that was already taken.
pub struct Listeners<E: Event> {
    listeners: Arc<[SharedListener<E>]>,
}

impl<E: Event> Listeners<E> {
    /// An empty snapshot.
    pub fn empty() -> Self {
        Self {
            listeners: Arc::from(Vec::new()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Iterates over the listeners in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedListener<E>> {
        self.listeners.iter()
    }

    /// Returns `true` if this exact listener allocation is in the snapshot.
    pub fn contains<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        let id = listener::identity(listener);
        self.listeners.iter().any(|l| listener::identity(l) == id)
    }

    /// Listener names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }
}

impl<E: Event> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<E: Event> Default for Listeners<E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, E: Event> IntoIterator for &'a Listeners<E> {
    type Item = &'a SharedListener<E>;
    type IntoIter = std::slice::Iter<'a, SharedListener<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.listeners.iter()
    }
}

impl<E: Event> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("event", &any::type_name::<E>())
            .field("listeners", &self.names())
            .finish()
    }
}
