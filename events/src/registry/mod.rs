//! Thread-safe registry mapping event types to their listeners.
//!
//! This module provides [`Registry`], which owns one ordered listener list per
//! event type. Lookups return a read-only [`Listeners`] snapshot that the
//! dispatcher delivers against.
//!
//! # Thread Safety
//!
//! The type map is a `DashMap`, so lookups of different types never contend. A
//! type's list is created the first time a listener is registered for it through
//! the map's entry API: when two threads race on a previously unseen type,
//! exactly one list is installed and both registrations land in it. Each list
//! is copy-on-write, so readers never see a partially applied change.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = Registry::new();
//!
//! let listener = listener_fn(|_: &Ping| Ok(()));
//! assert!(registry.register(listener.clone()));
//! assert!(!registry.register(listener.clone())); // duplicate
//!
//! assert_eq!(registry.listeners::<Ping>().len(), 1);
//!
//! registry.unregister_all(EventType::of::<Ping>());
//! assert!(registry.listeners::<Ping>().is_empty());
//! ```

mod set;

pub use set::{Listeners, SharedListener};

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    event::{Event, EventType},
    listener::{self, Listener, ListenerExt},
};

use set::{ErasedListenerSet, ListenerSet};

/// Registry of listeners keyed by event type.
///
/// Keys are exact types: a listener for one type never receives events of any
/// other type. Entries are created lazily on first registration and are only
/// emptied, never removed, by [`unregister_all()`](Self::unregister_all).
#[derive(Default)]
pub struct Registry {
    sets: DashMap<EventType, Arc<dyn ErasedListenerSet>>,
}

impl Registry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            sets: DashMap::new(),
        }
    }

    /// Registers `listener` for its bound event type.
    ///
    /// Returns `false` if this listener is already registered.
    pub fn register<L: Listener>(&self, listener: Arc<L>) -> bool {
        let shared: SharedListener<L::Event> = listener;
        self.register_shared(shared)
    }

    /// Registers an already type-erased listener for event type `E`.
    pub fn register_shared<E: Event>(&self, listener: SharedListener<E>) -> bool {
        let event_type = EventType::of::<E>();
        let name = listener.name();
        let set = self.set_or_insert::<E>();
        let added = match downcast::<E>(set.as_ref()) {
            Some(set) => set.insert(listener),
            None => false,
        };

        if added {
            log::debug!("registered listener {name} for {event_type}");
        } else {
            log::debug!("listener {name} already registered for {event_type}");
        }
        added
    }

    /// Removes `listener` from its bound event type.
    ///
    /// Returns `false` if the listener was not registered.
    pub fn unregister<L>(&self, listener: &Arc<L>) -> bool
    where
        L: Listener + ?Sized,
    {
        let event_type = listener.event_type();
        let Some(set) = self.set(&event_type) else {
            return false;
        };
        let removed = downcast::<L::Event>(set.as_ref())
            .is_some_and(|set| set.remove(listener::identity(listener)));

        if removed {
            log::debug!("unregistered listener {} from {event_type}", listener.name());
        }
        removed
    }

    /// Removes every listener registered for `event_type`.
    ///
    /// No-op if nothing is registered for the type.
    pub fn unregister_all(&self, event_type: EventType) {
        if let Some(set) = self.set(&event_type) {
            let count = set.len();
            set.clear();
            log::debug!("unregistered {count} listener(s) from {event_type}");
        }
    }

    /// Returns a snapshot of the listeners registered for `E`.
    ///
    /// The snapshot is empty when nothing is registered.
    pub fn listeners<E: Event>(&self) -> Listeners<E> {
        self.set(&EventType::of::<E>())
            .and_then(|set| downcast::<E>(set.as_ref()).map(ListenerSet::snapshot))
            .unwrap_or_default()
    }

    /// Returns a snapshot of the listeners registered for the type of `event`.
    #[inline]
    pub fn listeners_for<E: Event>(&self, _event: &E) -> Listeners<E> {
        self.listeners::<E>()
    }

    /// Returns `true` if `listener` is registered for its bound event type.
    pub fn contains<L>(&self, listener: &Arc<L>) -> bool
    where
        L: Listener + ?Sized,
    {
        let id = listener::identity(listener);
        self.set(&listener.event_type())
            .and_then(|set| downcast::<L::Event>(set.as_ref()).map(|set| set.contains(id)))
            .unwrap_or(false)
    }

    /// Number of listeners currently registered for `event_type`.
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.set(&event_type).map_or(0, |set| set.len())
    }

    /// Every event type that has an entry, including emptied ones.
    pub fn event_types(&self) -> Vec<EventType> {
        self.sets.iter().map(|entry| *entry.key()).collect()
    }

    fn set(&self, event_type: &EventType) -> Option<Arc<dyn ErasedListenerSet>> {
        self.sets.get(event_type).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the list for `E`, installing an empty one if absent.
    fn set_or_insert<E: Event>(&self) -> Arc<dyn ErasedListenerSet> {
        let entry = self
            .sets
            .entry(EventType::of::<E>())
            .or_insert_with(|| Arc::new(ListenerSet::<E>::new()) as Arc<dyn ErasedListenerSet>);
        Arc::clone(entry.value())
    }
}

fn downcast<E: Event>(set: &dyn ErasedListenerSet) -> Option<&ListenerSet<E>> {
    let typed = set.as_any().downcast_ref::<ListenerSet<E>>();
    if typed.is_none() {
        log::error!(
            "listener set for {} holds a different event type",
            std::any::type_name::<E>()
        );
    }
    typed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::listener_fn;
    use std::thread;

    struct Ping;
    impl Event for Ping {}

    struct Pong;
    impl Event for Pong {}

    fn ping_listener() -> SharedListener<Ping> {
        listener_fn(|_: &Ping| Ok(()))
    }

    // ==================== Registration ====================

    #[test]
    fn new_registry_has_no_listeners() {
        let registry = Registry::new();

        assert!(registry.listeners::<Ping>().is_empty());
        assert!(registry.event_types().is_empty());
    }

    #[test]
    fn register_adds_listener() {
        // Given
        let registry = Registry::new();
        let listener = ping_listener();

        // When
        let added = registry.register_shared(Arc::clone(&listener));

        // Then
        assert!(added);
        assert!(registry.contains(&listener));
        assert_eq!(registry.listener_count(EventType::of::<Ping>()), 1);
    }

    #[test]
    fn register_same_listener_twice_keeps_one_entry() {
        // Given
        let registry = Registry::new();
        let listener = listener_fn(|_: &Ping| Ok(()));

        // When
        let first = registry.register(Arc::clone(&listener));
        let second = registry.register(Arc::clone(&listener));

        // Then
        assert!(first);
        assert!(!second);
        assert_eq!(registry.listeners::<Ping>().len(), 1);
    }

    #[test]
    fn listeners_are_keyed_by_exact_type() {
        // Given
        let registry = Registry::new();
        registry.register(listener_fn(|_: &Ping| Ok(())));

        // Then
        assert_eq!(registry.listeners::<Ping>().len(), 1);
        assert!(registry.listeners::<Pong>().is_empty());
    }

    #[test]
    fn listeners_for_resolves_value_type() {
        let registry = Registry::new();
        registry.register(listener_fn(|_: &Ping| Ok(())));
        registry.register(listener_fn(|_: &Ping| Ok(())));

        assert_eq!(registry.listeners_for(&Ping).len(), 2);
        assert!(registry.listeners_for(&Pong).is_empty());
    }

    // ==================== Removal ====================

    #[test]
    fn unregister_removes_listener() {
        // Given
        let registry = Registry::new();
        let listener = ping_listener();
        registry.register_shared(Arc::clone(&listener));

        // When
        let removed = registry.unregister(&listener);

        // Then
        assert!(removed);
        assert!(!registry.contains(&listener));
        assert!(registry.listeners::<Ping>().is_empty());
    }

    #[test]
    fn unregister_missing_returns_false() {
        // Given
        let registry = Registry::new();
        let registered = ping_listener();
        let stranger = ping_listener();
        registry.register_shared(Arc::clone(&registered));

        // When
        let removed = registry.unregister(&stranger);

        // Then
        assert!(!removed);
        assert_eq!(registry.listeners::<Ping>().len(), 1);
    }

    #[test]
    fn unregister_unseen_type_does_not_create_entry() {
        let registry = Registry::new();

        assert!(!registry.unregister(&ping_listener()));
        assert!(registry.event_types().is_empty());
    }

    #[test]
    fn unregister_all_empties_but_keeps_entry() {
        // Given
        let registry = Registry::new();
        registry.register_shared(ping_listener());
        registry.register_shared(ping_listener());

        // When
        registry.unregister_all(EventType::of::<Ping>());

        // Then
        assert!(registry.listeners::<Ping>().is_empty());
        assert_eq!(registry.event_types(), vec![EventType::of::<Ping>()]);
    }

    #[test]
    fn register_after_unregister_all_shows_only_new_listener() {
        // Given
        let registry = Registry::new();
        registry.register_shared(ping_listener());
        registry.unregister_all(EventType::of::<Ping>());

        // When
        let fresh = ping_listener();
        assert!(registry.register_shared(Arc::clone(&fresh)));

        // Then
        let listeners = registry.listeners::<Ping>();
        assert_eq!(listeners.len(), 1);
        assert!(listeners.contains(&fresh));
    }

    #[test]
    fn unregister_all_on_unseen_type_is_noop() {
        let registry = Registry::new();

        registry.unregister_all(EventType::of::<Pong>());

        assert!(registry.event_types().is_empty());
    }

    // ==================== Concurrent Registration ====================

    #[test]
    fn concurrent_registration_keeps_every_listener() {
        // Given
        let registry = Arc::new(Registry::new());
        let listeners: Vec<_> = (0..16).map(|_| ping_listener()).collect();

        // When
        let handles: Vec<_> = listeners
            .iter()
            .map(|listener| {
                let registry = Arc::clone(&registry);
                let listener = Arc::clone(listener);
                thread::spawn(move || registry.register_shared(listener))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Then
        assert!(results.iter().all(|added| *added));
        let snapshot = registry.listeners::<Ping>();
        assert_eq!(snapshot.len(), 16);
        assert!(listeners.iter().all(|l| snapshot.contains(l)));
    }

    #[test]
    fn concurrent_duplicate_registration_adds_once() {
        // Given
        let registry = Arc::new(Registry::new());
        let listener = ping_listener();

        // When
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let listener = Arc::clone(&listener);
                thread::spawn(move || registry.register_shared(listener))
            })
            .collect();
        let added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();

        // Then
        assert_eq!(added, 1);
        assert_eq!(registry.listeners::<Ping>().len(), 1);
    }
}
