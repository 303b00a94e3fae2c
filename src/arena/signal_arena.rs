// Signal arena - storage for the listener side of every signal
//
// A signal's payload lives in the `Signal<T>` struct itself. The arena only
// holds the registered-listener set, so that listeners can reach the set of
// the signal they are connected to through a plain `SignalId`, without any
// knowledge of the payload type.
//
// LINK INVARIANT:
// - a ListenerId is in a signal's set iff that listener's link points to the
//   signal and is marked connected
// - every mutation of a set is paired with the matching link mutation in
//   listener_arena, by the caller, before control returns to user code

use crate::hash::{FastHashBuilder, FastHashSet};
use parking_lot::RwLock;
use slab::Slab;

use super::ListenerId;

/// Global signal arena - stores the registered-listener set of every live signal
static SIGNAL_ARENA: RwLock<Slab<SignalMetadata>> = RwLock::new(Slab::new());

/// Unique identifier for a signal in the arena.
///
/// This is a zero-cost wrapper around a slab index. When a Signal is dropped
/// it first disconnects every listener, then frees its slot. Since no listener
/// can still hold the id at that point, index reuse by a later signal is safe.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SignalId(u32);

impl SignalId {
    /// Create a new SignalId from a raw index
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Convert to usize for slab indexing
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Access the signal metadata with a closure (read-only)
    ///
    /// Returns None if the signal has been removed (stale access).
    pub fn with<F, R>(self, f: F) -> Option<R>
    where
        F: FnOnce(&SignalMetadata) -> R,
    {
        let arena = SIGNAL_ARENA.read();
        arena.get(self.index()).map(f)
    }

    /// Add a listener to the registered set.
    ///
    /// Returns true if the listener was not registered before.
    pub fn register(self, listener: ListenerId) -> bool {
        self.with(|metadata| metadata.listeners.write().insert(listener))
            .unwrap_or(false)
    }

    /// Remove a listener from the registered set.
    ///
    /// Returns true if the listener was registered.
    pub fn deregister(self, listener: ListenerId) -> bool {
        self.with(|metadata| metadata.listeners.write().remove(&listener))
            .unwrap_or(false)
    }

    /// Check whether a listener is currently registered
    pub fn contains(self, listener: ListenerId) -> bool {
        self.with(|metadata| metadata.listeners.read().contains(&listener))
            .unwrap_or(false)
    }

    /// Number of registered listeners (0 for a stale id)
    pub fn listener_count(self) -> usize {
        self.with(|metadata| metadata.listeners.read().len())
            .unwrap_or(0)
    }

    /// Copy the registered set out of the arena.
    ///
    /// Dispatch iterates this copy so that no arena lock is held while
    /// listener callbacks run.
    pub fn snapshot(self) -> Vec<ListenerId> {
        self.with(|metadata| metadata.listeners.read().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Take the whole registered set, leaving it empty.
    pub fn drain(self) -> Vec<ListenerId> {
        self.with(|metadata| metadata.listeners.write().drain().collect())
            .unwrap_or_default()
    }
}

/// Metadata for a signal stored in the arena.
#[derive(Debug)]
pub struct SignalMetadata {
    /// Listeners currently subscribed to this signal, keyed by identity.
    pub(crate) listeners: RwLock<FastHashSet<ListenerId>>,
}

impl SignalMetadata {
    /// Create metadata with an empty listener set
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(FastHashSet::with_hasher(FastHashBuilder)),
        }
    }
}

impl Default for SignalMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert a signal into the arena and return its ID
pub fn signal_arena_insert(metadata: SignalMetadata) -> SignalId {
    let mut arena = SIGNAL_ARENA.write();
    let entry = arena.vacant_entry();
    let key = entry.key();
    entry.insert(metadata);
    SignalId::new(key as u32)
}

/// Remove a signal from the arena
pub fn signal_arena_remove(id: SignalId) -> Option<SignalMetadata> {
    let mut arena = SIGNAL_ARENA.write();
    arena.try_remove(id.index())
}
