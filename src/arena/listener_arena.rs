// Listener arena - storage for the signal side of every listener
//
// Each entry holds the listener's link (back-reference to at most one signal
// plus the connected flag) and a type-erased handle to its callback. The
// callback handle is installed once at creation; rebinding mutates the
// callback in place, so the handle never has to be swapped.

use parking_lot::{Mutex, RwLock};
use slab::Slab;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use super::SignalId;
use crate::callback::Callback;

/// Global listener arena - stores the link state of every live listener
static LISTENER_ARENA: RwLock<Slab<ListenerMetadata>> = RwLock::new(Slab::new());

/// Source of listener generations, bumped on every insert
static NEXT_GENERATION: AtomicU32 = AtomicU32::new(0);

/// Unique identifier for a listener in the arena.
///
/// A slab index plus the generation the entry was created with. Slab indices
/// are reused as soon as a listener is dropped, and an `invoke()` snapshot can
/// still hold the old id at that point. The generation keeps such an id from
/// matching the listener that took over its slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ListenerId {
    index: u32,
    generation: u32,
}

impl ListenerId {
    /// Create a new ListenerId from a raw index and generation
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Convert to usize for slab indexing
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Access the listener metadata with a closure (read-only)
    ///
    /// Returns None if the listener has been removed, including when its slot
    /// now belongs to a newer listener (stale access).
    pub fn with<F, R>(self, f: F) -> Option<R>
    where
        F: FnOnce(&ListenerMetadata) -> R,
    {
        let arena = LISTENER_ARENA.read();
        arena
            .get(self.index())
            .filter(|metadata| metadata.generation == self.generation)
            .map(f)
    }

    /// Current link state (disconnected for a stale id)
    pub fn link(self) -> Link {
        self.with(|metadata| *metadata.link.lock())
            .unwrap_or_default()
    }

    /// Point the link at `signal` and mark it connected.
    ///
    /// Returns the previous link.
    pub fn connect(self, signal: SignalId) -> Link {
        self.with(|metadata| {
            std::mem::replace(&mut *metadata.link.lock(), Link::connected_to(signal))
        })
        .unwrap_or_default()
    }

    /// Reset the link to disconnected and return what it was.
    pub fn take_link(self) -> Link {
        self.with(|metadata| std::mem::take(&mut *metadata.link.lock()))
            .unwrap_or_default()
    }

    /// Reset the link on behalf of `signal`, which is emptying its own set.
    ///
    /// Does nothing if the link points elsewhere. Returns true if the link
    /// was reset.
    pub fn deactivate_by_signal(self, signal: SignalId) -> bool {
        self.with(|metadata| {
            let mut link = metadata.link.lock();
            if link.signal != Some(signal) {
                return false;
            }
            cov_mark::hit!(listener_deactivated_by_signal);
            *link = Link::default();
            true
        })
        .unwrap_or(false)
    }

    /// Fetch the callback for a payload type.
    ///
    /// Returns None for a stale id or when the listener was created for a
    /// different payload type.
    pub fn callback<T: 'static>(self) -> Option<Arc<dyn Callback<T>>> {
        self.with(|metadata| {
            metadata
                .callback
                .downcast_ref::<Arc<dyn Callback<T>>>()
                .cloned()
        })
        .flatten()
    }
}

/// A listener's back-reference to the signal it is subscribed to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Link {
    /// The signal this listener is registered with, if any
    pub signal: Option<SignalId>,
    /// True while the listener appears in `signal`'s registered set
    pub connected: bool,
}

impl Link {
    fn connected_to(signal: SignalId) -> Self {
        Self {
            signal: Some(signal),
            connected: true,
        }
    }

    /// The connected signal, if both the flag and the back-reference are set
    pub fn active_signal(self) -> Option<SignalId> {
        self.signal.filter(|_| self.connected)
    }
}

/// Metadata for a listener stored in the arena.
pub struct ListenerMetadata {
    generation: u32,

    pub(crate) link: Mutex<Link>,

    /// Holds an `Arc<dyn Callback<T>>` for the listener's payload type.
    pub(crate) callback: Box<dyn Any + Send + Sync>,
}

impl ListenerMetadata {
    /// Create disconnected metadata around a callback
    pub fn new<T: 'static>(callback: Arc<dyn Callback<T>>) -> Self {
        Self {
            generation: 0,
            link: Mutex::new(Link::default()),
            callback: Box::new(callback),
        }
    }
}

/// Insert a listener into the arena and return its ID
pub fn listener_arena_insert(mut metadata: ListenerMetadata) -> ListenerId {
    let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
    metadata.generation = generation;

    let mut arena = LISTENER_ARENA.write();
    let entry = arena.vacant_entry();
    let key = entry.key();
    entry.insert(metadata);
    ListenerId::new(key as u32, generation)
}

/// Remove a listener from the arena
///
/// A stale id leaves the current occupant of its slot alone.
pub fn listener_arena_remove(id: ListenerId) -> Option<ListenerMetadata> {
    let mut arena = LISTENER_ARENA.write();
    let current = arena
        .get(id.index())
        .is_some_and(|metadata| metadata.generation == id.generation);
    if !current {
        return None;
    }
    arena.try_remove(id.index())
}
