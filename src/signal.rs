use crate::Listener;
use crate::arena::{SignalId, SignalMetadata, signal_arena_insert, signal_arena_remove};
use std::fmt;

/// Payload-holding publisher that dispatches to its subscribed listeners.
///
/// The value lives in the Signal itself; the set of subscribed listeners
/// lives in the signal arena so that listeners can find it again through a
/// plain id. The Signal never owns its listeners.
///
/// # Usage
/// ```ignore
/// let mut signal = Signal::with_value(String::new());
/// let slot = Slot::from_fn(|text: &String| println!("{text}"));
/// slot.subscribe(&signal);
///
/// signal.set_value("hello".to_string());
/// signal.invoke();  // prints "hello"
/// ```
///
/// # Dispatch during dispatch
/// [`invoke`](Signal::invoke) iterates a snapshot of the registered set.
/// Callbacks may subscribe, unsubscribe, clear or drop listeners of this
/// same signal. A listener removed before its turn is skipped; a listener
/// added during dispatch is first called on the next invoke.
pub struct Signal<T = ()> {
    node_id: SignalId,
    value: T,
}

impl<T: Default> Signal<T> {
    /// Create a signal holding `T::default()` with no listeners
    pub fn new() -> Self {
        Self::with_value(T::default())
    }
}

impl<T> Signal<T> {
    /// Create a signal holding `value` with no listeners
    pub fn with_value(value: T) -> Self {
        let node_id = signal_arena_insert(SignalMetadata::new());
        Signal { node_id, value }
    }

    /// Get the node ID for this signal (internal use only)
    pub(crate) fn node_id(&self) -> SignalId {
        self.node_id
    }

    /// The payload delivered on the next invoke
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutable access to the payload. Listeners are not notified.
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Overwrite the payload. Listeners are not notified.
    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }

    /// Overwrite the payload and return the previous one
    pub fn replace(&mut self, value: T) -> T {
        std::mem::replace(&mut self.value, value)
    }

    /// Number of subscribed listeners
    pub fn count(&self) -> usize {
        self.node_id.listener_count()
    }

    /// True if no listener is subscribed
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// True if `listener` is subscribed to this signal
    pub fn contains(&self, listener: &Listener<T>) -> bool {
        self.node_id.contains(listener.id())
    }

    /// Call every subscribed listener with the current value.
    pub fn invoke(&self)
    where
        T: 'static,
    {
        for listener in self.node_id.snapshot() {
            // Skip anything an earlier callback in this round unsubscribed.
            if !self.node_id.contains(listener) {
                cov_mark::hit!(listener_removed_during_invoke);
                continue;
            }
            let Some(callback) = listener.callback::<T>() else {
                tracing::debug!(
                    listener = listener.index(),
                    signal = self.node_id.index(),
                    "listener has no callback for this payload type"
                );
                continue;
            };
            callback.call(&self.value);
        }
    }

    /// Disconnect every listener.
    ///
    /// Each listener is reset to disconnected without going through its own
    /// unsubscribe path, and the registered set is left empty. Calling this
    /// on an empty signal does nothing.
    pub fn clear(&self) {
        let listeners = self.node_id.drain();
        for listener in &listeners {
            listener.deactivate_by_signal(self.node_id);
        }
        if !listeners.is_empty() {
            tracing::trace!(
                signal = self.node_id.index(),
                count = listeners.len(),
                "signal cleared listeners"
            );
        }
    }

    /// Move every listener of `other` onto this signal.
    ///
    /// Each moved listener's back-reference is updated along with both sets,
    /// so afterwards `other` is empty and every moved listener reports this
    /// signal as its own. Listeners already subscribed here are unaffected.
    pub fn rehome_from(&self, other: &Signal<T>) {
        if other.node_id == self.node_id {
            return;
        }
        let listeners = other.node_id.drain();
        for listener in &listeners {
            listener.connect(self.node_id);
            self.node_id.register(*listener);
        }
        tracing::trace!(
            from = other.node_id.index(),
            to = self.node_id.index(),
            count = listeners.len(),
            "listeners rehomed"
        );
    }
}

impl<T> Drop for Signal<T> {
    fn drop(&mut self) {
        self.clear();
        signal_arena_remove(self.node_id);
    }
}

// NOTE: Signal intentionally does NOT implement Clone.
// A copied listener set would leave listeners whose back-reference points at
// the original. Use `rehome_from` to move listeners between signals.

impl<T: Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.value)
            .field("listeners", &self.count())
            .finish()
    }
}
