use crate::Signal;
use crate::arena::{
    ListenerId, ListenerMetadata, SignalId, listener_arena_insert, listener_arena_remove,
};
use crate::callback::Callback;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Subscription state shared by every listener variant.
///
/// A Listener owns one slot in the listener arena, holding its back-reference
/// to at most one [`Signal`] and the connected flag. The matching forward
/// reference lives in that signal's registered set. Every method here updates
/// both sides before returning, so the two never disagree once control is back
/// in user code.
///
/// [`Slot`](crate::Slot) and [`MemberSlot`](crate::MemberSlot) are built on
/// top of this. It can also be used directly with a custom [`Callback`].
///
/// # Usage
/// ```ignore
/// let listener = Listener::new(Arc::new(MyCallback));
/// listener.subscribe(&signal);
/// assert!(listener.is_connected());
/// listener.unsubscribe();
/// ```
pub struct Listener<T> {
    id: ListenerId,
    _payload: PhantomData<fn(&T)>,
}

impl<T: 'static> Listener<T> {
    /// Create a disconnected listener dispatching to `callback`
    pub fn new(callback: Arc<dyn Callback<T>>) -> Self {
        let id = listener_arena_insert(ListenerMetadata::new(callback));
        Self {
            id,
            _payload: PhantomData,
        }
    }
}

impl<T> Listener<T> {
    /// Internal id of this listener
    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    /// The signal this listener is connected to, if any
    pub(crate) fn connected_signal(&self) -> Option<SignalId> {
        self.id.link().active_signal()
    }

    /// Subscribe to `signal`.
    ///
    /// If this listener is connected to another signal it is removed from
    /// that signal first. Subscribing to the signal it is already connected
    /// to changes nothing.
    pub fn subscribe(&self, signal: &Signal<T>) {
        self.attach(signal.node_id());
    }

    pub(crate) fn attach(&self, target: SignalId) {
        let previous = self.id.connect(target);
        match previous.active_signal() {
            Some(signal) if signal == target => {
                cov_mark::hit!(resubscribe_same_signal);
            }
            Some(signal) => {
                cov_mark::hit!(resubscribe_moves_listener);
                signal.deregister(self.id);
                tracing::trace!(
                    listener = self.id.index(),
                    from = signal.index(),
                    "listener left previous signal"
                );
            }
            None => {}
        }
        target.register(self.id);
        tracing::trace!(
            listener = self.id.index(),
            signal = target.index(),
            "listener subscribed"
        );
    }

    /// Remove this listener from its signal.
    ///
    /// Safe to call when already disconnected.
    pub fn unsubscribe(&self) {
        let previous = self.id.take_link();
        if let Some(signal) = previous.active_signal() {
            signal.deregister(self.id);
            tracing::trace!(
                listener = self.id.index(),
                signal = signal.index(),
                "listener unsubscribed"
            );
        }
    }

    /// True while this listener is registered with a signal
    pub fn is_connected(&self) -> bool {
        self.connected_signal().is_some()
    }

    /// True if this listener is registered with `signal`
    pub fn is_subscribed_to(&self, signal: &Signal<T>) -> bool {
        self.connected_signal() == Some(signal.node_id())
    }
}

impl<T> Drop for Listener<T> {
    fn drop(&mut self) {
        self.unsubscribe();
        listener_arena_remove(self.id);
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("signal", &self.connected_signal())
            .finish()
    }
}

// NOTE: Listener intentionally does NOT implement Clone.
// Two handles to one arena slot would free it twice. The listener variants
// implement Clone by allocating a fresh listener with the same binding.
