use crate::callback::{Callback, FunctionBinding};
use crate::{Listener, Signal};
use std::fmt;
use std::sync::Arc;

/// Listener bound to a free function or closure.
///
/// States: unbound until [`bind`](Slot::bind), active once bound and
/// subscribed, back to bound after [`unsubscribe`](Slot::unsubscribe) or when
/// its signal is cleared or dropped, and unbound again after
/// [`clear`](Slot::clear). An unbound slot may still subscribe; it is counted
/// by the signal but never active.
/// Dropping a Slot unsubscribes it.
///
/// ```ignore
/// fn on_event(event: &Event) { ... }
///
/// let slot = Slot::from_fn(on_event);
/// slot.subscribe(&signal);
///
/// // Unit payload: the callback takes no argument
/// let tick = Slot::from_thunk(|| println!("tick"));
/// ```
pub struct Slot<T = ()> {
    binding: Arc<FunctionBinding<T>>,
    listener: Listener<T>,
}

impl<T: 'static> Slot<T> {
    /// Create an unbound, unsubscribed slot
    pub fn new() -> Self {
        Self::from_binding(FunctionBinding::unbound())
    }

    /// Create a slot already bound to `function`
    pub fn from_fn<F>(function: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::from_binding(FunctionBinding::bound(Arc::new(function)))
    }

    fn from_binding(binding: FunctionBinding<T>) -> Self {
        let binding = Arc::new(binding);
        let callback: Arc<dyn Callback<T>> = binding.clone();
        Self {
            binding,
            listener: Listener::new(callback),
        }
    }

    /// Bind or rebind the function. Subscription state is untouched.
    pub fn bind<F>(&self, function: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.binding.bind(Arc::new(function));
    }

    /// Unsubscribe, then drop the bound function
    pub fn clear(&self) {
        self.listener.unsubscribe();
        self.binding.unbind();
    }
}

impl<T> Slot<T> {
    /// Subscribe to `signal`, leaving any other signal first
    pub fn subscribe(&self, signal: &Signal<T>) {
        self.listener.subscribe(signal);
    }

    /// Leave the current signal, if any
    pub fn unsubscribe(&self) {
        self.listener.unsubscribe();
    }

    /// True while subscribed to a signal with a function bound
    pub fn is_active(&self) -> bool {
        self.listener.is_connected() && self.binding.is_bound()
    }

    /// True if a function is bound
    pub fn is_bound(&self) -> bool {
        self.binding.is_bound()
    }

    /// True if subscribed to `signal`
    pub fn is_subscribed_to(&self, signal: &Signal<T>) -> bool {
        self.listener.is_subscribed_to(signal)
    }

    /// The underlying listener
    pub fn listener(&self) -> &Listener<T> {
        &self.listener
    }
}

impl Slot<()> {
    /// Create a unit-payload slot bound to a function taking no argument
    pub fn from_thunk<F>(function: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::from_fn(move |_: &()| function())
    }

    /// Bind or rebind a function taking no argument
    pub fn bind_thunk<F>(&self, function: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.bind(move |_: &()| function());
    }
}

/// Copies the binding into a fresh listener. If this slot is active, the copy
/// is subscribed to the same signal.
impl<T: 'static> Clone for Slot<T> {
    fn clone(&self) -> Self {
        let copy = match self.binding.function() {
            Some(function) => Self::from_binding(FunctionBinding::bound(function)),
            None => Self::new(),
        };
        if let Some(signal) = self.listener.connected_signal() {
            copy.listener.attach(signal);
        }
        copy
    }
}

impl<T: 'static> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("bound", &self.is_bound())
            .field("listener", &self.listener)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn unbound_slot_can_subscribe_but_does_nothing() {
        cov_mark::check!(unbound_function_dispatched);
        let signal = Signal::with_value(1u8);
        let slot = Slot::<u8>::new();
        assert!(!slot.is_bound());

        slot.subscribe(&signal);
        assert!(!slot.is_active());
        assert_eq!(signal.count(), 1);
        signal.invoke();
    }

    #[test]
    fn rebinding_keeps_subscription() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal = Signal::with_value(10u8);

        let old = log.clone();
        let slot = Slot::from_fn(move |value: &u8| old.lock().push(("old", *value)));
        slot.subscribe(&signal);

        let new = log.clone();
        slot.bind(move |value: &u8| new.lock().push(("new", *value)));
        assert!(slot.is_active());

        signal.invoke();
        assert_eq!(*log.lock(), [("new", 10)]);
    }

    #[test]
    fn clear_returns_to_unbound() {
        let signal = Signal::with_value(0u8);
        let slot = Slot::from_fn(|_: &u8| {});
        slot.subscribe(&signal);

        slot.clear();
        assert!(!slot.is_active());
        assert!(!slot.is_bound());
        assert_eq!(signal.count(), 0);

        // Subscribed again but still unbound
        slot.subscribe(&signal);
        assert!(!slot.is_active());
        assert!(slot.is_subscribed_to(&signal));

        slot.bind(|_: &u8| {});
        assert!(slot.is_active());
    }

    #[test]
    fn clone_joins_the_same_signal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal = Signal::with_value(3u8);
        let sink = log.clone();
        let original = Slot::from_fn(move |value: &u8| sink.lock().push(*value));
        original.subscribe(&signal);

        let copy = original.clone();
        assert!(copy.is_subscribed_to(&signal));
        assert_eq!(signal.count(), 2);

        signal.invoke();
        assert_eq!(*log.lock(), [3, 3]);

        // Rebinding the copy leaves the original alone.
        copy.bind(|_: &u8| {});
        log.lock().clear();
        signal.invoke();
        assert_eq!(*log.lock(), [3]);
    }

    #[test]
    fn clone_of_inactive_slot_stays_inactive() {
        let slot = Slot::from_fn(|_: &u8| {});
        let copy = slot.clone();
        assert!(copy.is_bound());
        assert!(!copy.is_active());
    }

    #[test]
    fn thunk_slot_fires_on_unit_signal() {
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let signal = Signal::new();
        let slot = Slot::from_thunk(move || *counter.lock() += 1);
        slot.subscribe(&signal);

        signal.invoke();
        signal.invoke();
        assert_eq!(*hits.lock(), 2);

        let counter = hits.clone();
        slot.bind_thunk(move || *counter.lock() += 10);
        signal.invoke();
        assert_eq!(*hits.lock(), 12);
    }
}
