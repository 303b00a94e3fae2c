use crate::callback::{Callback, MethodBinding};
use crate::{Listener, Signal};
use std::fmt;
use std::sync::{Arc, Weak};

/// Listener bound to a method on a shared instance.
///
/// The instance is held as a [`Weak`] reference. The usual layout keeps the
/// MemberSlot inside the instance it calls into, so dropping the instance
/// drops the slot and unsubscribes it:
///
/// ```ignore
/// struct Window {
///     resized: MemberSlot<Window, Size>,
/// }
///
/// impl Window {
///     fn new() -> Arc<Self> {
///         Arc::new_cyclic(|this| Window {
///             resized: MemberSlot::bound(this.clone(), Window::on_resize),
///         })
///     }
///
///     fn on_resize(&self, size: &Size) { ... }
/// }
/// ```
///
/// If the slot outlives its instance it stays subscribed, but
/// [`is_active`](MemberSlot::is_active) reports false and dispatch to it does
/// nothing.
pub struct MemberSlot<H, T = ()> {
    binding: Arc<MethodBinding<H, T>>,
    listener: Listener<T>,
}

impl<H, T> MemberSlot<H, T>
where
    H: Send + Sync + 'static,
    T: 'static,
{
    /// Create an unbound, unsubscribed slot
    pub fn new() -> Self {
        Self::from_binding(MethodBinding::unbound())
    }

    /// Create a slot already bound to `method` on `instance`
    pub fn bound<F>(instance: Weak<H>, method: F) -> Self
    where
        F: Fn(&H, &T) + Send + Sync + 'static,
    {
        Self::from_binding(MethodBinding::bound(instance, Arc::new(method)))
    }

    fn from_binding(binding: MethodBinding<H, T>) -> Self {
        let binding = Arc::new(binding);
        let callback: Arc<dyn Callback<T>> = binding.clone();
        Self {
            binding,
            listener: Listener::new(callback),
        }
    }

    /// Bind or rebind both the instance and the method.
    /// Subscription state is untouched.
    pub fn bind<F>(&self, instance: Weak<H>, method: F)
    where
        F: Fn(&H, &T) + Send + Sync + 'static,
    {
        self.binding.bind(instance, Arc::new(method));
    }

    /// True if both a live instance and a method are bound
    pub fn is_bound(&self) -> bool {
        self.binding.is_bound()
    }

    /// Unsubscribe, then drop both the instance and the method
    pub fn clear(&self) {
        self.listener.unsubscribe();
        self.binding.unbind();
    }
}

impl<H, T> MemberSlot<H, T> {
    /// Subscribe to `signal`, leaving any other signal first
    pub fn subscribe(&self, signal: &Signal<T>) {
        self.listener.subscribe(signal);
    }

    /// Leave the current signal, if any
    pub fn unsubscribe(&self) {
        self.listener.unsubscribe();
    }

    /// True while subscribed to a signal with a method bound to a live instance
    pub fn is_active(&self) -> bool {
        self.listener.is_connected() && self.binding.is_bound()
    }

    /// True if subscribed to `signal`, whether or not the instance is alive
    pub fn is_subscribed_to(&self, signal: &Signal<T>) -> bool {
        self.listener.is_subscribed_to(signal)
    }

    /// The underlying listener
    pub fn listener(&self) -> &Listener<T> {
        &self.listener
    }
}

impl<H> MemberSlot<H, ()>
where
    H: Send + Sync + 'static,
{
    /// Create a unit-payload slot bound to a method taking no argument
    pub fn bound_thunk<F>(instance: Weak<H>, method: F) -> Self
    where
        F: Fn(&H) + Send + Sync + 'static,
    {
        Self::bound(instance, move |handle: &H, _: &()| method(handle))
    }

    /// Bind or rebind a method taking no argument
    pub fn bind_thunk<F>(&self, instance: Weak<H>, method: F)
    where
        F: Fn(&H) + Send + Sync + 'static,
    {
        self.bind(instance, move |handle: &H, _: &()| method(handle));
    }
}

/// Copies the binding into a fresh listener. If this slot is subscribed, the
/// copy is subscribed to the same signal.
impl<H, T> Clone for MemberSlot<H, T>
where
    H: Send + Sync + 'static,
    T: 'static,
{
    fn clone(&self) -> Self {
        let copy = Self::new();
        if let (Some(instance), Some(method)) = self.binding.parts() {
            copy.binding.bind(instance, method);
        }
        if let Some(signal) = self.listener.connected_signal() {
            copy.listener.attach(signal);
        }
        copy
    }
}

impl<H, T> Default for MemberSlot<H, T>
where
    H: Send + Sync + 'static,
    T: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H, T> fmt::Debug for MemberSlot<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberSlot")
            .field("has_instance", &self.binding.has_instance())
            .field("listener", &self.listener)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Gauge {
        readings: Mutex<Vec<i64>>,
        slot: MemberSlot<Gauge, i64>,
    }

    impl Gauge {
        fn new() -> Arc<Self> {
            Arc::new_cyclic(|this| Gauge {
                readings: Mutex::new(Vec::new()),
                slot: MemberSlot::bound(this.clone(), Gauge::record),
            })
        }

        fn record(&self, value: &i64) {
            self.readings.lock().push(*value);
        }
    }

    #[test]
    fn dropping_instance_unsubscribes_embedded_slot() {
        let mut signal = Signal::with_value(1i64);
        let gauge = Gauge::new();
        gauge.slot.subscribe(&signal);
        assert!(gauge.slot.is_active());

        signal.invoke();
        assert_eq!(*gauge.readings.lock(), [1]);

        drop(gauge);
        assert_eq!(signal.count(), 0);

        signal.set_value(2);
        signal.invoke();
    }

    struct Probe {
        hits: Mutex<u32>,
    }

    impl Probe {
        fn hit(&self) {
            *self.hits.lock() += 1;
        }
    }

    #[test]
    fn slot_outliving_instance_is_inactive_but_subscribed() {
        cov_mark::check!(method_instance_dropped);
        let signal = Signal::new();
        let probe = Arc::new(Probe {
            hits: Mutex::new(0),
        });
        let slot = MemberSlot::bound_thunk(Arc::downgrade(&probe), Probe::hit);
        slot.subscribe(&signal);

        signal.invoke();
        assert_eq!(*probe.hits.lock(), 1);

        drop(probe);
        assert!(!slot.is_active());
        assert!(slot.is_subscribed_to(&signal));
        assert_eq!(signal.count(), 1);

        signal.invoke();
    }

    #[test]
    fn rebind_switches_instance_while_subscribed() {
        let signal = Signal::<()>::new();
        let first = Arc::new(Probe {
            hits: Mutex::new(0),
        });
        let second = Arc::new(Probe {
            hits: Mutex::new(0),
        });
        let slot = MemberSlot::bound_thunk(Arc::downgrade(&first), Probe::hit);
        slot.subscribe(&signal);

        slot.bind_thunk(Arc::downgrade(&second), Probe::hit);
        assert!(slot.is_active());
        signal.invoke();

        assert_eq!(*first.hits.lock(), 0);
        assert_eq!(*second.hits.lock(), 1);
    }

    #[test]
    fn clear_drops_binding_and_subscription() {
        let signal = Signal::<()>::new();
        let probe = Arc::new(Probe {
            hits: Mutex::new(0),
        });
        let slot = MemberSlot::bound_thunk(Arc::downgrade(&probe), Probe::hit);
        slot.subscribe(&signal);

        slot.clear();
        assert!(!slot.is_active());
        assert_eq!(signal.count(), 0);

        // Subscribing an unbound slot is allowed; dispatch skips it.
        slot.subscribe(&signal);
        assert!(!slot.is_active());
        signal.invoke();
        assert_eq!(*probe.hits.lock(), 0);
    }

    #[test]
    fn rebinding_after_clear_reactivates() {
        let signal = Signal::<()>::new();
        let probe = Arc::new(Probe {
            hits: Mutex::new(0),
        });
        let slot = MemberSlot::<Probe, ()>::new();
        slot.subscribe(&signal);
        assert!(!slot.is_active());
        assert_eq!(signal.count(), 1);

        slot.bind_thunk(Arc::downgrade(&probe), Probe::hit);
        assert!(slot.is_active());
        signal.invoke();
        assert_eq!(*probe.hits.lock(), 1);
    }

    #[test]
    fn clone_shares_instance_and_signal() {
        let signal = Signal::<()>::new();
        let probe = Arc::new(Probe {
            hits: Mutex::new(0),
        });
        let slot = MemberSlot::bound_thunk(Arc::downgrade(&probe), Probe::hit);
        slot.subscribe(&signal);

        let copy = slot.clone();
        assert!(copy.is_active());
        assert_eq!(signal.count(), 2);

        signal.invoke();
        assert_eq!(*probe.hits.lock(), 2);
    }
}
