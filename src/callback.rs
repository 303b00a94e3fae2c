use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// Shared reference to a free function (or closure) taking the payload.
pub type FunctionRef<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Shared reference to a method taking the bound instance and the payload.
pub type MethodRef<H, T> = Arc<dyn Fn(&H, &T) + Send + Sync>;

/// The capability a signal sees on each of its listeners.
///
/// Both listener variants store one of these in the arena; a signal only ever
/// goes through this trait, never through the listener itself.
pub trait Callback<T>: Send + Sync {
    /// Deliver `value` to whatever is bound.
    ///
    /// Calling an unbound callback does nothing.
    fn call(&self, value: &T);

    /// True if a call would reach user code right now.
    fn is_bound(&self) -> bool;
}

/// Callback bound to a free function.
pub struct FunctionBinding<T> {
    function: RwLock<Option<FunctionRef<T>>>,
}

impl<T> FunctionBinding<T> {
    pub fn unbound() -> Self {
        Self {
            function: RwLock::new(None),
        }
    }

    pub fn bound(function: FunctionRef<T>) -> Self {
        Self {
            function: RwLock::new(Some(function)),
        }
    }

    /// Replace the bound function, returning the previous one
    pub fn bind(&self, function: FunctionRef<T>) -> Option<FunctionRef<T>> {
        self.function.write().replace(function)
    }

    pub fn unbind(&self) -> Option<FunctionRef<T>> {
        self.function.write().take()
    }

    pub fn function(&self) -> Option<FunctionRef<T>> {
        self.function.read().clone()
    }
}

impl<T> Callback<T> for FunctionBinding<T> {
    fn call(&self, value: &T) {
        // Clone out so the function may rebind this listener while running.
        let Some(function) = self.function() else {
            cov_mark::hit!(unbound_function_dispatched);
            tracing::debug!("dispatch to unbound function listener skipped");
            return;
        };
        function(value);
    }

    fn is_bound(&self) -> bool {
        self.function.read().is_some()
    }
}

/// Callback bound to a method on a shared instance.
///
/// The instance is held weakly; once its last strong reference is gone the
/// binding behaves as unbound.
pub struct MethodBinding<H, T> {
    target: RwLock<MethodTarget<H, T>>,
}

struct MethodTarget<H, T> {
    instance: Option<Weak<H>>,
    method: Option<MethodRef<H, T>>,
}

impl<H, T> MethodTarget<H, T> {
    fn empty() -> Self {
        Self {
            instance: None,
            method: None,
        }
    }
}

impl<H, T> Clone for MethodTarget<H, T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            method: self.method.clone(),
        }
    }
}

impl<H, T> MethodBinding<H, T> {
    pub fn unbound() -> Self {
        Self {
            target: RwLock::new(MethodTarget::empty()),
        }
    }

    pub fn bound(instance: Weak<H>, method: MethodRef<H, T>) -> Self {
        let binding = Self::unbound();
        binding.bind(instance, method);
        binding
    }

    /// Replace both the instance and the method
    pub fn bind(&self, instance: Weak<H>, method: MethodRef<H, T>) {
        self.replace(MethodTarget {
            instance: Some(instance),
            method: Some(method),
        });
    }

    pub fn unbind(&self) {
        self.replace(MethodTarget::empty());
    }

    fn replace(&self, target: MethodTarget<H, T>) {
        let previous = std::mem::replace(&mut *self.target.write(), target);
        // Dropped after the write guard: the old method's captures may reach
        // back into this binding from their destructors.
        drop(previous);
    }

    /// True if a method is bound and the instance is still alive
    pub fn is_bound(&self) -> bool {
        let target = self.target.read();
        target.method.is_some()
            && target
                .instance
                .as_ref()
                .is_some_and(|instance| instance.strong_count() > 0)
    }

    /// True while the bound instance is still alive
    pub fn has_instance(&self) -> bool {
        self.target
            .read()
            .instance
            .as_ref()
            .is_some_and(|instance| instance.strong_count() > 0)
    }

    /// Copy of the current instance and method, for cloning a listener
    pub fn parts(&self) -> (Option<Weak<H>>, Option<MethodRef<H, T>>) {
        let target = self.target.read().clone();
        (target.instance, target.method)
    }
}

impl<H, T> Callback<T> for MethodBinding<H, T>
where
    H: Send + Sync,
{
    fn call(&self, value: &T) {
        let target = self.target.read().clone();
        let (Some(instance), Some(method)) = (target.instance, target.method) else {
            cov_mark::hit!(unbound_method_dispatched);
            tracing::debug!("dispatch to unbound method listener skipped");
            return;
        };
        let Some(instance) = instance.upgrade() else {
            cov_mark::hit!(method_instance_dropped);
            tracing::debug!("dispatch to method listener with dropped instance skipped");
            return;
        };
        method(&instance, value);
    }

    fn is_bound(&self) -> bool {
        MethodBinding::is_bound(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn function_binding_calls_latest_function() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let binding = FunctionBinding::<u32>::unbound();
        assert!(!binding.is_bound());

        {
            cov_mark::check!(unbound_function_dispatched);
            binding.call(&1);
        }

        let first = seen.clone();
        binding.bind(Arc::new(move |value: &u32| first.lock().push(("first", *value))));
        binding.call(&2);

        let second = seen.clone();
        binding.bind(Arc::new(move |value: &u32| second.lock().push(("second", *value))));
        binding.call(&3);

        assert_eq!(*seen.lock(), [("first", 2), ("second", 3)]);
    }

    struct Counter {
        total: Mutex<u32>,
    }

    impl Counter {
        fn add(&self, value: &u32) {
            *self.total.lock() += value;
        }
    }

    #[test]
    fn method_binding_follows_instance_lifetime() {
        let counter = Arc::new(Counter {
            total: Mutex::new(0),
        });
        let binding =
            MethodBinding::<Counter, u32>::bound(Arc::downgrade(&counter), Arc::new(Counter::add));
        assert!(binding.is_bound());

        binding.call(&5);
        binding.call(&7);
        assert_eq!(*counter.total.lock(), 12);

        drop(counter);
        assert!(!binding.has_instance());
        assert!(!binding.is_bound());

        cov_mark::check!(method_instance_dropped);
        binding.call(&1);
    }

    #[test]
    fn unbind_clears_both_halves() {
        let counter = Arc::new(Counter {
            total: Mutex::new(0),
        });
        let binding =
            MethodBinding::<Counter, u32>::bound(Arc::downgrade(&counter), Arc::new(Counter::add));
        binding.unbind();

        let (instance, method) = binding.parts();
        assert!(instance.is_none());
        assert!(method.is_none());

        cov_mark::check!(unbound_method_dispatched);
        binding.call(&3);
        assert_eq!(*counter.total.lock(), 0);
    }

    // Records whether the binding still counts as bound when it is dropped
    struct InspectOnDrop {
        binding: Weak<MethodBinding<Counter, u32>>,
        seen: Arc<Mutex<Vec<bool>>>,
    }

    impl Drop for InspectOnDrop {
        fn drop(&mut self) {
            if let Some(binding) = self.binding.upgrade() {
                self.seen.lock().push(binding.is_bound());
            }
        }
    }

    #[test]
    fn replaced_method_can_inspect_binding_while_dropping() {
        let counter = Arc::new(Counter {
            total: Mutex::new(0),
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let method = |binding: &Weak<MethodBinding<Counter, u32>>| -> MethodRef<Counter, u32> {
            let guard = InspectOnDrop {
                binding: binding.clone(),
                seen: seen.clone(),
            };
            Arc::new(move |counter: &Counter, value: &u32| {
                let _ = &guard;
                counter.add(value);
            })
        };
        let binding = Arc::new_cyclic(|this| {
            MethodBinding::bound(Arc::downgrade(&counter), method(this))
        });

        binding.bind(Arc::downgrade(&counter), method(&Arc::downgrade(&binding)));
        assert_eq!(*seen.lock(), [true]);

        binding.unbind();
        assert_eq!(*seen.lock(), [true, false]);
    }
}
