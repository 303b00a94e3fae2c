#![deny(missing_docs)]

//! Signals and slots with a consistent subscription lifecycle.
//!
//! A [`Signal`] holds a value and a set of subscribed listeners. Calling
//! [`invoke()`](Signal::invoke) hands the current value to every one of them.
//! Listeners come in two flavours: [`Slot`] calls a free function or closure,
//! [`MemberSlot`] calls a method on an instance it holds weakly.
//!
//! The link between a signal and a listener is kept on both sides. Either side
//! can cut it (the listener by unsubscribing or being dropped, the signal by
//! being cleared or dropped) and the other side always sees the result, in any
//! destruction order.
//!
//! # Quick Start
//!
//! ```ignore
//! use siglot::{MemberSlot, Signal, Slot};
//!
//! fn plain(text: &String) {
//!     println!("[Plain]: {text}");
//! }
//!
//! let mut signal = Signal::with_value(String::new());
//! let slot = Slot::from_fn(plain);
//! slot.subscribe(&signal);
//!
//! signal.set_value("Plain only".to_string());
//! signal.invoke();
//!
//! slot.unsubscribe();
//! signal.invoke();  // nothing subscribed, nothing printed
//! ```
//!
//! # Unit payload
//!
//! Every type defaults its payload parameter to `()`, and the `*_thunk`
//! constructors take callbacks with no argument:
//!
//! ```ignore
//! let tick: Signal = Signal::new();
//! let slot = Slot::from_thunk(|| println!("tick"));
//! slot.subscribe(&tick);
//! tick.invoke();
//! ```
//!
//! # Moving listeners
//!
//! Signals cannot be cloned. [`Signal::rehome_from`] moves every listener of
//! one signal onto another, updating each listener's back-reference.
//!
//! # Threads
//!
//! All bookkeeping sits behind locks, so the types are `Send` and `Sync` when
//! the payload is. The protocol itself is synchronous: `invoke()` runs every
//! callback on the calling thread, and concurrent mutation of one signal from
//! several threads must be serialized by the caller.

// Internal modules
pub(crate) mod arena;
mod callback;
mod hash;
mod listener;
mod member_slot;
mod signal;
mod slot;

// Core types
pub use listener::Listener;
pub use member_slot::MemberSlot;
pub use signal::Signal;
pub use slot::Slot;

// Dispatch capability
pub use callback::Callback;

/// Payload type for signals that carry no data.
pub type VoidData = ();
