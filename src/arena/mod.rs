// Arena-based storage for both ends of every subscription
//
// This module provides two separate arenas:
// - Signal arena: stores SignalMetadata (the registered-listener set)
// - Listener arena: stores ListenerMetadata (back-reference, connected flag, callback)
//
// Neither side holds a pointer to the other, only an index. Every
// subscribe/unsubscribe/clear updates both arenas before returning, and each
// side clears the other's reference to it before freeing its own slot.

pub mod listener_arena;
pub mod signal_arena;

pub use listener_arena::{
    ListenerId, ListenerMetadata, listener_arena_insert, listener_arena_remove,
};

pub use signal_arena::{SignalId, SignalMetadata, signal_arena_insert, signal_arena_remove};
