//! Zero-sized hash builder for the registered-listener sets.
//!
//! Listener sets are keyed by arena index. Using foldhash with a fixed seed
//! keeps iteration order deterministic across runs while staying independent
//! of the order in which listeners subscribed.

use std::collections::HashSet;
use std::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

const LISTENER_SET_SEED: u64 = 0x2f6b_1c0e_93a5_d147;

/// A zero-sized BuildHasher backed by foldhash with a fixed seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastHashBuilder;

impl BuildHasher for FastHashBuilder {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FixedState::with_seed(LISTENER_SET_SEED).build_hasher()
    }
}

/// Set type used by signals to hold their registered listeners.
pub type FastHashSet<K> = HashSet<K, FastHashBuilder>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_is_zero_sized() {
        assert_eq!(std::mem::size_of::<FastHashBuilder>(), 0);
    }

    #[test]
    fn hashing_is_stable_across_builders() {
        let first = FastHashBuilder.hash_one(7u32);
        let second = FastHashBuilder.hash_one(7u32);
        assert_eq!(first, second);
    }
}
