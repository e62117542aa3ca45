// signature.rs - Component-set bit vectors
//
// A signature encodes the set of component kinds an archetype stores, one bit
// per registered kind. Two archetypes are identical iff their signatures are
// equal, and query matching is a pair of word-wise mask tests.

use crate::ecs::ComponentTypeId;

/// Upper bound on distinct component kinds per world.
pub const MAX_COMPONENT_KINDS: usize = 256;

const WORDS: usize = MAX_COMPONENT_KINDS / 64;

/// Fixed-size bit vector over component type ids.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    words: [u64; WORDS],
}

impl Signature {
    pub const EMPTY: Signature = Signature { words: [0; WORDS] };

    /// Build a signature from a list of type ids (need not be sorted).
    pub fn from_ids(ids: &[ComponentTypeId]) -> Self {
        let mut signature = Self::EMPTY;
        for &id in ids {
            signature.set(id);
        }
        signature
    }

    #[inline]
    pub fn set(&mut self, id: ComponentTypeId) {
        debug_assert!((id as usize) < MAX_COMPONENT_KINDS);
        self.words[id as usize / 64] |= 1 << (id as usize % 64);
    }

    #[inline]
    pub fn clear(&mut self, id: ComponentTypeId) {
        debug_assert!((id as usize) < MAX_COMPONENT_KINDS);
        self.words[id as usize / 64] &= !(1 << (id as usize % 64));
    }

    /// Copy with one additional bit set.
    pub fn with(mut self, id: ComponentTypeId) -> Self {
        self.set(id);
        self
    }

    /// Copy with one bit cleared.
    pub fn without(mut self, id: ComponentTypeId) -> Self {
        self.clear(id);
        self
    }

    #[inline]
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        debug_assert!((id as usize) < MAX_COMPONENT_KINDS);
        self.words[id as usize / 64] & (1 << (id as usize % 64)) != 0
    }

    /// True when every bit of `required` is set in `self`.
    #[inline]
    pub fn contains_all(&self, required: &Signature) -> bool {
        self.words
            .iter()
            .zip(required.words.iter())
            .all(|(word, req)| word & req == *req)
    }

    /// True when `self` and `other` share no bits.
    #[inline]
    pub fn is_disjoint(&self, other: &Signature) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & b == 0)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Archetype/query matching predicate.
    #[inline]
    pub fn matches(&self, required: &Signature, excluded: &Signature) -> bool {
        self.contains_all(required) && self.is_disjoint(excluded)
    }
}
