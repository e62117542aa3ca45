//! Entity handle with generational index
//!
//! Entities are lightweight handles (8 bytes) that reference a row in the
//! world's archetype storage. The generation counter prevents use-after-free
//! bugs: a destroyed and recycled slot hands out a new generation, so stale
//! handles fail validation instead of aliasing a different entity.

/// Entity handle (generation-indexed for safety)
///
/// Format: [32-bit index | 32-bit generation]
/// - Index: Position in the world's entity record array
/// - Generation: Incremented on entity destruction
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack into a 64-bit integer (stable across a world's lifetime).
    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Unpack from a 64-bit integer produced by [`Entity::to_bits`].
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}
