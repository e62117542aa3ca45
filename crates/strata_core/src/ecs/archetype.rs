// archetype.rs - Archetype identity and chunk ownership
//
// An archetype is one distinct component signature. Entities whose component
// sets are equal share an archetype and are stored together in its chunks.

use crate::ecs::chunk::Chunk;
use crate::ecs::component::ComponentRegistry;
use crate::ecs::{ComponentTypeId, Entity, Signature};

/// Dense, world-scoped archetype index.
pub type ArchetypeId = u32;

/// A distinct component signature and the ordered chunks storing its rows.
/// Immutable in identity once created; chunks are appended on demand.
pub struct Archetype {
    id: ArchetypeId,
    signature: Signature,
    kinds: Vec<ComponentTypeId>,
    pub(crate) chunks: Vec<Chunk>,
    chunk_capacity: usize,
}

impl Archetype {
    pub(crate) fn new(
        id: ArchetypeId,
        kinds: Vec<ComponentTypeId>,
        chunk_capacity: usize,
    ) -> Self {
        debug_assert!(kinds.windows(2).all(|pair| pair[0] < pair[1]));
        Self {
            id,
            signature: Signature::from_ids(&kinds),
            kinds,
            chunks: Vec::new(),
            chunk_capacity,
        }
    }

    #[inline]
    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Component kinds stored here, sorted ascending.
    #[inline]
    pub fn kinds(&self) -> &[ComponentTypeId] {
        &self.kinds
    }

    /// Column position of `kind` within each chunk.
    #[inline]
    pub fn column_index(&self, kind: ComponentTypeId) -> Option<usize> {
        self.kinds.binary_search(&kind).ok()
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Total live rows across all chunks.
    pub fn entity_count(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.len()).sum()
    }

    /// Remove one row, returning the entity swapped into its place (if any).
    pub(crate) fn swap_remove_row(
        &mut self,
        registry: &ComponentRegistry,
        chunk: usize,
        row: usize,
    ) -> Option<Entity> {
        self.chunks[chunk].swap_remove_row(registry, &self.kinds, row)
    }

    /// Split borrow of the sorted kind list and the chunk storage.
    pub(crate) fn parts_mut(&mut self) -> (&[ComponentTypeId], &mut [Chunk]) {
        (&self.kinds, &mut self.chunks)
    }

    /// Scan-first-fit chunk selection: the first chunk with a free row, or a
    /// freshly appended one.
    pub(crate) fn chunk_with_space(&mut self, registry: &ComponentRegistry) -> usize {
        if let Some(index) = self.chunks.iter().position(|chunk| !chunk.is_full()) {
            return index;
        }
        self.chunks
            .push(Chunk::new(registry, &self.kinds, self.chunk_capacity));
        self.chunks.len() - 1
    }
}
