// chunk.rs - Fixed-capacity columnar row blocks
//
// A chunk holds one column per component kind of the owning archetype plus
// an entity-identity column, all in row lockstep. Rows leave via
// swap-with-last so chunks stay dense without compaction passes.

use crate::ecs::component::{BoxedColumn, Component, ComponentRegistry};
use crate::ecs::{ComponentTypeId, Entity};

/// One fixed-capacity block of rows within an archetype.
pub struct Chunk {
    capacity: usize,
    entities: Vec<Entity>,
    pub(crate) columns: Vec<BoxedColumn>,
}

impl Chunk {
    pub(crate) fn new(
        registry: &ComponentRegistry,
        kinds: &[ComponentTypeId],
        capacity: usize,
    ) -> Self {
        let columns = kinds
            .iter()
            .map(|&kind| (registry.meta(kind).ops.new_column)(capacity))
            .collect();
        Self {
            capacity,
            entities: Vec::with_capacity(capacity),
            columns,
        }
    }

    /// Live row count.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entities.len() >= self.capacity
    }

    /// Entity identity column.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Reserve the next row for `entity`. Component columns must be filled
    /// by the caller in the same order so all columns stay in lockstep.
    pub(crate) fn push_entity(&mut self, entity: Entity) -> usize {
        debug_assert!(!self.is_full(), "row pushed into a full chunk");
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Remove `row` from every column via swap-with-last. Returns the entity
    /// that was relocated into `row`, if any, so the directory can patch its
    /// record.
    pub(crate) fn swap_remove_row(
        &mut self,
        registry: &ComponentRegistry,
        kinds: &[ComponentTypeId],
        row: usize,
    ) -> Option<Entity> {
        debug_assert_eq!(kinds.len(), self.columns.len());
        for (&kind, column) in kinds.iter().zip(self.columns.iter_mut()) {
            (registry.meta(kind).ops.swap_remove)(column, row);
        }
        self.entities.swap_remove(row);
        self.entities.get(row).copied()
    }

    /// Move `row` into `dst`, transferring every column the destination
    /// shares and dropping the rest. Kinds missing from `src_kinds` (an added
    /// component) must be pushed by the caller before the chunk is observed
    /// again. Returns the destination row and the entity relocated into
    /// `row`, if any.
    pub(crate) fn move_row_to(
        &mut self,
        registry: &ComponentRegistry,
        src_kinds: &[ComponentTypeId],
        row: usize,
        dst: &mut Chunk,
        dst_kinds: &[ComponentTypeId],
    ) -> (usize, Option<Entity>) {
        let entity = self.entities[row];
        let dst_row = dst.push_entity(entity);

        let mut dst_index = 0;
        for (src_index, &kind) in src_kinds.iter().enumerate() {
            while dst_index < dst_kinds.len() && dst_kinds[dst_index] < kind {
                dst_index += 1;
            }
            let ops = &registry.meta(kind).ops;
            if dst_index < dst_kinds.len() && dst_kinds[dst_index] == kind {
                (ops.transfer)(
                    &mut self.columns[src_index],
                    row,
                    &mut dst.columns[dst_index],
                );
                dst_index += 1;
            } else {
                (ops.swap_remove)(&mut self.columns[src_index], row);
            }
        }

        self.entities.swap_remove(row);
        (dst_row, self.entities.get(row).copied())
    }

    pub(crate) fn view<'a>(
        &'a self,
        registry: &'a ComponentRegistry,
        kinds: &'a [ComponentTypeId],
    ) -> ChunkView<'a> {
        ChunkView {
            registry,
            kinds,
            entities: &self.entities,
            columns: &self.columns,
        }
    }

    pub(crate) fn view_mut<'a>(
        &'a mut self,
        registry: &'a ComponentRegistry,
        kinds: &'a [ComponentTypeId],
    ) -> ChunkViewMut<'a> {
        ChunkViewMut {
            registry,
            kinds,
            entities: &self.entities,
            columns: &mut self.columns,
        }
    }
}

fn column_slice<'a, T: Component>(
    registry: &ComponentRegistry,
    kinds: &[ComponentTypeId],
    columns: &'a [BoxedColumn],
) -> Option<&'a [T]> {
    let id = registry.lookup_opt::<T>()?;
    let index = kinds.binary_search(&id).ok()?;
    columns[index]
        .downcast_ref::<Vec<T>>()
        .map(|column| column.as_slice())
}

/// Read-only view over one chunk, handed to per-chunk processors.
pub struct ChunkView<'a> {
    pub(crate) registry: &'a ComponentRegistry,
    pub(crate) kinds: &'a [ComponentTypeId],
    pub(crate) entities: &'a [Entity],
    pub(crate) columns: &'a [BoxedColumn],
}

impl<'a> ChunkView<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn entities(&self) -> &'a [Entity] {
        self.entities
    }

    /// Typed column slice, or `None` when the archetype lacks `T`.
    pub fn column<T: Component>(&self) -> Option<&'a [T]> {
        column_slice::<T>(self.registry, self.kinds, self.columns)
    }
}

/// Mutable view over one chunk for single-threaded processors. Value writes
/// only; structural changes go through the command buffer.
pub struct ChunkViewMut<'a> {
    pub(crate) registry: &'a ComponentRegistry,
    pub(crate) kinds: &'a [ComponentTypeId],
    pub(crate) entities: &'a [Entity],
    pub(crate) columns: &'a mut [BoxedColumn],
}

impl<'a> ChunkViewMut<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        self.entities
    }

    pub fn column<T: Component>(&self) -> Option<&[T]> {
        column_slice::<T>(self.registry, self.kinds, self.columns)
    }

    pub fn column_mut<T: Component>(&mut self) -> Option<&mut [T]> {
        let id = self.registry.lookup_opt::<T>()?;
        let index = self.kinds.binary_search(&id).ok()?;
        self.columns[index]
            .downcast_mut::<Vec<T>>()
            .map(|column| column.as_mut_slice())
    }

    /// Borrow one writable column and one read-only column at once, for the
    /// common integrate-style hot loop. Returns `None` when either kind is
    /// absent or `W` and `R` are the same kind.
    pub fn columns_rw<W: Component, R: Component>(&mut self) -> Option<(&mut [W], &[R])> {
        let write_id = self.registry.lookup_opt::<W>()?;
        let read_id = self.registry.lookup_opt::<R>()?;
        let write_index = self.kinds.binary_search(&write_id).ok()?;
        let read_index = self.kinds.binary_search(&read_id).ok()?;
        if write_index == read_index {
            return None;
        }

        let (write_column, read_column) = if write_index < read_index {
            let (left, right) = self.columns.split_at_mut(read_index);
            (&mut left[write_index], &right[0])
        } else {
            let (left, right) = self.columns.split_at_mut(write_index);
            (&mut right[0], &left[read_index])
        };

        let write = write_column.downcast_mut::<Vec<W>>()?.as_mut_slice();
        let read = read_column.downcast_ref::<Vec<R>>()?.as_slice();
        Some((write, read))
    }
}
