// world.rs - Entity directory and archetype storage
//
// The world owns the component registry, every archetype, and one record per
// entity slot mapping its id to a (archetype, chunk, row) location. Every
// structural mutation (create, destroy, add, remove) bumps a version counter
// exactly once; query caches key off that counter.
//
// While a tick is running (`begin_tick`..`end_tick`) direct structural calls
// are refused and mutation goes through the command buffer instead, replayed
// at one synchronization point in deterministic key order.

use crate::ecs::archetype::{Archetype, ArchetypeId};
use crate::ecs::chunk::{ChunkView, ChunkViewMut};
use crate::ecs::command::{
    ensure_sort_key, CommandBuffer, CommandEntity, CommandKind,
};
use crate::ecs::component::{Component, ComponentRegistry, ComponentTypeId};
use crate::ecs::config::{ChunkAllocationPolicy, RemovalPolicy, WorldConfig};
use crate::ecs::error::{CommandError, WorldError};
use crate::ecs::query::Query;
use crate::ecs::{Entity, Signature};
use crate::pool::ArrayPool;
use rayon::prelude::*;
use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use strata_metrics::Counter;

/// The archetype every entity starts in: no components.
pub const EMPTY_ARCHETYPE: ArchetypeId = 0;

/// Where an entity's row currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLoc {
    pub archetype: ArchetypeId,
    pub chunk: usize,
    pub row: usize,
}

struct EntityRecord {
    generation: u32,
    loc: Option<EntityLoc>,
}

/// Borrow two distinct archetypes mutably at once.
fn pair_mut(archetypes: &mut [Archetype], a: usize, b: usize) -> (&mut Archetype, &mut Archetype) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = archetypes.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = archetypes.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

pub struct World {
    config: WorldConfig,
    registry: ComponentRegistry,
    archetypes: Vec<Archetype>,
    by_signature: HashMap<Signature, ArchetypeId>,
    records: Vec<EntityRecord>,
    free_slots: Vec<u32>,
    version: u64,
    tick: u64,
    is_updating: bool,
    deferred: CommandBuffer,
    archetype_pool: Arc<ArrayPool<ArchetypeId>>,
    // Reused (archetype, chunk) batch list for the parallel pass.
    batch_scratch: Vec<(ArchetypeId, u32)>,
    stats: Counter,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        let config = config.sanitized();
        let mut world = Self {
            registry: ComponentRegistry::new(),
            archetypes: Vec::new(),
            by_signature: HashMap::new(),
            records: Vec::with_capacity(config.initial_entity_capacity),
            free_slots: Vec::new(),
            version: 0,
            tick: 0,
            is_updating: false,
            deferred: CommandBuffer::new(),
            archetype_pool: Arc::new(ArrayPool::new()),
            batch_scratch: Vec::new(),
            stats: Counter::new(),
            config,
        };
        let empty = Archetype::new(EMPTY_ARCHETYPE, Vec::new(), world.config.chunk_capacity);
        world.by_signature.insert(*empty.signature(), empty.id());
        world.archetypes.push(empty);
        world
    }

    #[inline]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Structural version: advances by one for every create, destroy, add or
    /// remove that commits. Reads and value writes leave it untouched.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Tick number passed to the most recent [`World::begin_tick`].
    #[inline]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn is_updating(&self) -> bool {
        self.is_updating
    }

    #[inline]
    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    pub fn archetype(&self, id: ArchetypeId) -> &Archetype {
        &self.archetypes[id as usize]
    }

    /// Shared buffer pool for query caches.
    pub fn archetype_pool(&self) -> Arc<ArrayPool<ArchetypeId>> {
        Arc::clone(&self.archetype_pool)
    }

    /// Structural-event counters: `entities_spawned`, `entities_despawned`,
    /// `components_added`, `components_removed`, `commands_replayed`,
    /// `commands_dropped`. All zero in a build without `metrics`.
    pub fn stats(&self) -> &Counter {
        &self.stats
    }

    pub fn entity_count(&self) -> usize {
        self.records.len() - self.free_slots.len()
    }

    pub fn register_component<T: Component>(&mut self) -> Result<ComponentTypeId, WorldError> {
        self.registry.register::<T>()
    }

    pub fn component_id<T: Component>(&self) -> Result<ComponentTypeId, WorldError> {
        self.registry.lookup::<T>()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.locate(entity).is_ok()
    }

    fn locate(&self, entity: Entity) -> Result<EntityLoc, WorldError> {
        let record = self
            .records
            .get(entity.index() as usize)
            .ok_or(WorldError::UnknownEntity { entity })?;
        if record.generation != entity.generation() {
            return Err(WorldError::UnknownEntity { entity });
        }
        record.loc.ok_or(WorldError::UnknownEntity { entity })
    }

    fn guard_structural(&self) -> Result<(), WorldError> {
        if self.is_updating {
            Err(WorldError::TickInProgress)
        } else {
            Ok(())
        }
    }

    /// Create an entity in the empty archetype. Refused mid-tick; use
    /// [`World::commands`] there instead.
    pub fn create_entity(&mut self) -> Result<Entity, WorldError> {
        self.guard_structural()?;
        Ok(self.create_entity_internal())
    }

    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), WorldError> {
        self.guard_structural()?;
        self.destroy_entity_internal(entity)
    }

    /// Add a component, moving the entity to the widened archetype. Errors if
    /// the entity already has `T`; prior state is left unchanged on failure.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<(), WorldError> {
        self.guard_structural()?;
        let kind = self.registry.lookup::<T>()?;
        self.add_erased(entity, kind, type_name::<T>(), Box::new(value))
    }

    /// Remove a component, moving the entity to the narrowed archetype.
    /// Errors if the entity does not have `T`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<(), WorldError> {
        self.guard_structural()?;
        let kind = self.registry.lookup::<T>()?;
        self.remove_erased(entity, kind, type_name::<T>())
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> Result<bool, WorldError> {
        let kind = self.registry.lookup::<T>()?;
        let loc = self.locate(entity)?;
        Ok(self.archetypes[loc.archetype as usize].signature().contains(kind))
    }

    /// Read one component of one entity. Point lookups walk the record
    /// indirection; bulk access belongs in chunk iteration.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, WorldError> {
        let kind = self.registry.lookup::<T>()?;
        let loc = self.locate(entity)?;
        let archetype = &self.archetypes[loc.archetype as usize];
        let column = archetype
            .column_index(kind)
            .ok_or(WorldError::ComponentMissing {
                entity,
                name: type_name::<T>(),
            })?;
        let values = archetype.chunks()[loc.chunk].columns[column]
            .downcast_ref::<Vec<T>>()
            .expect("column type does not match component meta");
        Ok(&values[loc.row])
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, WorldError> {
        let kind = self.registry.lookup::<T>()?;
        let loc = self.locate(entity)?;
        let archetype = &mut self.archetypes[loc.archetype as usize];
        let column = archetype
            .column_index(kind)
            .ok_or(WorldError::ComponentMissing {
                entity,
                name: type_name::<T>(),
            })?;
        let values = archetype.chunks[loc.chunk].columns[column]
            .downcast_mut::<Vec<T>>()
            .expect("column type does not match component meta");
        Ok(&mut values[loc.row])
    }

    fn create_entity_internal(&mut self) -> Entity {
        let index = match self.free_slots.pop() {
            Some(index) => index,
            None => {
                self.records.push(EntityRecord {
                    generation: 0,
                    loc: None,
                });
                (self.records.len() - 1) as u32
            }
        };
        let generation = self.records[index as usize].generation;
        let entity = Entity::new(index, generation);

        let chunk = self.chunk_for_insert(EMPTY_ARCHETYPE);
        let row = self.archetypes[EMPTY_ARCHETYPE as usize].chunks[chunk].push_entity(entity);
        self.records[index as usize].loc = Some(EntityLoc {
            archetype: EMPTY_ARCHETYPE,
            chunk,
            row,
        });
        self.version += 1;
        self.stats.increment("entities_spawned", 1);
        entity
    }

    fn destroy_entity_internal(&mut self, entity: Entity) -> Result<(), WorldError> {
        let loc = self.locate(entity)?;
        match self.config.removal {
            RemovalPolicy::SwapBack => {
                let moved = self.archetypes[loc.archetype as usize].swap_remove_row(
                    &self.registry,
                    loc.chunk,
                    loc.row,
                );
                if let Some(moved_entity) = moved {
                    self.records[moved_entity.index() as usize].loc = Some(loc);
                }
            }
        }
        let record = &mut self.records[entity.index() as usize];
        record.loc = None;
        record.generation = record.generation.wrapping_add(1);
        self.free_slots.push(entity.index());
        self.version += 1;
        self.stats.increment("entities_despawned", 1);
        Ok(())
    }

    fn add_erased(
        &mut self,
        entity: Entity,
        kind: ComponentTypeId,
        name: &'static str,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<(), WorldError> {
        let loc = self.locate(entity)?;
        let source = &self.archetypes[loc.archetype as usize];
        if source.signature().contains(kind) {
            return Err(WorldError::ComponentAlreadyPresent { entity, name });
        }
        let mut kinds = source.kinds().to_vec();
        let insert_at = match kinds.binary_search(&kind) {
            Ok(position) | Err(position) => position,
        };
        kinds.insert(insert_at, kind);

        let destination = self.archetype_for(kinds);
        self.relocate(entity, loc, destination, Some((kind, value)));
        self.version += 1;
        self.stats.increment("components_added", 1);
        Ok(())
    }

    fn remove_erased(
        &mut self,
        entity: Entity,
        kind: ComponentTypeId,
        name: &'static str,
    ) -> Result<(), WorldError> {
        let loc = self.locate(entity)?;
        let source = &self.archetypes[loc.archetype as usize];
        if !source.signature().contains(kind) {
            return Err(WorldError::ComponentMissing { entity, name });
        }
        let kinds: Vec<ComponentTypeId> = source
            .kinds()
            .iter()
            .copied()
            .filter(|&existing| existing != kind)
            .collect();

        let destination = self.archetype_for(kinds);
        self.relocate(entity, loc, destination, None);
        self.version += 1;
        self.stats.increment("components_removed", 1);
        Ok(())
    }

    /// Archetype for exactly `kinds` (sorted), created on first request.
    fn archetype_for(&mut self, kinds: Vec<ComponentTypeId>) -> ArchetypeId {
        let signature = Signature::from_ids(&kinds);
        if let Some(&id) = self.by_signature.get(&signature) {
            return id;
        }
        let id = self.archetypes.len() as ArchetypeId;
        tracing::debug!(archetype = id, kinds = kinds.len(), "new archetype");
        self.archetypes
            .push(Archetype::new(id, kinds, self.config.chunk_capacity));
        self.by_signature.insert(signature, id);
        id
    }

    fn chunk_for_insert(&mut self, archetype: ArchetypeId) -> usize {
        match self.config.chunk_allocation {
            ChunkAllocationPolicy::ScanFirstFit => {
                self.archetypes[archetype as usize].chunk_with_space(&self.registry)
            }
        }
    }

    /// Move one row between archetypes, pushing the added component's value
    /// (if any) into the destination column, and patch the location records
    /// of both the moved entity and whichever row back-filled its old slot.
    fn relocate(
        &mut self,
        entity: Entity,
        src_loc: EntityLoc,
        destination: ArchetypeId,
        added: Option<(ComponentTypeId, Box<dyn Any + Send + Sync>)>,
    ) {
        let dst_chunk = self.chunk_for_insert(destination);
        let registry = &self.registry;
        let (src_arch, dst_arch) = pair_mut(
            &mut self.archetypes,
            src_loc.archetype as usize,
            destination as usize,
        );
        let (src_kinds, src_chunks) = src_arch.parts_mut();
        let (dst_kinds, dst_chunks) = dst_arch.parts_mut();

        let (dst_row, moved) = src_chunks[src_loc.chunk].move_row_to(
            registry,
            src_kinds,
            src_loc.row,
            &mut dst_chunks[dst_chunk],
            dst_kinds,
        );
        if let Some((kind, value)) = added {
            let column = dst_kinds
                .binary_search(&kind)
                .expect("added kind missing from destination archetype");
            (registry.meta(kind).ops.push_boxed)(
                &mut dst_chunks[dst_chunk].columns[column],
                value,
            );
        }

        self.records[entity.index() as usize].loc = Some(EntityLoc {
            archetype: destination,
            chunk: dst_chunk,
            row: dst_row,
        });
        if let Some(moved_entity) = moved {
            self.records[moved_entity.index() as usize].loc = Some(src_loc);
        }
    }

    /// Enter tick `tick`: direct structural mutation is refused until
    /// [`World::end_tick`], and commands accumulate in the deferred buffer.
    pub fn begin_tick(&mut self, tick: u64) -> Result<(), WorldError> {
        if self.is_updating {
            return Err(WorldError::TickInProgress);
        }
        self.is_updating = true;
        self.tick = tick;
        Ok(())
    }

    pub fn end_tick(&mut self) -> Result<(), WorldError> {
        if !self.is_updating {
            return Err(WorldError::NoTickInProgress);
        }
        self.is_updating = false;
        Ok(())
    }

    /// Drop every recorded-but-unapplied command. Called by the scheduler
    /// when a tick fails, so a half-recorded tick never leaks commands into
    /// the next playback.
    pub fn discard_deferred(&mut self) {
        if !self.deferred.is_empty() {
            tracing::debug!(commands = self.deferred.len(), "deferred commands discarded");
        }
        self.deferred.clear();
    }

    /// Replay the world's own deferred buffer (the per-tick sync point).
    pub fn apply_deferred(&mut self) -> Result<(), WorldError> {
        let mut buffer = std::mem::take(&mut self.deferred);
        let result = self.apply(&mut buffer);
        buffer.clear();
        self.deferred = buffer;
        result
    }

    /// Replay a command buffer against this world.
    ///
    /// With `deterministic` set the buffer is first sorted into ascending
    /// (key, kind rank, sequence) order. Commands targeting an entity already
    /// destroyed earlier in the same playback are dropped with a debug log.
    /// Playback stops at the first failing command; commands after it are
    /// discarded.
    pub fn apply(&mut self, buffer: &mut CommandBuffer) -> Result<(), WorldError> {
        if buffer.is_empty() {
            return Ok(());
        }
        if self.config.deterministic {
            buffer.sort_for_playback();
        }
        tracing::trace!(commands = buffer.len(), tick = self.tick, "command playback");

        let mut pending: Vec<Option<Entity>> = vec![None; buffer.pending_count() as usize];
        let mut destroyed: HashSet<Entity> = HashSet::new();

        for command in buffer.drain() {
            if matches!(command.kind, CommandKind::Create) {
                let created = self.create_entity_internal();
                if let CommandEntity::Pending(handle) = command.target {
                    pending[handle.index() as usize] = Some(created);
                }
                self.stats.increment("commands_replayed", 1);
                continue;
            }

            let entity = match command.target {
                CommandEntity::Live(entity) => entity,
                CommandEntity::Pending(handle) => pending
                    .get(handle.index() as usize)
                    .copied()
                    .flatten()
                    .ok_or(CommandError::UnresolvedPending {
                        index: handle.index(),
                    })?,
            };
            if destroyed.contains(&entity) {
                tracing::debug!(
                    index = entity.index(),
                    "command dropped; entity destroyed earlier in playback"
                );
                self.stats.increment("commands_dropped", 1);
                continue;
            }

            match command.kind {
                CommandKind::Create => {}
                CommandKind::Destroy => {
                    self.destroy_entity_internal(entity)?;
                    destroyed.insert(entity);
                }
                CommandKind::Add {
                    type_id,
                    type_name,
                    value,
                } => {
                    let kind = self.registry.lookup_type_id(type_id, type_name)?;
                    self.add_erased(entity, kind, type_name, value)?;
                }
                CommandKind::Remove { type_id, type_name } => {
                    let kind = self.registry.lookup_type_id(type_id, type_name)?;
                    self.remove_erased(entity, kind, type_name)?;
                }
            }
            self.stats.increment("commands_replayed", 1);
        }
        Ok(())
    }

    /// Structural mutation facade that routes by tick state: immediate
    /// outside a tick, recorded into the deferred buffer inside one.
    pub fn commands(&mut self) -> EntityCommands<'_> {
        EntityCommands { world: self }
    }

    /// Run `f` over every non-empty chunk matched by `query`, with mutable
    /// column access. Single-threaded; structural changes still go through
    /// [`World::commands`].
    pub fn for_each_chunk<F>(&mut self, query: &mut Query, mut f: F)
    where
        F: FnMut(&mut ChunkViewMut<'_>),
    {
        let matched = query.matching(self);
        for &archetype_id in matched {
            let registry = &self.registry;
            let archetype = &mut self.archetypes[archetype_id as usize];
            let (kinds, chunks) = archetype.parts_mut();
            for chunk in chunks.iter_mut() {
                if chunk.is_empty() {
                    continue;
                }
                let mut view = chunk.view_mut(registry, kinds);
                f(&mut view);
            }
        }
    }

    /// Run `f` per entity row, read-only.
    pub fn for_each_entity<F>(&self, query: &mut Query, mut f: F)
    where
        F: FnMut(Entity, &ChunkView<'_>, usize),
    {
        for &archetype_id in query.matching(self) {
            let archetype = &self.archetypes[archetype_id as usize];
            for chunk in archetype.chunks() {
                if chunk.is_empty() {
                    continue;
                }
                let view = chunk.view(&self.registry, archetype.kinds());
                for row in 0..view.len() {
                    f(view.entities()[row], &view, row);
                }
            }
        }
    }

    /// Fan matched chunks out across the rayon pool, read-only, one command
    /// buffer per batch. Batches are enumerated in (archetype, chunk) order
    /// and their buffers merged back in that same order, so the combined
    /// playback is identical whatever the worker count. Outside a tick the
    /// merged buffer is applied immediately; inside one it joins the
    /// deferred buffer.
    pub fn par_for_each_chunk<F>(&mut self, query: &mut Query, f: F) -> Result<(), WorldError>
    where
        F: Fn(&ChunkView<'_>, usize, &mut CommandBuffer) + Send + Sync,
    {
        let mut batches = std::mem::take(&mut self.batch_scratch);
        batches.clear();
        for &archetype_id in query.matching(self) {
            let archetype = &self.archetypes[archetype_id as usize];
            for (chunk_index, chunk) in archetype.chunks().iter().enumerate() {
                if !chunk.is_empty() {
                    batches.push((archetype_id, chunk_index as u32));
                }
            }
        }

        let world: &World = &*self;
        let buffers: Vec<CommandBuffer> = batches
            .par_iter()
            .enumerate()
            .map(|(batch_index, &(archetype_id, chunk_index))| {
                let archetype = &world.archetypes[archetype_id as usize];
                let view = archetype.chunks()[chunk_index as usize]
                    .view(&world.registry, archetype.kinds());
                let mut commands = CommandBuffer::new();
                f(&view, batch_index, &mut commands);
                commands
            })
            .collect();
        self.batch_scratch = batches;

        let mut merged = CommandBuffer::new();
        for buffer in buffers {
            merged.absorb(buffer);
        }
        if self.is_updating {
            self.deferred.absorb(merged);
            Ok(())
        } else {
            self.apply(&mut merged)
        }
    }
}

fn live_target(target: CommandEntity) -> Result<Entity, WorldError> {
    match target {
        CommandEntity::Live(entity) => Ok(entity),
        CommandEntity::Pending(handle) => Err(CommandError::UnresolvedPending {
            index: handle.index(),
        }
        .into()),
    }
}

/// Routes structural requests by tick state so call sites read identically
/// whether they run immediately or get buffered. Sort keys are validated on
/// both paths.
pub struct EntityCommands<'w> {
    world: &'w mut World,
}

impl EntityCommands<'_> {
    pub fn create_entity(&mut self, key: u64) -> Result<CommandEntity, WorldError> {
        if self.world.is_updating {
            Ok(self.world.deferred.create_entity(key)?.into())
        } else {
            ensure_sort_key(key)?;
            Ok(self.world.create_entity_internal().into())
        }
    }

    pub fn destroy_entity(
        &mut self,
        target: impl Into<CommandEntity>,
        key: u64,
    ) -> Result<(), WorldError> {
        let target = target.into();
        if self.world.is_updating {
            self.world.deferred.destroy_entity(target, key)?;
            Ok(())
        } else {
            ensure_sort_key(key)?;
            self.world.destroy_entity_internal(live_target(target)?)
        }
    }

    pub fn add<T: Component>(
        &mut self,
        target: impl Into<CommandEntity>,
        value: T,
        key: u64,
    ) -> Result<(), WorldError> {
        let target = target.into();
        if self.world.is_updating {
            self.world.deferred.add(target, value, key)?;
            Ok(())
        } else {
            ensure_sort_key(key)?;
            let entity = live_target(target)?;
            let kind = self.world.registry.lookup::<T>()?;
            self.world
                .add_erased(entity, kind, type_name::<T>(), Box::new(value))
        }
    }

    pub fn remove<T: Component>(
        &mut self,
        target: impl Into<CommandEntity>,
        key: u64,
    ) -> Result<(), WorldError> {
        let target = target.into();
        if self.world.is_updating {
            self.world.deferred.remove::<T>(target, key)?;
            Ok(())
        } else {
            ensure_sort_key(key)?;
            let entity = live_target(target)?;
            let kind = self.world.registry.lookup::<T>()?;
            self.world.remove_erased(entity, kind, type_name::<T>())
        }
    }
}
