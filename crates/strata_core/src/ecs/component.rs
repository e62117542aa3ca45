// component.rs - World-scoped component registration
//
// Component kinds are identified by dense u32 ids assigned on first
// registration. The registry also records a small vtable of monomorphized
// column operations per kind, so archetype moves and command playback can
// manipulate columns without knowing the concrete Rust type.

use crate::ecs::error::WorldError;
use crate::ecs::signature::MAX_COMPONENT_KINDS;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

/// Dense, world-scoped component kind identifier. Used as a bit position in
/// signatures; never meaningful across worlds.
pub type ComponentTypeId = u32;

/// Marker bound for component payloads.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Type-erased component column: a `Vec<T>` behind `dyn Any`.
pub(crate) type BoxedColumn = Box<dyn Any + Send + Sync>;

/// Monomorphized column operations recorded at registration time.
///
/// Downcast failures inside these functions are internal invariant
/// violations (a column paired with the wrong meta), not caller errors.
pub(crate) struct ColumnOps {
    pub new_column: fn(capacity: usize) -> BoxedColumn,
    pub push_boxed: fn(&mut BoxedColumn, Box<dyn Any + Send + Sync>),
    pub transfer: fn(src: &mut BoxedColumn, row: usize, dst: &mut BoxedColumn),
    pub swap_remove: fn(&mut BoxedColumn, row: usize),
    pub len: fn(&BoxedColumn) -> usize,
}

fn column_mut<T: Component>(column: &mut BoxedColumn) -> &mut Vec<T> {
    column
        .downcast_mut::<Vec<T>>()
        .expect("column type does not match component meta")
}

fn new_column<T: Component>(capacity: usize) -> BoxedColumn {
    Box::new(Vec::<T>::with_capacity(capacity))
}

fn push_boxed<T: Component>(column: &mut BoxedColumn, value: Box<dyn Any + Send + Sync>) {
    let value = value
        .downcast::<T>()
        .expect("component value does not match component meta");
    column_mut::<T>(column).push(*value);
}

/// Swap-remove the row from `src` and append it to `dst`.
fn transfer<T: Component>(src: &mut BoxedColumn, row: usize, dst: &mut BoxedColumn) {
    let value = column_mut::<T>(src).swap_remove(row);
    column_mut::<T>(dst).push(value);
}

fn swap_remove<T: Component>(column: &mut BoxedColumn, row: usize) {
    column_mut::<T>(column).swap_remove(row);
}

fn len<T: Component>(column: &BoxedColumn) -> usize {
    column
        .downcast_ref::<Vec<T>>()
        .expect("column type does not match component meta")
        .len()
}

/// Metadata describing one registered component kind.
pub struct ComponentMeta {
    id: ComponentTypeId,
    name: &'static str,
    type_id: TypeId,
    pub(crate) ops: ColumnOps,
}

impl ComponentMeta {
    fn of<T: Component>(id: ComponentTypeId) -> Self {
        Self {
            id,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            ops: ColumnOps {
                new_column: new_column::<T>,
                push_boxed: push_boxed::<T>,
                transfer: transfer::<T>,
                swap_remove: swap_remove::<T>,
                len: len::<T>,
            },
        }
    }

    #[inline]
    pub fn id(&self) -> ComponentTypeId {
        self.id
    }

    /// Human-readable type name for diagnostics.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

/// World-scoped registry assigning dense ids to component kinds.
///
/// Ids start at 0 and are stable for the lifetime of the owning world.
/// There is no removal.
pub struct ComponentRegistry {
    metas: Vec<ComponentMeta>,
    by_type: HashMap<TypeId, ComponentTypeId>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            metas: Vec::new(),
            by_type: HashMap::new(),
        }
    }

    /// Register `T`, assigning the next dense id. Idempotent per kind.
    pub fn register<T: Component>(&mut self) -> Result<ComponentTypeId, WorldError> {
        if let Some(&id) = self.by_type.get(&TypeId::of::<T>()) {
            return Ok(id);
        }
        if self.metas.len() >= MAX_COMPONENT_KINDS {
            return Err(WorldError::RegistryFull {
                limit: MAX_COMPONENT_KINDS,
            });
        }
        let id = self.metas.len() as ComponentTypeId;
        self.metas.push(ComponentMeta::of::<T>(id));
        self.by_type.insert(TypeId::of::<T>(), id);
        Ok(id)
    }

    /// Look up the id previously assigned to `T`.
    pub fn lookup<T: Component>(&self) -> Result<ComponentTypeId, WorldError> {
        self.by_type
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(WorldError::ComponentNotRegistered {
                name: type_name::<T>(),
            })
    }

    /// Non-failing variant of [`ComponentRegistry::lookup`] for view code.
    pub fn lookup_opt<T: Component>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    pub(crate) fn lookup_type_id(&self, type_id: TypeId, name: &'static str) -> Result<ComponentTypeId, WorldError> {
        self.by_type
            .get(&type_id)
            .copied()
            .ok_or(WorldError::ComponentNotRegistered { name })
    }

    pub fn meta(&self, id: ComponentTypeId) -> &ComponentMeta {
        &self.metas[id as usize]
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
