//! Archetype-based entity/component storage
//!
//! Entities with identical component sets share an archetype; each archetype
//! stores its rows in fixed-capacity columnar chunks. Structural mutation
//! either happens directly between ticks or is buffered as sorted commands
//! and replayed at one synchronization point per tick, which keeps results
//! reproducible across runs and worker counts.

pub mod archetype;
pub mod chunk;
pub mod command;
pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod query;
pub mod scheduler;
pub mod signature;
pub mod world;

pub use archetype::{Archetype, ArchetypeId};
pub use chunk::{Chunk, ChunkView, ChunkViewMut};
pub use command::{sort_key, CommandBuffer, CommandEntity, PendingEntity};
pub use component::{Component, ComponentMeta, ComponentRegistry, ComponentTypeId};
pub use config::{ChunkAllocationPolicy, RemovalPolicy, WorldConfig};
pub use entity::Entity;
pub use error::{CommandError, QueryError, WorldError};
pub use query::Query;
pub use scheduler::{Phase, Scheduler, System};
pub use signature::{Signature, MAX_COMPONENT_KINDS};
pub use world::{EntityCommands, EntityLoc, World, EMPTY_ARCHETYPE};
