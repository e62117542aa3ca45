use crate::ecs::{ComponentTypeId, Entity};
use thiserror::Error;

/// Errors surfaced by entity directory operations.
///
/// All of these are local, caller-recoverable failures; a failed operation
/// leaves the directory's prior state unchanged.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("entity {index}v{generation} is unknown or no longer alive", index = .entity.index(), generation = .entity.generation())]
    UnknownEntity { entity: Entity },

    #[error("component '{name}' is not registered with this world")]
    ComponentNotRegistered { name: &'static str },

    #[error("component registry is full ({limit} kinds)")]
    RegistryFull { limit: usize },

    #[error("entity {index} already has component '{name}'", index = .entity.index())]
    ComponentAlreadyPresent { entity: Entity, name: &'static str },

    #[error("entity {index} does not have component '{name}'", index = .entity.index())]
    ComponentMissing { entity: Entity, name: &'static str },

    #[error("structural mutation attempted while a tick is in progress")]
    TickInProgress,

    #[error("no tick is in progress")]
    NoTickInProgress,

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors raised during query construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query requires at least one component kind")]
    EmptyRequired,

    #[error("component id {id} appears in both the required and excluded sets")]
    RequiredExcludedOverlap { id: ComponentTypeId },
}

/// Errors raised while recording or replaying buffered commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("sort key 0 is reserved; derive keys with command::sort_key")]
    ZeroSortKey,

    #[error("pending entity {index} was never created in this buffer")]
    UnresolvedPending { index: u32 },
}
