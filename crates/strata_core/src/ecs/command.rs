// command.rs - Deferred, deterministically ordered structural mutation
//
// Systems never mutate archetypes while a tick is running; they record
// commands carrying an explicit sort key instead. The buffer is replayed at
// one synchronization point per tick, in ascending (key, kind, sequence)
// order, so the resulting storage layout is independent of emission timing
// and worker scheduling.

use crate::ecs::component::Component;
use crate::ecs::error::CommandError;
use crate::ecs::Entity;
use std::any::{type_name, Any, TypeId};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Derive a stable, non-zero command sort key from an owner identity and a
/// local index (FNV-1a). Two systems emitting for the same logical entity get
/// the same key regardless of thread scheduling.
pub fn sort_key(owner: u64, index: u64) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in owner.to_le_bytes().into_iter().chain(index.to_le_bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    if hash == 0 {
        FNV_OFFSET_BASIS
    } else {
        hash
    }
}

/// Reject the reserved sort key 0.
pub(crate) fn ensure_sort_key(key: u64) -> Result<(), CommandError> {
    if key == 0 {
        Err(CommandError::ZeroSortKey)
    } else {
        Ok(())
    }
}

/// Handle for an entity recorded by [`CommandBuffer::create_entity`] but not
/// yet realized; resolves to a live [`Entity`] during playback.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PendingEntity {
    index: u32,
}

impl PendingEntity {
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Either a live entity or one pending creation in the same buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommandEntity {
    Live(Entity),
    Pending(PendingEntity),
}

impl From<Entity> for CommandEntity {
    fn from(entity: Entity) -> Self {
        CommandEntity::Live(entity)
    }
}

impl From<PendingEntity> for CommandEntity {
    fn from(pending: PendingEntity) -> Self {
        CommandEntity::Pending(pending)
    }
}

pub(crate) enum CommandKind {
    Create,
    Destroy,
    Add {
        type_id: TypeId,
        type_name: &'static str,
        value: Box<dyn Any + Send + Sync>,
    },
    Remove {
        type_id: TypeId,
        type_name: &'static str,
    },
}

impl CommandKind {
    /// Tie-break rank for commands sharing a sort key: creates resolve
    /// first, then destroys (destroy wins against add/remove), then adds,
    /// then removes.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            CommandKind::Create => 0,
            CommandKind::Destroy => 1,
            CommandKind::Add { .. } => 2,
            CommandKind::Remove { .. } => 3,
        }
    }
}

pub(crate) struct Command {
    pub key: u64,
    pub seq: u32,
    pub target: CommandEntity,
    pub kind: CommandKind,
}

/// Ordered record of structural intent for one tick.
///
/// Worker-local buffers are concatenated with [`CommandBuffer::absorb`]
/// before the single playback pass; they are never replayed independently.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    pending_count: u32,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn pending_count(&self) -> u32 {
        self.pending_count
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.pending_count = 0;
    }

    fn push(&mut self, key: u64, target: CommandEntity, kind: CommandKind) {
        let seq = self.commands.len() as u32;
        self.commands.push(Command {
            key,
            seq,
            target,
            kind,
        });
    }

    /// Record an entity creation, returning a handle later commands in this
    /// buffer may target.
    pub fn create_entity(&mut self, key: u64) -> Result<PendingEntity, CommandError> {
        ensure_sort_key(key)?;
        let pending = PendingEntity {
            index: self.pending_count,
        };
        self.pending_count += 1;
        self.push(key, CommandEntity::Pending(pending), CommandKind::Create);
        Ok(pending)
    }

    pub fn destroy_entity(
        &mut self,
        target: impl Into<CommandEntity>,
        key: u64,
    ) -> Result<(), CommandError> {
        ensure_sort_key(key)?;
        self.push(key, target.into(), CommandKind::Destroy);
        Ok(())
    }

    pub fn add<T: Component>(
        &mut self,
        target: impl Into<CommandEntity>,
        value: T,
        key: u64,
    ) -> Result<(), CommandError> {
        ensure_sort_key(key)?;
        self.push(
            key,
            target.into(),
            CommandKind::Add {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                value: Box::new(value),
            },
        );
        Ok(())
    }

    pub fn remove<T: Component>(
        &mut self,
        target: impl Into<CommandEntity>,
        key: u64,
    ) -> Result<(), CommandError> {
        ensure_sort_key(key)?;
        self.push(
            key,
            target.into(),
            CommandKind::Remove {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
            },
        );
        Ok(())
    }

    /// Concatenate another buffer onto this one, remapping its pending
    /// handles and sequence numbers. Callers absorb worker buffers in a
    /// fixed enumeration order to keep playback deterministic.
    pub fn absorb(&mut self, other: CommandBuffer) {
        let pending_base = self.pending_count;
        for mut command in other.commands {
            if let CommandEntity::Pending(pending) = command.target {
                command.target = CommandEntity::Pending(PendingEntity {
                    index: pending.index + pending_base,
                });
            }
            command.seq = self.commands.len() as u32;
            self.commands.push(command);
        }
        self.pending_count += other.pending_count;
    }

    /// Establish the total playback order: ascending (key, kind rank, seq).
    pub(crate) fn sort_for_playback(&mut self) {
        self.commands
            .sort_by_key(|command| (command.key, command.kind.rank(), command.seq));
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.pending_count = 0;
        self.commands.drain(..)
    }
}
