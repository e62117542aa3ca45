// query.rs - Version-stamped cached archetype queries
//
// A query is immutable once constructed: normalized required/excluded id
// lists plus their signature masks. The matching archetype list is cached in
// a pooled buffer and recomputed only when the world's structural version
// has moved, so steady-state lookups cost one version compare.

use crate::ecs::error::QueryError;
use crate::ecs::{ArchetypeId, ComponentTypeId, Signature, World};
use crate::pool::PooledVec;

#[derive(Debug)]
pub struct Query {
    required: Vec<ComponentTypeId>,
    excluded: Vec<ComponentTypeId>,
    required_mask: Signature,
    excluded_mask: Signature,
    cache: PooledVec<ArchetypeId>,
    cache_version: Option<u64>,
}

fn normalize(ids: &[ComponentTypeId]) -> Vec<ComponentTypeId> {
    let mut list = ids.to_vec();
    list.sort_unstable();
    list.dedup();
    list
}

impl Query {
    /// Build a query over `world`'s component ids. The required set must be
    /// non-empty and disjoint from the excluded set.
    pub fn new(
        world: &World,
        required: &[ComponentTypeId],
        excluded: &[ComponentTypeId],
    ) -> Result<Self, QueryError> {
        let required = normalize(required);
        let excluded = normalize(excluded);

        if required.is_empty() {
            return Err(QueryError::EmptyRequired);
        }
        if let Some(&id) = required.iter().find(|id| excluded.binary_search(id).is_ok()) {
            return Err(QueryError::RequiredExcludedOverlap { id });
        }

        Ok(Self {
            required_mask: Signature::from_ids(&required),
            excluded_mask: Signature::from_ids(&excluded),
            required,
            excluded,
            cache: PooledVec::new(world.archetype_pool()),
            cache_version: None,
        })
    }

    /// Normalized required id list.
    pub fn required(&self) -> &[ComponentTypeId] {
        &self.required
    }

    /// Normalized excluded id list.
    pub fn excluded(&self) -> &[ComponentTypeId] {
        &self.excluded
    }

    /// Whether an archetype signature satisfies this query.
    #[inline]
    pub fn matches_signature(&self, signature: &Signature) -> bool {
        signature.matches(&self.required_mask, &self.excluded_mask)
    }

    /// Version the cache was last computed at (None before first use).
    pub fn cached_version(&self) -> Option<u64> {
        self.cache_version
    }

    /// Matching archetypes, rescanned only if the world's structural version
    /// advanced since the last call.
    pub fn matching<'q>(&'q mut self, world: &World) -> &'q [ArchetypeId] {
        let version = world.version();
        if self.cache_version != Some(version) {
            let count = world
                .archetypes()
                .iter()
                .filter(|archetype| self.matches_signature(archetype.signature()))
                .count();
            self.cache.renew(count);
            for archetype in world.archetypes() {
                if self.matches_signature(archetype.signature()) {
                    self.cache.push(archetype.id());
                }
            }
            self.cache_version = Some(version);
        }
        self.cache.as_slice()
    }
}
