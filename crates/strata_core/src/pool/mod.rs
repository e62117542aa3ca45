//! Buffer pooling for allocation-free steady state.
//!
//! The array pool backs query archetype caches and transient per-tick
//! buffers. It is explicit, injectable state (owned by the world, shared via
//! `Arc`), never a hidden global, so tests stay isolated.

mod array_pool;
mod pooled_vec;

pub use array_pool::ArrayPool;
pub use pooled_vec::PooledVec;
