//! Strata Engine Core
//!
//! Contains the deterministic simulation substrate:
//! - Archetype-based entity/component storage (ECS)
//! - Version-stamped query caching
//! - Sorted command buffering for structural mutation
//! - Fixed-phase tick scheduling and a fixed-step clock
//! - Buffer pooling for allocation-free steady state

pub mod ecs;
pub mod pool;
pub mod time;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
