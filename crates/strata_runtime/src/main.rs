//! Strata Runtime
//!
//! Headless binary that boots a world, registers a small demo simulation and
//! drives it through the fixed-tick clock.

use anyhow::Result;
use strata_core::ecs::{
    sort_key, Phase, Query, Scheduler, System, World, WorldConfig, WorldError,
};
use strata_core::time::FixedTickClock;
use strata_metrics::{Counter, TickTimer};

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    x: f32,
    y: f32,
}

/// Emits one new moving entity per tick through the command buffer.
struct SpawnSystem;

impl System for SpawnSystem {
    fn name(&self) -> &'static str {
        "spawn"
    }

    fn on_update(&mut self, world: &mut World, tick: u64) -> Result<(), WorldError> {
        let pending = world.commands().create_entity(sort_key(tick, 0))?;
        world.commands().add(
            pending,
            Position {
                x: tick as f32,
                y: 0.0,
            },
            sort_key(tick, 1),
        )?;
        world.commands().add(
            pending,
            Velocity { x: 1.0, y: 0.25 },
            sort_key(tick, 2),
        )?;
        Ok(())
    }
}

/// Integrates positions by velocity once per tick.
struct MovementSystem {
    query: Option<Query>,
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn on_create(&mut self, world: &mut World) {
        let position = world.component_id::<Position>().expect("registered at boot");
        let velocity = world.component_id::<Velocity>().expect("registered at boot");
        self.query = Some(Query::new(world, &[position, velocity], &[]).expect("valid query"));
    }

    fn on_update(&mut self, world: &mut World, _tick: u64) -> Result<(), WorldError> {
        let query = self.query.as_mut().expect("on_create ran");
        world.for_each_chunk(query, |view| {
            if let Some((positions, velocities)) = view.columns_rw::<Position, Velocity>() {
                for (position, velocity) in positions.iter_mut().zip(velocities) {
                    position.x += velocity.x;
                    position.y += velocity.y;
                }
            }
        });
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Strata v{}", strata_core::VERSION);

    let config = WorldConfig::default();
    let hz = config.simulation_hz;
    let mut world = World::new(config);
    world.register_component::<Position>()?;
    world.register_component::<Velocity>()?;

    let mut scheduler = Scheduler::new();
    scheduler.add_system(Phase::Simulation, Box::new(SpawnSystem), 0);
    scheduler.add_system(Phase::Simulation, Box::new(MovementSystem { query: None }), 10);

    // Simulate five seconds of wall time in synthetic 16ms frames.
    let mut clock = FixedTickClock::new(hz);
    let mut timer = TickTimer::new(hz as usize);
    let mut counter = Counter::new();
    let frames = (5.0 / 0.016) as usize;
    for _ in 0..frames {
        clock.accumulate(0.016);
        counter.increment("frames", 1);
        while let Some(tick) = clock.try_consume_tick() {
            timer.begin();
            scheduler.tick(&mut world, tick)?;
            timer.end();
            counter.increment("ticks", 1);
        }
    }

    tracing::info!(
        frames = counter.get("frames"),
        ticks = counter.get("ticks"),
        entities = world.entity_count(),
        archetypes = world.archetypes().len(),
        "simulation finished"
    );
    tracing::info!(
        tick_ms = timer.tick_time_ms(),
        ticks_per_second = timer.ticks_per_second(),
        "tick timing"
    );
    for system in ["spawn", "movement"] {
        let timing = scheduler.profiler().timing(system);
        tracing::info!(
            system,
            total_ms = timing.total.as_secs_f64() * 1e3,
            avg_us = timing.average().as_secs_f64() * 1e6,
            calls = timing.calls,
            "system timing"
        );
    }
    for (name, count) in world.stats().snapshot() {
        tracing::info!(counter = name, count, "structural ops");
    }

    scheduler.destroy(&mut world);
    Ok(())
}
