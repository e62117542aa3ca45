// scheduler.rs - Four-phase fixed tick scheduler
//
// One tick runs pre-simulation, simulation and post-simulation, replays the
// world's deferred command buffer at the sync point, then runs presentation
// against the settled storage. Within a phase systems execute in ascending
// (priority, name) order, so a tick is a deterministic function of the
// registered systems and the world state.

use crate::ecs::error::WorldError;
use crate::ecs::World;
use strata_metrics::SystemProfiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PreSimulation,
    Simulation,
    PostSimulation,
    Presentation,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::PreSimulation,
        Phase::Simulation,
        Phase::PostSimulation,
        Phase::Presentation,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            Phase::PreSimulation => 0,
            Phase::Simulation => 1,
            Phase::PostSimulation => 2,
            Phase::Presentation => 3,
        }
    }
}

/// A unit of per-tick work.
///
/// `on_create` runs once before the system's first tick, `on_destroy` once at
/// scheduler teardown. Presentation-phase systems observe post-playback
/// storage and should treat it as read-only.
pub trait System: Send {
    fn name(&self) -> &'static str;

    fn on_create(&mut self, _world: &mut World) {}

    fn on_update(&mut self, world: &mut World, tick: u64) -> Result<(), WorldError>;

    fn on_destroy(&mut self, _world: &mut World) {}
}

struct Entry {
    priority: i32,
    system: Box<dyn System>,
}

pub struct Scheduler {
    phases: [Vec<Entry>; 4],
    created: bool,
    profiler: SystemProfiler,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            phases: Default::default(),
            created: false,
            profiler: SystemProfiler::new(),
        }
    }

    /// Register a system. Lower priority runs earlier; ties break by name so
    /// registration order never matters.
    pub fn add_system(&mut self, phase: Phase, system: Box<dyn System>, priority: i32) {
        tracing::debug!(system = system.name(), ?phase, priority, "system registered");
        let entries = &mut self.phases[phase.index()];
        let at = entries.partition_point(|entry| {
            (entry.priority, entry.system.name()) <= (priority, system.name())
        });
        entries.insert(at, Entry { priority, system });
    }

    pub fn system_count(&self) -> usize {
        self.phases.iter().map(|entries| entries.len()).sum()
    }

    /// Per-system accumulated wall time (no-op build without `metrics`).
    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }

    /// Run every `on_create` hook, once. Called implicitly by the first
    /// [`Scheduler::tick`].
    pub fn create(&mut self, world: &mut World) {
        if self.created {
            return;
        }
        for phase in Phase::ALL {
            for entry in &mut self.phases[phase.index()] {
                entry.system.on_create(world);
            }
        }
        self.created = true;
    }

    /// Run `on_destroy` hooks in reverse registration order. No-op when the
    /// scheduler was never created.
    pub fn destroy(&mut self, world: &mut World) {
        if !self.created {
            return;
        }
        for phase in Phase::ALL.iter().rev() {
            for entry in self.phases[phase.index()].iter_mut().rev() {
                entry.system.on_destroy(world);
            }
        }
        self.created = false;
    }

    /// Execute one full tick: the three simulation phases, command playback
    /// at the sync point, then presentation. The world's tick guard is
    /// released even when a system fails, and a failed tick's recorded
    /// commands are discarded rather than replayed at the next sync point.
    pub fn tick(&mut self, world: &mut World, tick: u64) -> Result<(), WorldError> {
        self.create(world);
        world.begin_tick(tick)?;
        let result = self.run_phases(world, tick);
        if result.is_err() {
            world.discard_deferred();
        }
        let ended = world.end_tick();
        result?;
        ended
    }

    fn run_phases(&mut self, world: &mut World, tick: u64) -> Result<(), WorldError> {
        self.run_phase(Phase::PreSimulation, world, tick)?;
        self.run_phase(Phase::Simulation, world, tick)?;
        self.run_phase(Phase::PostSimulation, world, tick)?;
        world.apply_deferred()?;
        self.run_phase(Phase::Presentation, world, tick)
    }

    fn run_phase(&mut self, phase: Phase, world: &mut World, tick: u64) -> Result<(), WorldError> {
        let profiler = &mut self.profiler;
        for entry in &mut self.phases[phase.index()] {
            let name = entry.system.name();
            profiler.time_system(name, || entry.system.on_update(world, tick))?;
        }
        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::command::sort_key;
    use crate::ecs::{Query, WorldConfig};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl System for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_create(&mut self, _world: &mut World) {
            self.log.lock().unwrap().push(format!("create {}", self.name));
        }

        fn on_update(&mut self, _world: &mut World, _tick: u64) -> Result<(), WorldError> {
            self.log.lock().unwrap().push(format!("update {}", self.name));
            Ok(())
        }

        fn on_destroy(&mut self, _world: &mut World) {
            self.log.lock().unwrap().push(format!("destroy {}", self.name));
        }
    }

    fn recorder(name: &'static str, log: &Log) -> Box<dyn System> {
        Box::new(Recorder {
            name,
            log: Arc::clone(log),
        })
    }

    #[test]
    fn systems_run_by_phase_then_priority_then_name() {
        let log: Log = Default::default();
        let mut world = World::new(WorldConfig::default());
        let mut scheduler = Scheduler::new();

        // Registered deliberately out of order.
        scheduler.add_system(Phase::Presentation, recorder("render", &log), 0);
        scheduler.add_system(Phase::Simulation, recorder("b_physics", &log), 10);
        scheduler.add_system(Phase::Simulation, recorder("a_ai", &log), 10);
        scheduler.add_system(Phase::Simulation, recorder("input_apply", &log), -5);
        scheduler.add_system(Phase::PreSimulation, recorder("poll", &log), 0);

        scheduler.tick(&mut world, 1).unwrap();

        let updates: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.starts_with("update"))
            .cloned()
            .collect();
        assert_eq!(
            updates,
            vec![
                "update poll",
                "update input_apply",
                "update a_ai",
                "update b_physics",
                "update render",
            ]
        );
    }

    #[test]
    fn create_runs_once_and_destroy_reverses() {
        let log: Log = Default::default();
        let mut world = World::new(WorldConfig::default());
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Phase::Simulation, recorder("first", &log), 0);
        scheduler.add_system(Phase::Presentation, recorder("second", &log), 0);

        scheduler.tick(&mut world, 1).unwrap();
        scheduler.tick(&mut world, 2).unwrap();
        scheduler.destroy(&mut world);
        scheduler.destroy(&mut world); // second call is a no-op

        let lifecycle: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .filter(|line| !line.starts_with("update"))
            .cloned()
            .collect();
        assert_eq!(
            lifecycle,
            vec!["create first", "create second", "destroy second", "destroy first"]
        );
    }

    struct Spawner;

    impl System for Spawner {
        fn name(&self) -> &'static str {
            "spawner"
        }

        fn on_update(&mut self, world: &mut World, tick: u64) -> Result<(), WorldError> {
            let pending = world.commands().create_entity(sort_key(tick, 0))?;
            world.commands().add(pending, 7u64, sort_key(tick, 1))?;
            Ok(())
        }
    }

    struct CountAtPresentation {
        seen: Arc<Mutex<Vec<usize>>>,
    }

    impl System for CountAtPresentation {
        fn name(&self) -> &'static str {
            "count_at_presentation"
        }

        fn on_update(&mut self, world: &mut World, _tick: u64) -> Result<(), WorldError> {
            self.seen.lock().unwrap().push(world.entity_count());
            Ok(())
        }
    }

    #[test]
    fn simulation_commands_are_visible_to_presentation() {
        let mut world = World::new(WorldConfig::default());
        world.register_component::<u64>().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut scheduler = Scheduler::new();
        scheduler.add_system(Phase::Simulation, Box::new(Spawner), 0);
        scheduler.add_system(
            Phase::Presentation,
            Box::new(CountAtPresentation {
                seen: Arc::clone(&seen),
            }),
            0,
        );

        scheduler.tick(&mut world, 1).unwrap();
        scheduler.tick(&mut world, 2).unwrap();

        // Each tick's spawn is realized before its own presentation phase.
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert!(!world.is_updating());

        let marker = world.component_id::<u64>().unwrap();
        let mut query = Query::new(&world, &[marker], &[]).unwrap();
        let mut total = 0;
        world.for_each_entity(&mut query, |_, _, _| total += 1);
        assert_eq!(total, 2);
    }

    #[test]
    fn tick_guard_is_released_after_a_failing_system() {
        struct Failing;
        impl System for Failing {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn on_update(&mut self, world: &mut World, _tick: u64) -> Result<(), WorldError> {
                // Direct structural mutation mid-tick is the canonical error.
                world.create_entity().map(|_| ())
            }
        }

        let mut world = World::new(WorldConfig::default());
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Phase::Simulation, Box::new(Failing), 0);

        assert!(scheduler.tick(&mut world, 1).is_err());
        assert!(!world.is_updating());
        world.create_entity().unwrap();
    }

    #[test]
    fn failed_tick_discards_its_recorded_commands() {
        struct Emit;
        impl System for Emit {
            fn name(&self) -> &'static str {
                "emit"
            }
            fn on_update(&mut self, world: &mut World, tick: u64) -> Result<(), WorldError> {
                world.commands().create_entity(sort_key(tick, 0))?;
                Ok(())
            }
        }

        struct FailOnce {
            failed: bool,
        }
        impl System for FailOnce {
            fn name(&self) -> &'static str {
                "fail_once"
            }
            fn on_update(&mut self, world: &mut World, _tick: u64) -> Result<(), WorldError> {
                if self.failed {
                    return Ok(());
                }
                self.failed = true;
                // Direct structural mutation mid-tick, the canonical error.
                world.create_entity().map(|_| ())
            }
        }

        let mut world = World::new(WorldConfig::default());
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Phase::Simulation, Box::new(Emit), 0);
        scheduler.add_system(Phase::Simulation, Box::new(FailOnce { failed: false }), 10);

        // Emit records a create before FailOnce aborts the tick; that command
        // must not survive into the next tick's playback.
        assert!(scheduler.tick(&mut world, 1).is_err());
        assert_eq!(world.entity_count(), 0);

        scheduler.tick(&mut world, 2).unwrap();
        assert_eq!(world.entity_count(), 1);
    }
}
