use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use strata_core::ecs::{sort_key, CommandBuffer, Query, World, WorldConfig};

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy)]
struct Velocity {
    x: f32,
    y: f32,
}

fn seeded_world(entities: usize) -> World {
    let mut world = World::new(WorldConfig::default());
    world.register_component::<Position>().unwrap();
    world.register_component::<Velocity>().unwrap();
    for i in 0..entities {
        let entity = world.create_entity().unwrap();
        world
            .add_component(entity, Position { x: i as f32, y: 0.0 })
            .unwrap();
        world
            .add_component(entity, Velocity { x: 1.0, y: 0.5 })
            .unwrap();
    }
    world
}

fn chunk_iteration(c: &mut Criterion) {
    let mut world = seeded_world(10_000);
    let position = world.component_id::<Position>().unwrap();
    let velocity = world.component_id::<Velocity>().unwrap();
    let mut query = Query::new(&world, &[position, velocity], &[]).unwrap();

    c.bench_function("chunk_iteration_10k", |b| {
        b.iter(|| {
            world.for_each_chunk(&mut query, |view| {
                let (positions, velocities) = view
                    .columns_rw::<Position, Velocity>()
                    .expect("both columns present");
                for (p, v) in positions.iter_mut().zip(velocities) {
                    p.x += v.x;
                    p.y += v.y;
                }
            });
            black_box(&world);
        })
    });
}

fn command_playback(c: &mut Criterion) {
    c.bench_function("command_playback_1k_spawns", |b| {
        b.iter_batched(
            || {
                let mut world = World::new(WorldConfig::default());
                world.register_component::<Position>().unwrap();
                let mut buffer = CommandBuffer::new();
                for i in 0..1_000u64 {
                    let key = sort_key(1, i);
                    let pending = buffer.create_entity(key).unwrap();
                    buffer
                        .add(pending, Position { x: i as f32, y: 0.0 }, key)
                        .unwrap();
                }
                (world, buffer)
            },
            |(mut world, mut buffer)| {
                world.apply(&mut buffer).unwrap();
                world
            },
            BatchSize::SmallInput,
        )
    });
}

fn query_cache_hit(c: &mut Criterion) {
    let world = seeded_world(10_000);
    let position = world.component_id::<Position>().unwrap();
    let mut query = Query::new(&world, &[position], &[]).unwrap();
    query.matching(&world); // warm the cache

    c.bench_function("query_cache_hit", |b| {
        b.iter(|| black_box(query.matching(&world).len()))
    });
}

criterion_group!(benches, chunk_iteration, command_playback, query_cache_hit);
criterion_main!(benches);
