//! ECS storage and hierarchy benchmarks.
//!
//! Covers entity/component churn, pose cascades over random hierarchies, and
//! the dense render pass. Hierarchies are generated from a fixed seed so runs
//! are comparable.
//!
//! Run with: `cargo bench --bench ecs_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use kiln_ecs::prelude::*;

const SEED: u64 = 0x6b69_6c6e;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a world of `count` transforms arranged as a random forest. Each node
/// picks a parent among the nodes created before it, or stays a root.
fn random_forest(count: usize, rng: &mut Pcg64) -> (World, Vec<Entity>) {
    let mut world = World::new();
    let mut nodes = Vec::with_capacity(count);
    for i in 0..count {
        let e = world.create_entity();
        world.create_transform(e);
        world.add_component(e, RenderComponent::with_mesh(MeshId(i as u32)));
        world.set_pose(e, random_pose(rng));
        if i > 0 && rng.gen_bool(0.9) {
            let parent = nodes[rng.gen_range(0..i)];
            world.set_parent(e, parent);
        }
        nodes.push(e);
    }
    (world, nodes)
}

fn random_pose(rng: &mut Pcg64) -> Pose {
    Pose {
        scale: Vec3::ONE,
        rotation: Quat::from_rotation_y(rng.gen_range(0.0..std::f32::consts::TAU)),
        translation: Vec3::new(
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
        ),
    }
}

// ---------------------------------------------------------------------------
// Benchmark 1: entity + component churn
// ---------------------------------------------------------------------------

fn bench_create_and_remove(c: &mut Criterion) {
    c.bench_function("create_remove_1k_with_components", |b| {
        b.iter(|| {
            let mut world = World::new();
            let entities: Vec<Entity> = (0..1000)
                .map(|_| {
                    let e = world.create_entity();
                    world.create_transform(e);
                    world.create_render(e);
                    e
                })
                .collect();
            for e in entities.iter().step_by(2) {
                world.remove_entity(*e);
            }
            black_box(world.entity_total());
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark 2: root pose change cascading over random hierarchies
// ---------------------------------------------------------------------------

fn bench_pose_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_cascade");

    for &count in &[100usize, 1000, 10_000] {
        let mut rng = Pcg64::seed_from_u64(SEED);
        let (mut world, nodes) = random_forest(count, &mut rng);
        let root = nodes[0];

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &_count| {
            b.iter(|| {
                world.set_pose(root, random_pose(&mut rng));
                black_box(world.world_matrix(root));
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 3: dense render pass
// ---------------------------------------------------------------------------

fn bench_render_instances(c: &mut Criterion) {
    let mut rng = Pcg64::seed_from_u64(SEED);
    let (world, _nodes) = random_forest(10_000, &mut rng);

    c.bench_function("render_instances_10k", |b| {
        b.iter(|| {
            let mut meshes = 0u64;
            for instance in world.render_instances() {
                meshes += u64::from(instance.render.mesh.0);
                black_box(instance.world);
            }
            black_box(meshes);
        });
    });

    c.bench_function("render_bytes_10k", |b| {
        b.iter(|| black_box(world.render_bytes().len()));
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_create_and_remove,
    bench_pose_cascade,
    bench_render_instances,
);
criterion_main!(benches);
