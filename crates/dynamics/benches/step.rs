use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dynamics::{Shape, SpaceHandle, SpaceKind, SurfaceParams, World, WorldConfig};
use glam::Vec3;

fn box_stack(height: u8) -> (World, SpaceHandle) {
    let mut world = World::new(WorldConfig::default().with_gravity(Vec3::new(0.0, -9.81, 0.0)));
    let space = world.create_space(SpaceKind::hash_grid());
    world
        .create_geom(Shape::plane(Vec3::Y, 0.0), Some(space))
        .unwrap();
    for level in 0..height {
        let body = world.create_body();
        world
            .body_mut(body)
            .unwrap()
            .set_position(Vec3::new(0.0, 0.5 + f32::from(level), 0.0));
        let geom = world
            .create_geom(Shape::cuboid(Vec3::splat(0.5)), Some(space))
            .unwrap();
        world.set_geom_body(geom, Some(body)).unwrap();
    }
    (world, space)
}

fn bench_box_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("box_stack_frame");
    for height in [5_u8, 20] {
        let (mut world, space) = box_stack(height);
        let contacts = world.create_joint_group();
        let surface = SurfaceParams::with_friction(0.6);
        group.bench_with_input(BenchmarkId::from_parameter(height), &height, |b, _| {
            b.iter(|| {
                world.auto_contacts(space, contacts, 4, surface).unwrap();
                world.step(0.01).unwrap();
                world.empty_joint_group(contacts).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_broad_phase(c: &mut Criterion) {
    let kinds = [
        ("flat", SpaceKind::Flat),
        ("hash_grid", SpaceKind::hash_grid()),
        (
            "quadtree",
            SpaceKind::QuadTree {
                center: Vec3::ZERO,
                extents: Vec3::splat(60.0),
                depth: 5,
                up_axis: 1,
            },
        ),
    ];
    let mut group = c.benchmark_group("space_collide_1000");
    for (name, kind) in kinds {
        let mut world = World::default();
        let space = world.create_space(kind);
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..1000 {
            let body = world.create_body();
            let position = Vec3::new(rng.f32() * 100.0 - 50.0, rng.f32() * 5.0, rng.f32() * 100.0 - 50.0);
            world.body_mut(body).unwrap().set_position(position);
            let geom = world
                .create_geom(Shape::sphere(0.2 + rng.f32()), Some(space))
                .unwrap();
            world.set_geom_body(geom, Some(body)).unwrap();
        }
        group.bench_function(name, |b| b.iter(|| world.space_collide(space).unwrap().len()));
    }
    group.finish();
}

criterion_group!(benches, bench_box_stack, bench_broad_phase);
criterion_main!(benches);
