//! Every space strategy must report exactly the overlapping pairs that a
//! brute-force comparison of bounding boxes finds.

use std::collections::HashSet;

use dynamics::{GeomHandle, Shape, SpaceHandle, SpaceKind, World};
use glam::Vec3;

/// Scatters dynamic spheres of mixed sizes into `spaces`, round robin.
fn scatter(world: &mut World, spaces: &[SpaceHandle], seed: u64, count: usize) -> Vec<GeomHandle> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..count)
        .map(|i| {
            let body = world.create_body();
            let position = Vec3::new(rng.f32() * 20.0 - 10.0, rng.f32() * 4.0, rng.f32() * 20.0 - 10.0);
            world.body_mut(body).unwrap().set_position(position);
            // mostly small spheres with the occasional large one
            let radius = if rng.u8(..) < 20 { 2.0 + rng.f32() * 3.0 } else { 0.1 + rng.f32() };
            let geom = world
                .create_geom(Shape::sphere(radius), Some(spaces[i % spaces.len()]))
                .unwrap();
            world.set_geom_body(geom, Some(body)).unwrap();
            geom
        })
        .collect()
}

fn brute_force(world: &World, geoms: &[GeomHandle]) -> HashSet<(GeomHandle, GeomHandle)> {
    let mut pairs = HashSet::new();
    for (i, &a) in geoms.iter().enumerate() {
        for &b in &geoms[i + 1..] {
            if world.geom_aabb(a).unwrap().overlaps(&world.geom_aabb(b).unwrap()) {
                pairs.insert(normalized(a, b));
            }
        }
    }
    pairs
}

fn normalized(a: GeomHandle, b: GeomHandle) -> (GeomHandle, GeomHandle) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn reported(world: &mut World, space: SpaceHandle) -> HashSet<(GeomHandle, GeomHandle)> {
    let pairs = world.space_collide(space).unwrap();
    let set: HashSet<_> = pairs.iter().map(|&(a, b)| normalized(a, b)).collect();
    assert_eq!(set.len(), pairs.len(), "a pair was reported twice");
    set
}

fn check_kind(kind: SpaceKind) {
    for seed in 0..5 {
        let mut world = World::default();
        let space = world.create_space(kind);
        let geoms = scatter(&mut world, &[space], seed, 150);
        let expected = brute_force(&world, &geoms);
        let found = reported(&mut world, space);
        println!("{kind:?} seed {seed}: {} pairs", expected.len());
        assert_eq!(found, expected, "{kind:?} disagrees with brute force for seed {seed}");
    }
}

#[test]
fn flat_space_matches_brute_force() {
    check_kind(SpaceKind::Flat);
}

#[test]
fn hash_grid_matches_brute_force() {
    check_kind(SpaceKind::hash_grid());
    check_kind(SpaceKind::HashGrid {
        min_level: 0,
        max_level: 1,
    });
}

#[test]
fn quadtree_matches_brute_force() {
    check_kind(SpaceKind::QuadTree {
        center: Vec3::new(0.0, 2.0, 0.0),
        extents: Vec3::new(16.0, 16.0, 16.0),
        depth: 4,
        up_axis: 1,
    });
}

#[test]
fn nested_spaces_report_the_same_pairs() {
    let mut world = World::default();
    let root = world.create_space(SpaceKind::hash_grid());
    let left = world.create_space(SpaceKind::Flat);
    let right = world.create_space(SpaceKind::hash_grid());
    world.space_add_space(root, left).unwrap();
    world.space_add_space(root, right).unwrap();

    let geoms = scatter(&mut world, &[root, left, right], 42, 120);
    let expected = brute_force(&world, &geoms);
    let found = reported(&mut world, root);
    assert_eq!(found, expected);
}

#[test]
fn static_and_same_body_pairs_are_skipped() {
    let mut world = World::default();
    let space = world.create_space(SpaceKind::Flat);
    let ground = world.create_geom(Shape::plane(Vec3::Y, 0.0), Some(space)).unwrap();
    let wall = world.create_geom(Shape::cuboid(Vec3::ONE), Some(space)).unwrap();

    let body = world.create_body();
    let a = world.create_geom(Shape::sphere(1.0), Some(space)).unwrap();
    let b = world.create_geom(Shape::sphere(1.0), Some(space)).unwrap();
    world.set_geom_body(a, Some(body)).unwrap();
    world.set_geom_body(b, Some(body)).unwrap();

    let found = reported(&mut world, space);
    assert!(!found.contains(&normalized(ground, wall)), "static pair reported");
    assert!(!found.contains(&normalized(a, b)), "pair on one body reported");
    assert!(found.contains(&normalized(ground, a)));
    assert!(found.contains(&normalized(wall, b)));
}

#[test]
fn category_bits_filter_pairs() {
    let mut world = World::default();
    let space = world.create_space(SpaceKind::Flat);
    let geoms = scatter(&mut world, &[space], 3, 2);
    for &g in &geoms {
        world.set_geom_position(g, Vec3::ZERO).unwrap();
    }
    assert_eq!(world.space_collide(space).unwrap().len(), 1);

    let first = world.geom_mut(geoms[0]).unwrap();
    first.set_category_bits(0b01);
    first.set_collide_bits(0b01);
    let second = world.geom_mut(geoms[1]).unwrap();
    second.set_category_bits(0b10);
    second.set_collide_bits(0b10);
    assert!(world.space_collide(space).unwrap().is_empty());
}
