#![deny(clippy::all, clippy::pedantic)]

use anyhow::Result;
use dynamics::{Mass, Shape, SpaceKind, SurfaceParams, World, WorldConfig};
use glam::{Quat, Vec3};

/// Drops a small stack of boxes and a swinging pendulum onto a plane and
/// reports their poses.
fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Building demo scene...");
    let mut world = World::new(WorldConfig::default().with_gravity(Vec3::new(0.0, -9.81, 0.0)));
    let space = world.create_space(SpaceKind::hash_grid());
    world.create_geom(Shape::plane(Vec3::Y, 0.0), Some(space))?;

    let half = Vec3::splat(0.25);
    let mut boxes = Vec::new();
    for level in 0..4_u8 {
        let body = world.create_body();
        let b = world.body_mut(body)?;
        b.set_position(Vec3::new(0.0, 0.25 + 0.5 * f32::from(level), 0.0));
        b.set_mass(Mass::cuboid(1.0, half * 2.0))?;
        let geom = world.create_geom(Shape::cuboid(half), Some(space))?;
        world.set_geom_body(geom, Some(body))?;
        boxes.push(body);
    }

    let bob = world.create_body();
    world.body_mut(bob)?.set_position(Vec3::new(2.0, 3.0, 0.0));
    world.body_mut(bob)?.set_orientation(Quat::from_rotation_z(0.3));
    let hinge = world.create_hinge(None)?;
    world.attach(hinge, Some(bob), None)?;
    world.set_hinge_anchor(hinge, Vec3::new(2.0, 4.0, 0.0))?;
    world.set_hinge_axis(hinge, Vec3::Z)?;
    world.body_mut(bob)?.set_linear_velocity(Vec3::new(1.5, 0.0, 0.0));

    let contacts = world.create_joint_group();
    let surface = SurfaceParams::with_friction(0.8);
    let dt = 0.01_f32;
    let num_steps = 300;

    tracing::info!("Starting simulation loop for {} steps with dt = {}...", num_steps, dt);
    for i in 0..num_steps {
        world.auto_contacts(space, contacts, 4, surface)?;
        let stats = world.step(dt)?;
        world.empty_joint_group(contacts)?;
        if (i + 1) % 50 == 0 {
            tracing::info!(
                "Step {} complete: {} islands, {} rows, top box y = {:.3}, hinge angle = {:.3}",
                i + 1,
                stats.islands,
                stats.rows,
                world.body(boxes[3])?.position().y,
                world.hinge_angle(hinge)?
            );
        }
    }

    for (i, body) in boxes.iter().enumerate() {
        let pose = world.body_pose(*body)?;
        tracing::info!("Box {} final position: {:?}", i, pose.position);
    }
    Ok(())
}
