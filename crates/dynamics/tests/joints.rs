//! Joint behaviour driven through the world: stops, motors, the inherited
//! stop policy of `set_limits`, and handle lifetimes.

use anyhow::Result;
use dynamics::{BodyHandle, JointHandle, JointParam, LimitParam, Mass, PhysicsError, World, WorldConfig};
use glam::{Quat, Vec3};

const DT: f32 = 0.01;

/// A small unit mass hanging one metre below a world hinge on the Z axis,
/// swinging with `speed` along +X.
fn pendulum(speed: f32) -> Result<(World, BodyHandle, JointHandle)> {
    let mut world = World::new(WorldConfig::default().with_gravity(Vec3::new(0.0, -10.0, 0.0)));
    let bob = world.create_body();
    {
        let b = world.body_mut(bob)?;
        b.set_position(Vec3::new(0.0, -1.0, 0.0));
        b.set_mass(Mass::sphere_total(1.0, 0.1))?;
    }
    let hinge = world.create_hinge(None)?;
    world.attach(hinge, Some(bob), None)?;
    world.set_hinge_anchor(hinge, Vec3::ZERO)?;
    world.set_hinge_axis(hinge, Vec3::Z)?;
    let b = world.body_mut(bob)?;
    b.set_linear_velocity(Vec3::new(speed, 0.0, 0.0));
    b.set_angular_velocity(Vec3::new(0.0, 0.0, speed));
    Ok((world, bob, hinge))
}

/// Smallest and largest hinge angle seen over `steps`.
fn swing(world: &mut World, hinge: JointHandle, steps: usize) -> Result<(f32, f32)> {
    let mut range = (f32::MAX, f32::MIN);
    for _ in 0..steps {
        world.step(DT)?;
        let angle = world.hinge_angle(hinge)?;
        range = (range.0.min(angle), range.1.max(angle));
    }
    Ok(range)
}

#[test]
fn free_pendulum_swings_past_horizontal() -> Result<()> {
    let (mut world, _, hinge) = pendulum(5.0)?;
    let (lo, hi) = swing(&mut world, hinge, 300)?;
    println!("free swing {lo:.3} .. {hi:.3}");
    // energy allows about 104 degrees each way
    assert!(hi > 1.6 && lo < -1.6);
    Ok(())
}

#[test]
fn hinge_stops_hold_the_swing() -> Result<()> {
    let (mut world, _, hinge) = pendulum(5.0)?;
    world.set_limits(hinge, -0.5, 0.5)?;
    let (lo, hi) = swing(&mut world, hinge, 300)?;
    println!("limited swing {lo:.3} .. {hi:.3}");
    assert!(hi < 0.6 && hi > 0.45);
    assert!(lo > -0.6);
    Ok(())
}

#[test]
fn stop_on_the_wrong_side_of_zero_is_ignored() -> Result<()> {
    // inherited policy: a high stop below zero disables the high side
    // instead of trapping the joint outside its range
    let (mut world, _, hinge) = pendulum(5.0)?;
    world.set_limits(hinge, -0.5, -0.1)?;
    assert_eq!(
        world.joint_param(hinge, JointParam::Axis1(LimitParam::HiStop))?,
        f32::INFINITY
    );
    assert_eq!(world.joint_param(hinge, JointParam::Axis1(LimitParam::LoStop))?, -0.5);

    let (lo, hi) = swing(&mut world, hinge, 300)?;
    println!("half limited swing {lo:.3} .. {hi:.3}");
    assert!(hi > 1.6, "positive side should be free");
    assert!(lo > -0.6, "low stop should still hold");
    Ok(())
}

#[test]
fn raw_params_bypass_the_policy() -> Result<()> {
    let (mut world, _, hinge) = pendulum(0.0)?;
    world.set_joint_param(hinge, JointParam::Axis1(LimitParam::LoStop), 0.2)?;
    assert_eq!(world.joint_param(hinge, JointParam::Axis1(LimitParam::LoStop))?, 0.2);
    Ok(())
}

#[test]
fn hinge_motor_reaches_its_speed() -> Result<()> {
    let mut world = World::default();
    let wheel = world.create_body();
    let hinge = world.create_hinge(None)?;
    world.attach(hinge, Some(wheel), None)?;
    world.set_hinge_anchor(hinge, Vec3::ZERO)?;
    world.set_hinge_axis(hinge, Vec3::X)?;
    world.set_joint_param(hinge, JointParam::Axis1(LimitParam::Vel), 3.0)?;
    world.set_joint_param(hinge, JointParam::Axis1(LimitParam::FMax), 50.0)?;
    for _ in 0..20 {
        world.step(DT)?;
    }
    let rate = world.hinge_angle_rate(hinge)?;
    println!("motor rate {rate}");
    assert!((rate - 3.0).abs() < 1e-2);
    Ok(())
}

#[test]
fn weak_motor_is_limited_by_fmax() -> Result<()> {
    let mut world = World::default();
    let wheel = world.create_body();
    let hinge = world.create_hinge(None)?;
    world.attach(hinge, Some(wheel), None)?;
    world.set_hinge_axis(hinge, Vec3::X)?;
    world.set_joint_param(hinge, JointParam::Axis1(LimitParam::Vel), 100.0)?;
    world.set_joint_param(hinge, JointParam::Axis1(LimitParam::FMax), 1.0)?;
    world.step(DT)?;
    // unit inertia: one step of 1 N m gives 0.01 rad/s
    let rate = world.hinge_angle_rate(hinge)?;
    assert!((rate - 0.01).abs() < 1e-3, "rate {rate}");
    Ok(())
}

#[test]
fn slider_stops_bound_travel() -> Result<()> {
    let mut world = World::default();
    let block = world.create_body();
    let slider = world.create_slider(None)?;
    world.attach(slider, Some(block), None)?;
    world.set_slider_axis(slider, Vec3::X)?;
    world.set_limits(slider, -0.2, 0.3)?;

    for _ in 0..200 {
        world.add_slider_force(slider, 5.0)?;
        world.step(DT)?;
    }
    let position = world.slider_position(slider)?;
    let b = world.body(block)?;
    println!("slider position {position}, body at {}", b.position());
    assert!(position < 0.32 && position > 0.27);
    assert!(b.position().y.abs() < 1e-3 && b.position().z.abs() < 1e-3);
    assert!(b.orientation().angle_between(Quat::IDENTITY) < 1e-3);
    Ok(())
}

#[test]
fn hinge2_drives_the_wheel_axle() -> Result<()> {
    let mut world = World::default();
    let chassis = world.create_body();
    let wheel = world.create_body();
    world.body_mut(wheel)?.set_position(Vec3::new(1.0, 0.0, 0.0));
    let joint = world.create_hinge2(None)?;
    world.attach(joint, Some(chassis), Some(wheel))?;
    world.set_hinge2_anchor(joint, Vec3::new(1.0, 0.0, 0.0))?;
    world.set_hinge2_axis1(joint, Vec3::Y)?;
    world.set_hinge2_axis2(joint, Vec3::X)?;
    world.set_joint_param(joint, JointParam::Axis2(LimitParam::Vel), 2.0)?;
    world.set_joint_param(joint, JointParam::Axis2(LimitParam::FMax), 100.0)?;

    for _ in 0..50 {
        world.step(DT)?;
    }
    let spin = world.hinge2_angle2_rate(joint)?;
    let steer = world.hinge2_angle1(joint)?;
    println!("axle rate {spin}, steering {steer}");
    assert!((spin - 2.0).abs() < 0.05);
    assert!(steer.abs() < 0.05);
    let (a1, a2) = world.hinge2_anchors(joint)?;
    assert!((a1 - a2).length() < 1e-3);
    Ok(())
}

#[test]
fn fixed_joint_keeps_the_relative_pose() -> Result<()> {
    let mut world = World::default();
    let a = world.create_body();
    let b = world.create_body();
    world.body_mut(b)?.set_position(Vec3::new(0.0, 1.0, 0.0));
    world.body_mut(b)?.set_orientation(Quat::from_rotation_x(0.4));
    let fixed = world.create_fixed(None)?;
    world.attach(fixed, Some(a), Some(b))?;
    world.set_fixed(fixed)?;

    for _ in 0..100 {
        world.body_mut(b)?.add_force(Vec3::new(3.0, 0.0, 0.0));
        world.body_mut(a)?.add_torque(Vec3::new(0.0, 0.5, 0.0));
        world.step(DT)?;
    }
    let pa = world.body(a)?;
    let pb = world.body(b)?;
    let local = pa.world_to_local(pb.position());
    let relative = pa.orientation().conjugate() * pb.orientation();
    println!("offset {local}, relative {relative}");
    assert!((local - Vec3::Y).length() < 0.02);
    assert!(relative.angle_between(Quat::from_rotation_x(0.4)) < 0.02);
    assert!(pa.linear_velocity().x > 0.5, "the pair should move together");
    Ok(())
}

#[test]
fn joint_without_bodies_cannot_answer() {
    let mut world = World::default();
    let slider = world.create_slider(None).unwrap();
    assert_eq!(world.slider_position(slider), Err(PhysicsError::JointNotAttached));
    assert_eq!(world.set_slider_axis(slider, Vec3::X), Err(PhysicsError::JointNotAttached));
}

#[test]
fn zero_axis_is_rejected() -> Result<()> {
    let (mut world, _, hinge) = pendulum(0.0)?;
    assert_eq!(world.set_hinge_axis(hinge, Vec3::ZERO), Err(PhysicsError::ZeroAxis));
    Ok(())
}

#[test]
fn destroyed_objects_leave_stale_handles() -> Result<()> {
    let mut world = World::default();
    let a = world.create_body();
    let b = world.create_body();
    let hinge = world.create_hinge(None)?;
    world.attach(hinge, Some(a), Some(b))?;

    world.destroy_joint(hinge)?;
    assert_eq!(
        world.set_hinge_axis(hinge, Vec3::Z),
        Err(PhysicsError::StaleHandle { kind: "joint" })
    );
    assert!(world.destroy_joint(hinge).is_err());

    world.destroy_body(b)?;
    let ball = world.create_ball(None)?;
    assert_eq!(
        world.attach(ball, Some(a), Some(b)),
        Err(PhysicsError::StaleHandle { kind: "body" })
    );

    let group = world.create_joint_group();
    world.destroy_joint_group(group)?;
    assert!(world.create_ball(Some(group)).is_err());
    assert!(world.joint_group(group).is_err());
    Ok(())
}

#[test]
fn destroying_a_body_detaches_its_joints() -> Result<()> {
    let mut world = World::default();
    let a = world.create_body();
    let b = world.create_body();
    let ball = world.create_ball(None)?;
    world.attach(ball, Some(a), Some(b))?;
    world.destroy_body(a)?;
    assert_eq!(world.joint(ball)?.bodies(), (None, None));
    let stats = world.step(DT)?;
    assert_eq!(stats.rows, 0);

    // the joint can be attached again
    world.attach(ball, Some(b), None)?;
    assert_eq!(world.step(DT)?.rows, 3);
    Ok(())
}
