#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use critters::simulation::movement::{
    MovementPool, MovementSnapshot, PhysicsConstants, integrate, integrate_all,
};
use critters::simulation::params::Params;
use ndarray::Array1;

fn create_test_params() -> Params {
    Params {
        width: 200.0,
        height: 100.0,
        ..Params::default()
    }
}

fn create_test_snapshot(id: u64, x: f64, y: f64) -> MovementSnapshot {
    MovementSnapshot {
        id,
        size: 3.0,
        acceleration_command: 0.0,
        rotation_command: 0.0,
        light_emission: 0.0,
        position: Array1::from_vec(vec![x, y]),
        direction: Array1::from_vec(vec![1.0, 0.0]),
        acceleration: 0.0,
        velocity: 0.0,
        deceleration: 0.0,
        energy: 30.0,
    }
}

#[test]
fn test_acceleration_is_clamped_with_sign() {
    let constants = PhysicsConstants::from(&create_test_params());
    let mut snapshot = create_test_snapshot(0, 50.0, 50.0);

    snapshot.acceleration_command = 1000.0;
    let moved = integrate(&snapshot, 16.0, &constants);
    assert_eq!(moved.acceleration, constants.max_acc);

    snapshot.acceleration_command = -1000.0;
    let moved = integrate(&snapshot, 16.0, &constants);
    assert_eq!(moved.acceleration, -constants.max_acc);
}

#[test]
fn test_velocity_is_clamped() {
    let constants = PhysicsConstants::from(&create_test_params());
    let mut snapshot = create_test_snapshot(0, 50.0, 50.0);
    snapshot.velocity = -5.0;
    let moved = integrate(&snapshot, 16.0, &constants);
    assert_eq!(moved.velocity, -constants.max_vel);
}

#[test]
fn test_deceleration_never_reverses_velocity() {
    let constants = PhysicsConstants::from(&create_test_params());
    let mut snapshot = create_test_snapshot(0, 50.0, 50.0);
    snapshot.velocity = 1e-6;
    let moved = integrate(&snapshot, 1000.0, &constants);
    assert!(moved.velocity > 0.0);
    assert!(moved.velocity < 1e-6);

    // just above the deceleration, at most 95% of the speed is lost
    let velocity = 1.65e-4;
    snapshot.velocity = velocity;
    let moved = integrate(&snapshot, 16.0, &constants);
    assert!(moved.deceleration <= velocity * 0.95 + 1e-15);
    assert!(moved.velocity >= velocity * 0.05 - 1e-15);
}

#[test]
fn test_position_wraps_into_world() {
    let constants = PhysicsConstants::from(&create_test_params());
    let mut snapshot = create_test_snapshot(0, 199.99, 99.99);
    snapshot.direction = Array1::from_vec(vec![1.0, 1.0]) / 2.0_f64.sqrt();
    snapshot.velocity = 0.1;
    let moved = integrate(&snapshot, 100.0, &constants);

    assert!((0.0..200.0).contains(&moved.position[0]));
    assert!((0.0..100.0).contains(&moved.position[1]));
    assert!(moved.position[0] < 10.0);
    assert!(moved.position[1] < 10.0);
}

#[test]
fn test_moving_costs_more_than_idling() {
    let constants = PhysicsConstants::from(&create_test_params());
    let idle = integrate(&create_test_snapshot(0, 50.0, 50.0), 16.0, &constants);

    let mut running = create_test_snapshot(0, 50.0, 50.0);
    running.velocity = 0.1;
    let running = integrate(&running, 16.0, &constants);
    assert!(running.energy < idle.energy);

    let mut glowing = create_test_snapshot(0, 50.0, 50.0);
    glowing.light_emission = 150.0;
    let glowing = integrate(&glowing, 16.0, &constants);
    assert!(glowing.energy < idle.energy);
}

#[test]
fn test_pool_matches_sequential_integration() {
    let constants = PhysicsConstants::from(&create_test_params());
    let snapshots: Vec<MovementSnapshot> = (0..97)
        .map(|id| {
            let mut s = create_test_snapshot(id, (id * 2) as f64, (id % 100) as f64);
            s.acceleration_command = (id as f64 / 50.0) - 1.0;
            s.rotation_command = 0.01 * (id % 7) as f64;
            s.velocity = 0.001 * (id % 5) as f64;
            s
        })
        .collect();

    let expected = integrate_all(&snapshots, 16.0, &constants);
    let pool = MovementPool::new(Some(4), 10).unwrap();
    assert_eq!(pool.workers(), 4);
    let batch = pool.run(snapshots, 16.0, &constants);

    assert!(batch.failed.is_empty());
    let mut moved = batch.moved;
    moved.sort_by_key(|s| s.id);
    assert_eq!(moved, expected);
}

#[test]
fn test_pool_handles_empty_batch() {
    let constants = PhysicsConstants::from(&create_test_params());
    let pool = MovementPool::new(Some(2), 10).unwrap();
    let batch = pool.run(Vec::new(), 16.0, &constants);
    assert!(batch.moved.is_empty());
    assert!(batch.failed.is_empty());
}

#[cfg(debug_assertions)]
#[test]
fn test_failed_task_is_isolated() {
    let constants = PhysicsConstants::from(&create_test_params());
    let mut broken = create_test_snapshot(1, 10.0, 10.0);
    broken.size = 0.0;
    let snapshots = vec![create_test_snapshot(0, 10.0, 10.0), broken, create_test_snapshot(2, 20.0, 20.0)];

    let pool = MovementPool::new(Some(2), 1).unwrap();
    let batch = pool.run(snapshots, 16.0, &constants);
    assert_eq!(batch.failed, vec![1]);
    let mut ids: Vec<u64> = batch.moved.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 2]);
}
