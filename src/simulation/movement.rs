//! Creature movement: a pure integrator and the worker pool running it.
//!
//! The integrator only sees an owned [`MovementSnapshot`] and returns a new
//! one, so the pool never touches the population itself. Results come back
//! over a channel in completion order and are merged by creature id.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

use ndarray::Array1;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

use super::error::SimulationError;
use super::geometric_utils::{euclidean_distance, rotate_degrees, sign, wrap_around_mut};
use super::params::Params;

/// Displacements at or below this length cost no movement energy.
const MIN_MOVE_DISTANCE: f64 = 1e-5;
/// Share of the commanded acceleration (or current velocity) friction may cancel.
const MAX_OPPOSING_SHARE: f64 = 0.95;

/// Kinematic state of one creature, detached from the population.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementSnapshot {
    /// Creature the snapshot belongs to.
    pub id: u64,
    /// Creature size.
    pub size: f64,
    /// Acceleration requested by the brain.
    pub acceleration_command: f64,
    /// Rotation requested by the brain, in degrees per millisecond.
    pub rotation_command: f64,
    /// Emitted light radius.
    pub light_emission: f64,
    /// Position on the toroidal plane.
    pub position: Array1<f64>,
    /// Heading (unit vector).
    pub direction: Array1<f64>,
    /// Effective acceleration.
    pub acceleration: f64,
    /// Signed speed along the heading.
    pub velocity: f64,
    /// Deceleration applied during the last move.
    pub deceleration: f64,
    /// Stored energy.
    pub energy: f64,
}

/// World constants read by the integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConstants {
    /// World width.
    pub width: f64,
    /// World height.
    pub height: f64,
    /// Friction coefficient.
    pub friction: f64,
    /// Acceleration bound.
    pub max_acc: f64,
    /// Velocity bound.
    pub max_vel: f64,
    /// Velocity decrease per millisecond.
    pub deceleration: f64,
    /// Idle energy cost per second, before the size factor.
    pub still_energy: f64,
    /// Divisor of the movement energy cost.
    pub move_energy_divisor: f64,
    /// Divisor of the light energy cost.
    pub light_energy_divisor: f64,
}

impl From<&Params> for PhysicsConstants {
    fn from(params: &Params) -> Self {
        Self {
            width: params.width,
            height: params.height,
            friction: params.friction,
            max_acc: params.max_creature_acc,
            max_vel: params.max_creature_vel,
            deceleration: params.creature_deceleration,
            still_energy: params.creature_still_energy,
            move_energy_divisor: params.move_energy_divisor,
            light_energy_divisor: params.light_energy_divisor,
        }
    }
}

/// Moves one creature by `elapsed_ms` milliseconds.
pub fn integrate(
    snapshot: &MovementSnapshot,
    elapsed_ms: f64,
    constants: &PhysicsConstants,
) -> MovementSnapshot {
    debug_assert!(snapshot.size > 0.0, "creature {} has no size", snapshot.id);
    let mut next = snapshot.clone();

    // acceleration, friction never flips the commanded sign
    let command = snapshot.acceleration_command;
    let mut friction = constants.friction * snapshot.size.sqrt() * sign(command);
    if friction.abs() > command.abs() * MAX_OPPOSING_SHARE {
        friction = command * MAX_OPPOSING_SHARE;
    }
    next.acceleration = (command - friction) / snapshot.size;
    if next.acceleration.abs() > constants.max_acc {
        next.acceleration = constants.max_acc * sign(next.acceleration);
    }

    // velocity
    next.velocity += next.acceleration / 100.0 * elapsed_ms;
    next.deceleration = constants.deceleration * sign(next.velocity) * elapsed_ms;
    if next.deceleration.abs() > next.velocity.abs() * MAX_OPPOSING_SHARE {
        next.deceleration = next.velocity * MAX_OPPOSING_SHARE;
    }
    next.velocity -= next.deceleration;
    if next.velocity.abs() > constants.max_vel {
        next.velocity = constants.max_vel * sign(next.velocity);
    }

    next.direction = rotate_degrees(&snapshot.direction, snapshot.rotation_command * elapsed_ms);

    let mut position = &snapshot.position + &(&next.direction * (0.5 * next.velocity * elapsed_ms));

    // energy
    let distance = euclidean_distance(&position, &snapshot.position);
    next.energy -= constants.still_energy * snapshot.size.powf(0.7) * elapsed_ms / 1000.0;
    if distance > MIN_MOVE_DISTANCE && elapsed_ms > 0.0 {
        next.energy -= distance.powf(1.3) * snapshot.size.powf(1.1)
            / (constants.move_energy_divisor * elapsed_ms);
    }
    let light_points = snapshot.light_emission * elapsed_ms / 1000.0;
    if light_points > 0.0 {
        next.energy -= light_points / constants.light_energy_divisor;
    }

    wrap_around_mut(&mut position, constants.width, constants.height);
    next.position = position;
    next
}

/// Integrates every snapshot on the calling thread.
pub fn integrate_all(
    snapshots: &[MovementSnapshot],
    elapsed_ms: f64,
    constants: &PhysicsConstants,
) -> Vec<MovementSnapshot> {
    snapshots
        .iter()
        .map(|snapshot| integrate(snapshot, elapsed_ms, constants))
        .collect()
}

/// Outcome of one parallel movement phase.
#[derive(Debug, Default)]
pub struct MovementBatch {
    /// Integrated snapshots, in completion order.
    pub moved: Vec<MovementSnapshot>,
    /// Creatures whose integration panicked; they keep their pre-tick state.
    pub failed: Vec<u64>,
}

/// Fixed-size worker pool running the integrator.
pub struct MovementPool {
    pool: ThreadPool,
    chunk_size: usize,
}

impl std::fmt::Debug for MovementPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementPool")
            .field("workers", &self.pool.current_num_threads())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl MovementPool {
    /// Starts `workers` threads, or one per available core when `None`.
    pub fn new(workers: Option<usize>, chunk_size: usize) -> Result<Self, SimulationError> {
        if workers == Some(0) || chunk_size == 0 {
            return Err(SimulationError::InvalidConfig(
                "movement pool needs at least one worker and a positive chunk size".to_string(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.unwrap_or(0))
            .thread_name(|i| format!("movement-worker-{i}"))
            .build()
            .map_err(|e| SimulationError::InvalidConfig(format!("movement pool: {e}")))?;
        Ok(Self { pool, chunk_size })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Integrates every snapshot on the pool and waits for all of them.
    ///
    /// Snapshots are handed out by value in chunks; a panicking integration
    /// only loses its own creature.
    pub fn run(
        &self,
        snapshots: Vec<MovementSnapshot>,
        elapsed_ms: f64,
        constants: &PhysicsConstants,
    ) -> MovementBatch {
        let constants = *constants;
        let (tx, rx) = mpsc::channel();

        self.pool.scope(|scope| {
            let mut remaining = snapshots.into_iter().peekable();
            while remaining.peek().is_some() {
                let chunk: Vec<MovementSnapshot> = remaining.by_ref().take(self.chunk_size).collect();
                let tx = tx.clone();
                scope.spawn(move |_| {
                    for snapshot in chunk {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                            integrate(&snapshot, elapsed_ms, &constants)
                        }))
                        .map_err(|_| snapshot.id);
                        // the receiver outlives the scope
                        let _ = tx.send(outcome);
                    }
                });
            }
        });
        drop(tx);

        let mut batch = MovementBatch::default();
        for outcome in rx {
            match outcome {
                Ok(moved) => batch.moved.push(moved),
                Err(creature_id) => {
                    let error = SimulationError::WorkerTaskFailure { creature_id };
                    warn!(%error, "keeping pre-tick state");
                    batch.failed.push(creature_id);
                }
            }
        }
        batch
    }
}
