//! Creature behavior, state, and lifecycle management.
//!
//! A creature owns its brain, its genome-derived traits and its kinematic
//! state. Movement itself is computed elsewhere from a [`MovementSnapshot`].

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::warn;

use super::brain::{ActionOutputs, ActionThresholds, Brain, Sensors, WorldView};
use super::error::SimulationError;
use super::food::FoodPoint;
use super::locatable::Locatable;
use super::movement::MovementSnapshot;
use super::params::Params;
use super::spatial::VisionCone;

/// Energy level at or below which the deficit is paid with life.
pub const STARVATION_THRESHOLD: f64 = -10.0;

/// A simulated creature driven by a neuron-graph brain.
#[derive(Debug, Clone)]
pub struct Creature {
    /// Unique identifier, never reused.
    pub id: u64,
    /// Lineage depth; 0 for creatures spawned at world initialization.
    pub generation: u32,

    /// Side of the collision square.
    pub size: u32,
    /// Maximum life points.
    pub max_life: f64,
    /// Energy spent to regenerate one life point.
    pub life_regen_cost: f64,
    /// Energy gained per digested food unit.
    pub digestion_efficiency: f64,
    /// Food units digested per energy pass.
    pub digestion_speed: f64,
    /// Maximum distance the creature sees.
    pub vision_distance: f64,
    /// Full opening angle of the vision cone, in degrees.
    pub vision_angle: f64,
    /// Damage dealt to a victim standing right next to the creature. 0 never attacks.
    pub max_damage: f64,

    /// Life points, within `[0, max_life]`.
    pub life: f64,
    /// Stored energy; may go negative.
    pub energy: f64,
    /// Food waiting to be digested.
    pub digesting: f64,

    /// Position on the toroidal plane.
    pub position: Array1<f64>,
    /// Heading (unit vector).
    pub direction: Array1<f64>,
    /// Signed speed along the heading.
    pub velocity: f64,
    /// Acceleration applied during the last move.
    pub acceleration: f64,
    /// Deceleration applied during the last move.
    pub deceleration: f64,

    /// Values written by the action neurons.
    pub outputs: ActionOutputs,

    /// Birth time in seconds.
    pub birth: f64,
    /// Time of the last reproduction (birth until the first one).
    pub last_reproduction: f64,
    /// Time of the last attack dealt.
    pub last_damage_action: Option<f64>,
    /// Time of the last damage received.
    pub last_damage_received: Option<f64>,
    /// Set when the creature lost life since the last energy pass.
    pub hurt: bool,

    /// Neuron graph controlling the creature.
    pub brain: Brain,
}

impl Locatable for Creature {
    fn pos(&self) -> &Array1<f64> {
        &self.position
    }

    fn id(&self) -> u64 {
        self.id
    }
}

/// Samples the gaussian size of a new creature.
pub fn sample_size<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> Result<u32, SimulationError> {
    let normal = Normal::new(params.creature_size_avg, params.creature_size_sigma)
        .map_err(|e| SimulationError::InvalidConfig(format!("creature size distribution: {e}")))?;
    let size = normal.sample(rng).round().max(f64::from(params.min_creature_size));
    Ok(size as u32)
}

/// Random unit vector.
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Array1<f64> {
    let (sin, cos) = (rng.random::<f64>() * std::f64::consts::TAU).sin_cos();
    Array1::from_vec(vec![cos, sin])
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Randomly sampled genome-derived traits.
#[derive(Debug, Clone, PartialEq)]
pub struct Traits {
    /// Side of the collision square.
    pub size: u32,
    /// Maximum life points.
    pub max_life: f64,
    /// Energy spent to regenerate one life point.
    pub life_regen_cost: f64,
    /// Energy gained per digested food unit.
    pub digestion_efficiency: f64,
    /// Food units digested per energy pass.
    pub digestion_speed: f64,
    /// Maximum distance the creature sees.
    pub vision_distance: f64,
    /// Full opening angle of the vision cone, in degrees.
    pub vision_angle: f64,
    /// Damage dealt at point-blank range.
    pub max_damage: f64,
}

impl Traits {
    /// Draws a fresh set of traits.
    pub fn random<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> Result<Self, SimulationError> {
        let size = sample_size(params, rng)?;
        let damage_bound = size.saturating_mul(params.max_damage_per_size);
        Ok(Self {
            size,
            max_life: 10.0 + f64::from(rng.random_range(0..size.saturating_mul(10))),
            life_regen_cost: f64::from(size) * f64::from(rng.random_range(1..=5_u32)) + 1.0,
            digestion_efficiency: round_to(rng.random::<f64>() * 1.8 + 0.2, 2),
            digestion_speed: round_to(rng.random::<f64>() * 4.0 + 0.8, 1),
            vision_distance: (rng.random::<f64>() * 124.0 + 1.0).round(),
            vision_angle: (rng.random::<f64>() * 150.0 + 30.0).round(),
            max_damage: if damage_bound == 0 {
                0.0
            } else {
                f64::from(rng.random_range(0..damage_bound))
            },
        })
    }

    /// Picks every trait from one of the two parents, independently.
    pub fn inherit<R: Rng + ?Sized>(parent1: &Creature, parent2: &Creature, rng: &mut R) -> Self {
        Self {
            size: either(rng, parent1.size, parent2.size),
            max_life: either(rng, parent1.max_life, parent2.max_life),
            life_regen_cost: either(rng, parent1.life_regen_cost, parent2.life_regen_cost),
            digestion_efficiency: either(
                rng,
                parent1.digestion_efficiency,
                parent2.digestion_efficiency,
            ),
            digestion_speed: either(rng, parent1.digestion_speed, parent2.digestion_speed),
            vision_distance: either(rng, parent1.vision_distance, parent2.vision_distance),
            vision_angle: either(rng, parent1.vision_angle, parent2.vision_angle),
            max_damage: either(rng, parent1.max_damage, parent2.max_damage),
        }
    }
}

fn either<T, R: Rng + ?Sized>(rng: &mut R, a: T, b: T) -> T {
    if rng.random_bool(0.5) { a } else { b }
}

impl Creature {
    /// Assembles a creature at full life from its traits and brain.
    #[allow(clippy::too_many_arguments)]
    pub fn from_traits(
        id: u64,
        generation: u32,
        traits: Traits,
        brain: Brain,
        position: Array1<f64>,
        direction: Array1<f64>,
        params: &Params,
        now: f64,
    ) -> Self {
        Self {
            id,
            generation,
            size: traits.size,
            max_life: traits.max_life,
            life_regen_cost: traits.life_regen_cost,
            digestion_efficiency: traits.digestion_efficiency,
            digestion_speed: traits.digestion_speed,
            vision_distance: traits.vision_distance,
            vision_angle: traits.vision_angle,
            max_damage: traits.max_damage,
            life: traits.max_life,
            energy: params.creature_starting_energy,
            digesting: params.creature_min_starting_digesting + f64::from(traits.size),
            position,
            direction,
            velocity: 0.0,
            acceleration: 0.0,
            deceleration: 0.0,
            outputs: ActionOutputs::default(),
            birth: now,
            last_reproduction: now,
            last_damage_action: None,
            last_damage_received: None,
            hurt: false,
            brain,
        }
    }

    /// Creates a first-generation creature with random traits, brain and position.
    pub fn new_random<R: Rng + ?Sized>(
        id: u64,
        params: &Params,
        rng: &mut R,
        now: f64,
    ) -> Result<Self, SimulationError> {
        let traits = Traits::random(params, rng)?;
        let connections = rng.random_range(params.min_connections..=params.max_connections);
        let hidden = if params.max_hidden_neurons == 0 {
            0
        } else {
            rng.random_range(0..params.max_hidden_neurons)
        };
        let brain = Brain::generate(connections, hidden, rng)?;
        let position = Array1::from_vec(vec![
            rng.random_range(0.0..params.width),
            rng.random_range(0.0..params.height),
        ]);
        let direction = random_direction(rng);
        Ok(Self::from_traits(
            id, 0, traits, brain, position, direction, params, now,
        ))
    }

    /// Checks whether the creature has no life left.
    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    /// Digests food, then pays starvation with life or buys back one life point.
    pub fn update_energy(&mut self) {
        let points = self.digesting.min(self.digestion_speed);
        if points > 0.0 {
            self.digesting = round_to(self.digesting - points, 5);
            self.energy += points * self.digestion_efficiency;
        }

        if self.energy <= STARVATION_THRESHOLD {
            self.life += (self.energy / 10.0).round();
            self.energy = 0.0;
            self.hurt = true;
        } else if self.energy >= self.life_regen_cost && self.life < self.max_life {
            self.energy -= self.life_regen_cost;
            self.life += 1.0;
        }
        self.enforce_life_bounds();
    }

    /// Moves the food quantity into the stomach.
    pub fn eat(&mut self, food: &FoodPoint) {
        self.digesting += f64::from(food.quantity);
    }

    /// Checks whether the stomach holds `capacity_per_size × size` or more.
    pub fn is_full(&self, capacity_per_size: f64) -> bool {
        self.digesting >= capacity_per_size * f64::from(self.size)
    }

    /// Removes life points.
    pub fn receive_damages(&mut self, points: f64) {
        self.life -= points;
        self.hurt = true;
        self.enforce_life_bounds();
    }

    /// Ready to reproduce and out of the reproduction cooldown.
    pub fn can_repro(&self, now: f64, cooldown: f64) -> bool {
        self.outputs.ready_for_reproduction && now - self.last_reproduction >= cooldown
    }

    /// Able and ready to attack, and out of the attack cooldown.
    pub fn can_attack(&self, now: f64, cooldown: f64) -> bool {
        self.max_damage > 0.0
            && self.outputs.ready_to_kill
            && self
                .last_damage_action
                .is_none_or(|last| now - last >= cooldown)
    }

    /// Side of the collision square.
    pub fn rect_side(&self) -> f64 {
        f64::from(self.size)
    }

    /// Field of view of the creature.
    pub fn vision_cone(&self) -> VisionCone {
        VisionCone {
            origin: self.position.clone(),
            direction: self.direction.clone(),
            distance: self.vision_distance,
            angle: self.vision_angle,
        }
    }

    /// Gathers everything the input neurons read.
    pub fn sensors(&self, world: &impl WorldView) -> Sensors {
        Sensors {
            x: self.position[0],
            y: self.position[1],
            energy: self.energy,
            digesting: self.digesting,
            velocity: self.velocity,
            life_fraction: if self.max_life > 0.0 {
                self.life / self.max_life
            } else {
                0.0
            },
            light: world.light_level(self.id, &self.position),
            food_distance: world.food_distance(&self.vision_cone()),
            vision_distance: self.vision_distance,
            now: world.now(),
            birth: self.birth,
        }
    }

    /// Runs one brain step: sense, propagate, act.
    pub fn think(&mut self, sensors: &Sensors, thresholds: &ActionThresholds) {
        self.brain.update_input(sensors);
        self.brain.tick();
        self.brain.act(&mut self.outputs, thresholds);
    }

    /// Owned copy of the fields the movement integrator works on.
    pub fn snapshot(&self) -> MovementSnapshot {
        MovementSnapshot {
            id: self.id,
            size: f64::from(self.size),
            acceleration_command: self.outputs.acceleration,
            rotation_command: self.outputs.rotation,
            light_emission: self.outputs.light_emission,
            position: self.position.clone(),
            direction: self.direction.clone(),
            acceleration: self.acceleration,
            velocity: self.velocity,
            deceleration: self.deceleration,
            energy: self.energy,
        }
    }

    /// Writes an integrated snapshot back. Only kinematics and energy change.
    pub fn apply(&mut self, snapshot: MovementSnapshot) {
        debug_assert_eq!(snapshot.id, self.id);
        self.position = snapshot.position;
        self.direction = snapshot.direction;
        self.acceleration = snapshot.acceleration;
        self.velocity = snapshot.velocity;
        self.deceleration = snapshot.deceleration;
        self.energy = snapshot.energy;
    }

    /// RGB colour encoding max life and brain size.
    pub fn color(&self, max_connections: usize) -> [u8; 3] {
        let life = (255.0 * self.max_life / 130.0).min(255.0);
        let neurons = (255.0 * self.brain.neurons_count() as f64 / (max_connections as f64 + 5.0))
            .min(255.0);
        [life as u8, neurons as u8, 255]
    }

    fn enforce_life_bounds(&mut self) {
        if (0.0..=self.max_life).contains(&self.life) {
            return;
        }
        // starvation and damage may overshoot below zero
        if self.life < 0.0 {
            self.life = 0.0;
            return;
        }
        debug_assert!(
            self.life <= self.max_life,
            "creature {} life {} above max {}",
            self.id,
            self.life,
            self.max_life
        );
        warn!(
            creature_id = self.id,
            life = self.life,
            max_life = self.max_life,
            "life out of bounds, clamping"
        );
        self.life = self.life.clamp(0.0, self.max_life);
    }
}
