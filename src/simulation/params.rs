use std::path::Path;

use serde::{Deserialize, Serialize};

use super::brain::wiring_capacity;
use super::error::SimulationError;
use super::spatial::tiles_evenly;

/// Placement and yield of one food source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodGeneratorParams {
    /// Centre of the spawning disc. `None` places the generator at a random position.
    pub center: Option<[f64; 2]>,
    /// Radius of the spawning disc.
    pub radius: f64,
    /// Probability of spawning a food point on each generator tick.
    pub spawn_probability: f64,
}

/// Simulation parameters that control world behavior.
///
/// All values are final and resolved; the engine never parses anything beyond
/// deserializing this structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// World width.
    pub width: f64,
    /// World height.
    pub height: f64,
    /// Edge length of a spatial grid cell.
    pub cell_size: f64,
    /// Target frames per second of the external scheduler.
    pub fps: u32,
    /// Multiplier applied to real frame time to obtain simulated time.
    pub game_speed: f64,

    /// Friction coefficient used in the acceleration computation.
    pub friction: f64,
    /// Maximum creature acceleration.
    pub max_creature_acc: f64,
    /// Maximum creature velocity.
    pub max_creature_vel: f64,
    /// Velocity decrease per millisecond.
    pub creature_deceleration: f64,
    /// Energy lost by an idle creature each second (scaled by `size^0.7`).
    pub creature_still_energy: f64,
    /// Divisor of the movement energy cost.
    pub move_energy_divisor: f64,
    /// Divisor of the light emission energy cost.
    pub light_energy_divisor: f64,

    /// Creatures spawned at world initialization.
    pub initial_creatures_count: usize,
    /// Population hard cap.
    pub max_creatures_count: usize,
    /// Energy each creature has at the beginning.
    pub creature_starting_energy: f64,
    /// Minimum food ready to be digested at the beginning (size is added on top).
    pub creature_min_starting_digesting: f64,
    /// Minimum creature size.
    pub min_creature_size: u32,
    /// Mean of the gaussian creature size.
    pub creature_size_avg: f64,
    /// Standard deviation of the gaussian creature size.
    pub creature_size_sigma: f64,
    /// Maximum food held in the stomach, per unit of size.
    pub stomach_capacity_per_size: f64,
    /// Upper bound (exclusive) of the random max damage, per unit of size.
    pub max_damage_per_size: u32,

    /// Minimum wires in a generated brain.
    pub min_connections: usize,
    /// Maximum wires in a generated brain.
    pub max_connections: usize,
    /// Maximum hidden neurons in a generated brain.
    pub max_hidden_neurons: usize,

    /// Maximum radius of emitted light.
    pub max_light_distance_emission: f64,
    /// Minimum neuron value for a creature to be ready to reproduce.
    pub min_reproduction_state: f64,
    /// Minimum neuron value for a creature to be ready to attack.
    pub min_attack_state: f64,
    /// Minimum time in seconds between two reproductions of the same creature.
    pub reproduction_cooldown: f64,
    /// Minimum time in seconds between two attacks of the same creature.
    pub attack_cooldown: f64,
    /// Energy paid by each parent, multiplied by `child.size^0.7`.
    pub reproduction_energy_factor: f64,
    /// Share of the paid energy given to the child.
    pub child_initial_energy_percent: f64,
    /// Share of `max_life` a child is born with.
    pub child_initial_life_percent: f64,
    /// Maximum children created by one reproduction pass.
    pub max_children_per_pass: usize,
    /// Maximum attacks resolved by one combat pass.
    pub max_attacks_per_pass: usize,

    /// Generator ticks at world initialization, per generator.
    pub initial_food_quantity: usize,
    /// Generator ticks per food cycle, per generator.
    pub max_food_generated_per_cycle: usize,
    /// Food points hard cap.
    pub max_food_count: usize,
    /// Food sources.
    pub food_generators: Vec<FoodGeneratorParams>,

    /// Interval of the energy and life bookkeeping pass.
    pub energy_interval_ms: u64,
    /// Interval of the food generation pass.
    pub food_interval_ms: u64,

    /// Pixel tolerance added to a creature's size when selecting it by click.
    pub selection_tolerance: f64,

    /// Movement worker threads. `None` uses one worker per available core.
    pub workers: Option<usize>,
    /// Snapshots handed to a worker per task.
    pub worker_chunk_size: usize,
    /// Seed of the simulation RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            cell_size: 50.0,
            fps: 60,
            game_speed: 1.0,
            friction: 0.2,
            max_creature_acc: 0.0001,
            max_creature_vel: 0.1,
            creature_deceleration: 1e-5,
            creature_still_energy: 0.15,
            move_energy_divisor: 4.0,
            light_energy_divisor: 700.0,
            initial_creatures_count: 200,
            max_creatures_count: 400,
            creature_starting_energy: 30.0,
            creature_min_starting_digesting: 6.0,
            min_creature_size: 1,
            creature_size_avg: 4.0,
            creature_size_sigma: 3.0,
            stomach_capacity_per_size: 30.0,
            max_damage_per_size: 3,
            min_connections: 2,
            max_connections: 10,
            max_hidden_neurons: 20,
            max_light_distance_emission: 200.0,
            min_reproduction_state: 0.2,
            min_attack_state: 0.5,
            reproduction_cooldown: 15.0,
            attack_cooldown: 5.0,
            reproduction_energy_factor: 5.0,
            child_initial_energy_percent: 0.3,
            child_initial_life_percent: 0.7,
            max_children_per_pass: 20,
            max_attacks_per_pass: 50,
            initial_food_quantity: 20,
            max_food_generated_per_cycle: 5,
            max_food_count: 2000,
            food_generators: vec![
                FoodGeneratorParams {
                    center: None,
                    radius: 160.0,
                    spawn_probability: 0.8,
                },
                FoodGeneratorParams {
                    center: None,
                    radius: 80.0,
                    spawn_probability: 0.5,
                },
                FoodGeneratorParams {
                    center: None,
                    radius: 40.0,
                    spawn_probability: 0.3,
                },
            ],
            energy_interval_ms: 1000,
            food_interval_ms: 1000,
            selection_tolerance: 5.0,
            workers: None,
            worker_chunk_size: 40,
            seed: None,
        }
    }
}

impl Params {
    /// Parses parameters from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| SimulationError::InvalidConfig(format!("malformed parameters: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    /// Loads parameters from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SimulationError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Checks that the parameters describe a usable world.
    pub fn validate(&self) -> Result<(), SimulationError> {
        fn invalid(msg: &str) -> Result<(), SimulationError> {
            Err(SimulationError::InvalidConfig(msg.to_string()))
        }

        if !(self.width.is_finite() && self.width > 0.0) {
            return invalid("width must be positive");
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return invalid("height must be positive");
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return invalid("cell_size must be positive");
        }
        let tiled = tiles_evenly(self.width, self.cell_size) && tiles_evenly(self.height, self.cell_size);
        if !tiled {
            return invalid("width and height must be multiples of cell_size");
        }
        if self.fps == 0 {
            return invalid("fps must be positive");
        }
        if self.min_connections > self.max_connections {
            return invalid("min_connections must not exceed max_connections");
        }
        // a brain may be drawn without hidden neurons, which bounds its wiring
        if self.max_connections > wiring_capacity(0) {
            return invalid("max_connections exceeds what a brain without hidden neurons can hold");
        }
        if self.min_creature_size == 0 {
            return invalid("min_creature_size must be at least 1");
        }
        if self.creature_size_sigma < 0.0 {
            return invalid("creature_size_sigma must not be negative");
        }
        if self.initial_creatures_count > self.max_creatures_count {
            return invalid("initial_creatures_count exceeds max_creatures_count");
        }
        if self.workers == Some(0) {
            return invalid("workers must be at least 1");
        }
        if self.worker_chunk_size == 0 {
            return invalid("worker_chunk_size must be at least 1");
        }
        if self.energy_interval_ms == 0 || self.food_interval_ms == 0 {
            return invalid("timer intervals must be positive");
        }
        for generator in &self.food_generators {
            if !(0.0..=1.0).contains(&generator.spawn_probability) {
                return invalid("food generator spawn_probability must be within [0, 1]");
            }
            if generator.radius < 0.0 {
                return invalid("food generator radius must not be negative");
            }
        }
        Ok(())
    }

    /// Simulated milliseconds covered by one frame.
    pub fn frame_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps) * self.game_speed
    }
}
