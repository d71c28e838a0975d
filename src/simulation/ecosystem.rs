//! Main ecosystem simulation with a parallel movement phase.
//!
//! The ecosystem owns the population, the food supply and both spatial grids.
//! One [`Ecosystem::step`] runs, in order:
//! - sensing and brain evaluation for every creature
//! - movement of every creature on the worker pool, merged back by id
//! - a rebuild of the creature grid
//! - eating, reproduction and combat, single-threaded
//!
//! Energy bookkeeping and food generation are periodic side inputs, run by
//! [`Scheduler`](super::schedule::Scheduler) rather than by `step`.

use std::collections::BTreeMap;
use std::time::Instant;

use ndarray::Array1;
use tracing::{debug, info, warn};

use super::brain::{ActionThresholds, WorldView};
use super::combat;
use super::creature::Creature;
use super::error::SimulationError;
use super::events::{DeathCause, EventQueue, SimulationEvent};
use super::food::{FoodGenerator, FoodPoint};
use super::geometric_utils::{squares_collide, toroidal_distance, wrap_around_mut};
use super::movement::{MovementPool, PhysicsConstants};
use super::params::Params;
use super::reproduction;
use super::rng::{SimRng, rng_from_seed};
use super::spatial::{CreatureLocation, SpatialGrid, VisionCone};
use super::telemetry::{BrainGraph, CreatureTelemetry, FoodTelemetry, WorldStats};

/// Brain generations tried before giving up on an initial creature.
const SPAWN_ATTEMPTS: usize = 10;

/// The world: creatures, food, grids and the movement pool.
#[derive(Debug)]
pub struct Ecosystem {
    params: Params,
    creatures: BTreeMap<u64, Creature>,
    creature_grid: SpatialGrid<CreatureLocation>,
    food_grid: SpatialGrid<FoodPoint>,
    food_generators: Vec<FoodGenerator>,
    pool: MovementPool,
    physics: PhysicsConstants,
    thresholds: ActionThresholds,
    rng: SimRng,
    events: EventQueue,
    time: f64,
    next_creature_id: u64,
    next_food_id: u64,
    total_births: u64,
    total_deaths: u64,
}

impl Ecosystem {
    /// Creates a world with `initial_creatures_count` random creatures and no food.
    ///
    /// Invalid parameters are the only error surfaced here.
    pub fn new(params: Params) -> Result<Self, SimulationError> {
        params.validate()?;
        let mut rng = rng_from_seed(params.seed);
        let creature_grid = SpatialGrid::new(params.width, params.height, params.cell_size)?;
        let food_grid = SpatialGrid::new(params.width, params.height, params.cell_size)?;
        let pool = MovementPool::new(params.workers, params.worker_chunk_size)?;
        let food_generators = params
            .food_generators
            .iter()
            .map(|g| FoodGenerator::from_params(g, params.width, params.height, &mut rng))
            .collect();

        let mut ecosystem = Self {
            physics: PhysicsConstants::from(&params),
            thresholds: ActionThresholds {
                max_light_distance_emission: params.max_light_distance_emission,
                min_reproduction_state: params.min_reproduction_state,
                min_attack_state: params.min_attack_state,
            },
            params,
            creatures: BTreeMap::new(),
            creature_grid,
            food_grid,
            food_generators,
            pool,
            rng,
            events: EventQueue::new(),
            time: 0.0,
            next_creature_id: 0,
            next_food_id: 0,
            total_births: 0,
            total_deaths: 0,
        };

        for _ in 0..ecosystem.params.initial_creatures_count {
            ecosystem.spawn_random_creature();
        }
        ecosystem.reindex_creatures();
        info!(
            creatures = ecosystem.creatures.len(),
            workers = ecosystem.pool.workers(),
            "ecosystem created"
        );
        Ok(ecosystem)
    }

    fn spawn_random_creature(&mut self) -> Option<u64> {
        for attempt in 1..=SPAWN_ATTEMPTS {
            let id = self.next_creature_id;
            match Creature::new_random(id, &self.params, &mut self.rng, self.time) {
                Ok(creature) => {
                    self.next_creature_id += 1;
                    self.creatures.insert(id, creature);
                    return Some(id);
                }
                Err(e) => debug!(attempt, error = %e, "creature generation failed"),
            }
        }
        warn!("giving up on a creature after {SPAWN_ATTEMPTS} failed generations");
        None
    }

    /// Adds a creature under a fresh id and returns that id.
    ///
    /// Returns `None` when the population is already at its cap.
    pub fn add_creature(&mut self, mut creature: Creature) -> Option<u64> {
        if self.creatures.len() >= self.params.max_creatures_count {
            return None;
        }
        let id = self.next_creature_id;
        self.next_creature_id += 1;
        creature.id = id;
        wrap_around_mut(&mut creature.position, self.params.width, self.params.height);
        self.creature_grid.insert(CreatureLocation {
            id,
            position: creature.position.clone(),
        });
        self.creatures.insert(id, creature);
        Some(id)
    }

    /// Drops a food point on the ground and returns its id.
    pub fn add_food(&mut self, mut position: Array1<f64>, quantity: u32) -> u64 {
        let id = self.next_food_id;
        self.next_food_id += 1;
        wrap_around_mut(&mut position, self.params.width, self.params.height);
        self.food_grid.insert(FoodPoint::new(id, position, quantity));
        id
    }

    /// Simulation parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Living creatures, by increasing id.
    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    /// Looks a creature up. A creature removed earlier is simply absent.
    pub fn creature(&self, id: u64) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    /// Mutable access to a creature. Position changes show in the grid after the next rebuild.
    pub fn creature_mut(&mut self, id: u64) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    /// Number of living creatures.
    pub fn population(&self) -> usize {
        self.creatures.len()
    }

    /// Food points on the ground.
    pub fn food(&self) -> impl Iterator<Item = &FoodPoint> {
        self.food_grid.iter()
    }

    /// Number of food points on the ground.
    pub fn food_count(&self) -> usize {
        self.food_grid.len()
    }

    /// Grid indexing creature positions.
    pub fn creature_grid(&self) -> &SpatialGrid<CreatureLocation> {
        &self.creature_grid
    }

    /// Grid holding the food points.
    pub fn food_grid(&self) -> &SpatialGrid<FoodPoint> {
        &self.food_grid
    }

    /// Number of movement workers.
    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Rebuilds the creature grid from the current positions.
    pub fn reindex_creatures(&mut self) {
        self.creature_grid
            .rebuild(self.creatures.values().map(|c| CreatureLocation {
                id: c.id,
                position: c.position.clone(),
            }));
    }

    /// Advances the world by `elapsed_ms` milliseconds and returns what happened.
    pub fn step(&mut self, elapsed_ms: f64) -> Vec<SimulationEvent> {
        let started = Instant::now();
        self.time += elapsed_ms / 1000.0;
        self.reindex_creatures();

        // sense everything before any creature acts
        let world: &Self = self;
        let sensors: Vec<_> = world
            .creatures
            .values()
            .map(|creature| (creature.id, creature.sensors(world)))
            .collect();
        let mut snapshots = Vec::with_capacity(sensors.len());
        for (id, sensors) in &sensors {
            if let Some(creature) = self.creatures.get_mut(id) {
                creature.think(sensors, &self.thresholds);
                snapshots.push(creature.snapshot());
            }
        }
        let thought = started.elapsed();

        let batch = self.pool.run(snapshots, elapsed_ms, &self.physics);
        for moved in batch.moved {
            if let Some(creature) = self.creatures.get_mut(&moved.id) {
                creature.apply(moved);
            }
        }
        for creature_id in batch.failed {
            self.events
                .push(SimulationEvent::WorkerTaskFailure { creature_id });
        }
        let moved = started.elapsed();

        self.reindex_creatures();

        let ids: Vec<u64> = self.creatures.keys().copied().collect();
        for id in ids {
            self.detect_creature_eating(id);
        }

        let born = reproduction::reproduce_creatures(
            &mut self.creatures,
            &mut self.next_creature_id,
            &self.params,
            self.time,
            &mut self.rng,
            &mut self.events,
        );
        self.total_births += born.len() as u64;
        for id in &born {
            if let Some(child) = self.creatures.get(id) {
                self.creature_grid.insert(CreatureLocation {
                    id: child.id,
                    position: child.position.clone(),
                });
            }
        }

        let killed = combat::attack_creatures(
            &mut self.creatures,
            &mut self.creature_grid,
            &self.params,
            self.time,
            &mut self.events,
        );
        self.total_deaths += killed.len() as u64;

        debug!(
            population = self.creatures.len(),
            food = self.food_grid.len(),
            think = ?thought,
            movement = ?(moved - thought),
            total = ?started.elapsed(),
            "step"
        );
        self.events.drain().collect()
    }

    /// Lets a creature eat every colliding food point in its 3×3 cell neighborhood.
    ///
    /// Stops as soon as the stomach is full. Returns the number of food points eaten.
    pub fn detect_creature_eating(&mut self, creature_id: u64) -> usize {
        let Some(creature) = self.creatures.get(&creature_id) else {
            return 0;
        };
        let position = creature.position.clone();
        let side = creature.rect_side();
        let capacity = self.params.stomach_capacity_per_size;
        let mut eaten = 0;

        for cell in self.food_grid.neighborhood(&position) {
            let colliding: Vec<u64> = self
                .food_grid
                .cell(cell)
                .iter()
                .filter(|food| squares_collide(&position, side, &food.position, food.rect_side()))
                .map(|food| food.id)
                .collect();
            for food_id in colliding {
                let Some(creature) = self.creatures.get_mut(&creature_id) else {
                    return eaten;
                };
                if creature.is_full(capacity) {
                    return eaten;
                }
                if let Some(food) = self.food_grid.take(cell, food_id) {
                    creature.eat(&food);
                    self.events.push(SimulationEvent::FoodEaten {
                        creature_id,
                        food_id,
                        quantity: food.quantity,
                    });
                    eaten += 1;
                }
            }
        }
        eaten
    }

    /// Energy and life bookkeeping for every creature; starved creatures are removed.
    pub fn update_creatures_energies(&mut self) -> Vec<SimulationEvent> {
        let mut dead = Vec::new();
        for creature in self.creatures.values_mut() {
            creature.hurt = false;
            creature.update_energy();
            if creature.is_dead() {
                dead.push(creature.id);
            }
        }

        let mut events = Vec::with_capacity(dead.len());
        for &creature_id in &dead {
            self.creatures.remove(&creature_id);
            events.push(SimulationEvent::CreatureDied {
                creature_id,
                cause: DeathCause::Starvation,
            });
        }
        if !dead.is_empty() {
            info!("{} creature(s) died", dead.len());
            self.total_deaths += dead.len() as u64;
            self.reindex_creatures();
        }
        events
    }

    /// Seeds the world: `initial_food_quantity` ticks of every generator.
    pub fn generate_initial_food(&mut self) -> usize {
        self.run_food_generators(self.params.initial_food_quantity)
    }

    /// Periodic food: `max_food_generated_per_cycle` ticks of every generator.
    pub fn generate_food(&mut self) -> usize {
        self.run_food_generators(self.params.max_food_generated_per_cycle)
    }

    fn run_food_generators(&mut self, ticks: usize) -> usize {
        let (width, height) = (self.params.width, self.params.height);
        let mut count = self.food_grid.len();
        let mut spawned = 0;
        for generator in &self.food_generators {
            for _ in 0..ticks {
                if count >= self.params.max_food_count {
                    return spawned;
                }
                if let Some(food) = generator.tick(self.next_food_id, width, height, &mut self.rng)
                {
                    self.next_food_id += 1;
                    self.food_grid.insert(food);
                    count += 1;
                    spawned += 1;
                }
            }
        }
        spawned
    }

    /// Nearest creature whose centre lies closer than its size plus the selection tolerance.
    pub fn creature_at(&self, point: &Array1<f64>) -> Option<u64> {
        self.creatures
            .values()
            .map(|c| {
                let distance = toroidal_distance(
                    point,
                    &c.position,
                    self.params.width,
                    self.params.height,
                );
                (c, distance)
            })
            .filter(|(c, distance)| *distance < self.params.selection_tolerance + c.rect_side())
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c.id)
    }

    /// Renderer view of every creature.
    pub fn creature_telemetry(&self) -> Vec<CreatureTelemetry> {
        self.creatures
            .values()
            .map(|c| CreatureTelemetry::from_creature(c, self.params.max_connections))
            .collect()
    }

    /// Renderer view of every food point.
    pub fn food_telemetry(&self) -> Vec<FoodTelemetry> {
        self.food_grid.iter().map(FoodTelemetry::from).collect()
    }

    /// Neurons and wires of a creature's brain.
    pub fn brain_graph(&self, creature_id: u64) -> Option<BrainGraph> {
        self.creatures
            .get(&creature_id)
            .map(|c| BrainGraph::from(&c.brain))
    }

    /// Population-wide figures.
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            time: self.time,
            food_count: self.food_grid.len(),
            total_births: self.total_births,
            total_deaths: self.total_deaths,
            ..WorldStats::collect(self.creatures.values())
        }
    }

    /// Audits the population for logic defects.
    pub fn check_invariants(&self) -> Result<(), SimulationError> {
        let violation = |msg: String| Err(SimulationError::InvariantViolation(msg));
        let (width, height) = (self.params.width, self.params.height);

        if self.creatures.len() > self.params.max_creatures_count {
            return violation(format!(
                "population {} above cap {}",
                self.creatures.len(),
                self.params.max_creatures_count
            ));
        }
        for (&id, creature) in &self.creatures {
            if id != creature.id {
                return violation(format!("creature {} stored under id {id}", creature.id));
            }
            if !(0.0..=creature.max_life).contains(&creature.life) {
                return violation(format!(
                    "creature {id} life {} outside [0, {}]",
                    creature.life, creature.max_life
                ));
            }
            if creature.is_dead() {
                return violation(format!("dead creature {id} still alive"));
            }
            let [x, y] = [creature.position[0], creature.position[1]];
            if !((0.0..width).contains(&x) && (0.0..height).contains(&y)) {
                return violation(format!("creature {id} outside the world at ({x}, {y})"));
            }
            if creature.brain.has_duplicate_wires() {
                return violation(format!("creature {id} has duplicate wires"));
            }
        }
        if let Some(&last) = self.creatures.keys().next_back() {
            if last >= self.next_creature_id {
                return violation(format!("creature id {last} was never handed out"));
            }
        }
        Ok(())
    }
}

impl WorldView for Ecosystem {
    fn now(&self) -> f64 {
        self.time
    }

    /// Σ `emission − distance` over other creatures whose light reaches `position`.
    fn light_level(&self, observer: u64, position: &Array1<f64>) -> f64 {
        self.creature_grid
            .within_radius(position, self.params.max_light_distance_emission)
            .into_iter()
            .filter(|(location, _)| location.id != observer)
            .filter_map(|(location, distance)| {
                let emission = self.creatures.get(&location.id)?.outputs.light_emission;
                (emission > 0.0 && distance < emission).then_some(emission - distance)
            })
            .sum()
    }

    fn food_distance(&self, cone: &VisionCone) -> Option<f64> {
        self.food_grid
            .query_closest(cone, None)
            .map(|(_, distance)| distance)
    }
}
