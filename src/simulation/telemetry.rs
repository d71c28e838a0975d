//! Read-only views handed to renderers and metric collectors.

use serde::Serialize;

use super::brain::{Brain, NeuronKind};
use super::creature::Creature;
use super::food::FoodPoint;

/// What a renderer needs to draw one creature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatureTelemetry {
    /// Creature ID.
    pub id: u64,
    /// Position.
    pub position: [f64; 2],
    /// Heading (unit vector).
    pub direction: [f64; 2],
    /// Absolute velocity.
    pub speed: f64,
    /// Life points.
    pub life: f64,
    /// Maximum life points.
    pub max_life: f64,
    /// Stored energy.
    pub energy: f64,
    /// Lineage depth.
    pub generation: u32,
    /// Side of the collision square.
    pub size: u32,
    /// Colour derived from max life and brain size.
    pub color: [u8; 3],
    /// Vision distance.
    pub vision_distance: f64,
    /// Vision opening angle in degrees.
    pub vision_angle: f64,
    /// Emitted light radius.
    pub light_emission: f64,
    /// Whether the creature lost life recently.
    pub hurt: bool,
}

impl CreatureTelemetry {
    /// Snapshot of a creature.
    pub fn from_creature(creature: &Creature, max_connections: usize) -> Self {
        Self {
            id: creature.id,
            position: [creature.position[0], creature.position[1]],
            direction: [creature.direction[0], creature.direction[1]],
            speed: creature.velocity.abs(),
            life: creature.life,
            max_life: creature.max_life,
            energy: creature.energy,
            generation: creature.generation,
            size: creature.size,
            color: creature.color(max_connections),
            vision_distance: creature.vision_distance,
            vision_angle: creature.vision_angle,
            light_emission: creature.outputs.light_emission,
            hurt: creature.hurt,
        }
    }
}

/// What a renderer needs to draw one food point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodTelemetry {
    /// Food point ID.
    pub id: u64,
    /// Position.
    pub position: [f64; 2],
    /// Food units.
    pub quantity: u32,
}

impl From<&FoodPoint> for FoodTelemetry {
    fn from(food: &FoodPoint) -> Self {
        Self {
            id: food.id,
            position: [food.position[0], food.position[1]],
            quantity: food.quantity,
        }
    }
}

/// Role of a neuron, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NeuronRole {
    /// Input neuron.
    Input,
    /// Hidden neuron.
    Transition,
    /// Action neuron.
    Action,
}

/// One neuron of a [`BrainGraph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeuronView {
    /// Unique name inside the brain.
    pub name: String,
    /// Role of the neuron.
    pub role: NeuronRole,
    /// Current value.
    pub value: f64,
}

/// One wire of a [`BrainGraph`], keyed by neuron names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireView {
    /// Source neuron name.
    pub source: String,
    /// Weight.
    pub weight: f64,
    /// Destination neuron name.
    pub destination: String,
}

/// Neurons and wires of a brain, for graph visualization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrainGraph {
    /// Neurons, sorted by name.
    pub neurons: Vec<NeuronView>,
    /// Wires.
    pub wires: Vec<WireView>,
}

impl From<&Brain> for BrainGraph {
    fn from(brain: &Brain) -> Self {
        let mut neurons: Vec<NeuronView> = brain
            .neurons()
            .iter()
            .map(|neuron| NeuronView {
                name: neuron.name.clone(),
                role: match neuron.kind {
                    NeuronKind::Input(_) => NeuronRole::Input,
                    NeuronKind::Transition => NeuronRole::Transition,
                    NeuronKind::Action(_) => NeuronRole::Action,
                },
                value: neuron.value,
            })
            .collect();
        neurons.sort_by(|a, b| a.name.cmp(&b.name));
        let wires = brain
            .wire_names()
            .into_iter()
            .map(|(source, weight, destination)| WireView {
                source: source.to_string(),
                weight,
                destination: destination.to_string(),
            })
            .collect();
        Self { neurons, wires }
    }
}

/// Population-wide figures for the charts collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldStats {
    /// Simulation time in seconds.
    pub time: f64,
    /// Living creatures.
    pub population: usize,
    /// Food points on the ground.
    pub food_count: usize,
    /// Average absolute velocity.
    pub avg_velocity: f64,
    /// Average absolute acceleration.
    pub avg_acceleration: f64,
    /// Average size.
    pub avg_size: f64,
    /// Average energy.
    pub avg_energy: f64,
    /// Average life.
    pub avg_life: f64,
    /// Average life regeneration cost.
    pub avg_regen_cost: f64,
    /// Average vision angle.
    pub avg_vision_angle: f64,
    /// Average emitted light.
    pub avg_light_emission: f64,
    /// Average generation.
    pub avg_generation: f64,
    /// Share of creatures able to attack, in percent.
    pub killers_percent: f64,
    /// Children born since the world was created.
    pub total_births: u64,
    /// Creatures dead since the world was created.
    pub total_deaths: u64,
}

impl WorldStats {
    /// Aggregates the figures of the given population.
    pub fn collect<'a>(creatures: impl IntoIterator<Item = &'a Creature>) -> Self {
        let mut stats = Self::default();
        for creature in creatures {
            stats.population += 1;
            stats.avg_velocity += creature.velocity.abs();
            stats.avg_acceleration += creature.acceleration.abs();
            stats.avg_size += f64::from(creature.size);
            stats.avg_energy += creature.energy;
            stats.avg_life += creature.life;
            stats.avg_regen_cost += creature.life_regen_cost;
            stats.avg_vision_angle += creature.vision_angle;
            stats.avg_light_emission += creature.outputs.light_emission;
            stats.avg_generation += f64::from(creature.generation);
            if creature.max_damage > 0.0 {
                stats.killers_percent += 1.0;
            }
        }
        if stats.population > 0 {
            let n = stats.population as f64;
            for value in [
                &mut stats.avg_velocity,
                &mut stats.avg_acceleration,
                &mut stats.avg_size,
                &mut stats.avg_energy,
                &mut stats.avg_life,
                &mut stats.avg_regen_cost,
                &mut stats.avg_vision_angle,
                &mut stats.avg_light_emission,
                &mut stats.avg_generation,
            ] {
                *value /= n;
            }
            stats.killers_percent = stats.killers_percent * 100.0 / n;
        }
        stats
    }
}
