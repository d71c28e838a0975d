//! Neuron-graph brains.
//!
//! A brain is a directed weighted graph of input, hidden (transition) and action
//! neurons. Its wiring is fixed once created, by random generation or by
//! crossover of two parents; only neuron values change afterwards.
//!
//! Values travel as a wavefront: each [`Brain::tick`] recomputes only the
//! neurons fed by neurons that changed during the previous tick, so cycles are
//! harmless.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ndarray::Array1;
use rand::Rng;

use super::error::SimulationError;
use super::spatial::VisionCone;

pub mod neuron;
mod wiring;

pub use neuron::{
    ActionKind, ActionOutputs, ActionThresholds, InputKind, Neuron, NeuronKind, Sensors, squash,
};
pub use wiring::{MAX_DRAWS_PER_ROUND, MAX_WIRING_ROUNDS, wiring_capacity};

/// Index of a neuron inside its brain.
pub type NeuronId = usize;

/// Directed weighted connection between two neurons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wire {
    /// Neuron the value is read from.
    pub source: NeuronId,
    /// Multiplier applied to the source value.
    pub weight: f64,
    /// Neuron receiving the weighted value. Never an input.
    pub destination: NeuronId,
}

/// Read-only world queries needed by input neurons.
pub trait WorldView {
    /// Current simulation time in seconds.
    fn now(&self) -> f64;

    /// Light received at `position` from creatures other than `observer`.
    fn light_level(&self, observer: u64, position: &Array1<f64>) -> f64;

    /// Distance to the nearest food point inside `cone`.
    fn food_distance(&self, cone: &VisionCone) -> Option<f64>;
}

/// Evolvable neuron graph controlling a creature.
#[derive(Debug, Clone, Default)]
pub struct Brain {
    neurons: Vec<Neuron>,
    wires: Vec<Wire>,
    outgoing: Vec<Vec<usize>>,
    by_name: HashMap<String, NeuronId>,
    last_updated: BTreeSet<NeuronId>,
}

impl Brain {
    /// Generates a random brain with at least `connections` wires.
    ///
    /// Fails with [`SimulationError::GenerationExhausted`] when the random
    /// wiring does not settle into a valid graph within its retry budget.
    pub fn generate<R: Rng + ?Sized>(
        connections: usize,
        max_hidden_neurons: usize,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        wiring::generate(connections, max_hidden_neurons, rng)
    }

    /// Creates a child brain made only of wires inherited from the two parents.
    pub fn from_parents<R: Rng + ?Sized>(
        parent1: &Brain,
        parent2: &Brain,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        wiring::crossover(parent1, parent2, rng)
    }

    /// Builds a brain from explicit neurons and wires, keeping the given neuron values.
    pub fn from_parts(neurons: Vec<Neuron>, wires: Vec<Wire>) -> Result<Self, SimulationError> {
        let mut names = BTreeSet::new();
        for neuron in &neurons {
            if !names.insert(neuron.name.as_str()) {
                return Err(SimulationError::InvalidConfig(format!(
                    "duplicate neuron name {}",
                    neuron.name
                )));
            }
        }
        let mut pairs = BTreeSet::new();
        for wire in &wires {
            let (Some(_), Some(destination)) =
                (neurons.get(wire.source), neurons.get(wire.destination))
            else {
                return Err(SimulationError::InvalidConfig(
                    "wire references a missing neuron".to_string(),
                ));
            };
            if destination.is_input() {
                return Err(SimulationError::InvalidConfig(format!(
                    "input neuron {} cannot receive a wire",
                    destination.name
                )));
            }
            if !pairs.insert((wire.source, wire.destination)) {
                return Err(SimulationError::InvalidConfig(
                    "duplicate wire".to_string(),
                ));
            }
        }
        let wires = wires
            .into_iter()
            .map(|w| (w.source, w.weight, w.destination))
            .collect();
        Ok(Self::assemble(neurons, wires))
    }

    pub(crate) fn assemble(neurons: Vec<Neuron>, wires: Vec<(NeuronId, f64, NeuronId)>) -> Self {
        let wires: Vec<Wire> = wires
            .into_iter()
            .map(|(source, weight, destination)| Wire {
                source,
                weight,
                destination,
            })
            .collect();
        let mut outgoing = vec![Vec::new(); neurons.len()];
        for (index, wire) in wires.iter().enumerate() {
            outgoing[wire.source].push(index);
        }
        let by_name = neurons
            .iter()
            .enumerate()
            .map(|(id, neuron)| (neuron.name.clone(), id))
            .collect();
        let last_updated = neurons
            .iter()
            .enumerate()
            .filter(|(_, neuron)| neuron.is_input())
            .map(|(id, _)| id)
            .collect();
        Self {
            neurons,
            wires,
            outgoing,
            by_name,
            last_updated,
        }
    }

    /// Refreshes every input neuron from the sensors and marks them as updated.
    pub fn update_input(&mut self, sensors: &Sensors) {
        for (id, neuron) in self.neurons.iter_mut().enumerate() {
            if let NeuronKind::Input(kind) = neuron.kind {
                neuron.value = kind.sense(sensors);
                self.last_updated.insert(id);
            }
        }
    }

    /// Advances the activation wavefront by one step.
    ///
    /// Every neuron reached from the last updated set gets
    /// `squash(Σ source.value × weight)` over the wires coming from that set,
    /// read before any value of this step is written. The recomputed neurons
    /// become the new updated set.
    pub fn tick(&mut self) {
        let mut sums: BTreeMap<NeuronId, f64> = BTreeMap::new();
        for &source in &self.last_updated {
            let value = self.neurons[source].value;
            for &index in &self.outgoing[source] {
                let wire = self.wires[index];
                *sums.entry(wire.destination).or_insert(0.0) += value * wire.weight;
            }
        }
        for (&id, &sum) in &sums {
            self.neurons[id].value = squash(sum);
        }
        self.last_updated = sums.into_keys().collect();
    }

    /// Lets every action neuron write its output.
    pub fn act(&self, outputs: &mut ActionOutputs, thresholds: &ActionThresholds) {
        for neuron in &self.neurons {
            if let NeuronKind::Action(kind) = neuron.kind {
                kind.act(neuron.value, outputs, thresholds);
            }
        }
    }

    /// All neurons, indexed by [`NeuronId`].
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// All wires.
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Looks a neuron up by name.
    pub fn neuron(&self, name: &str) -> Option<&Neuron> {
        self.by_name.get(name).map(|&id| &self.neurons[id])
    }

    /// Current value of the neuron driving `action`, if this brain has one.
    pub fn action_value(&self, action: ActionKind) -> Option<f64> {
        self.neurons
            .iter()
            .find(|n| n.kind == NeuronKind::Action(action))
            .map(|n| n.value)
    }

    /// Wires as `(source name, weight, destination name)`.
    pub fn wire_names(&self) -> Vec<(&str, f64, &str)> {
        self.wires
            .iter()
            .map(|w| {
                (
                    self.neurons[w.source].name.as_str(),
                    w.weight,
                    self.neurons[w.destination].name.as_str(),
                )
            })
            .collect()
    }

    /// Names of the neurons updated during the last step, in id order.
    pub fn last_updated(&self) -> Vec<&str> {
        self.last_updated
            .iter()
            .map(|&id| self.neurons[id].name.as_str())
            .collect()
    }

    /// Number of neurons.
    pub fn neurons_count(&self) -> usize {
        self.neurons.len()
    }

    /// Number of wires.
    pub fn connections_count(&self) -> usize {
        self.wires.len()
    }

    /// Number of input neurons.
    pub fn inputs_count(&self) -> usize {
        self.neurons.iter().filter(|n| n.is_input()).count()
    }

    /// Number of action neurons.
    pub fn actions_count(&self) -> usize {
        self.neurons.iter().filter(|n| n.is_action()).count()
    }

    /// Number of movement action neurons.
    pub fn movement_count(&self) -> usize {
        self.neurons.iter().filter(|n| n.is_movement()).count()
    }

    /// Checks whether two wires share the same source and destination.
    pub fn has_duplicate_wires(&self) -> bool {
        let mut pairs = BTreeSet::new();
        !self
            .wires
            .iter()
            .all(|w| pairs.insert((w.source, w.destination)))
    }

    /// Checks whether the brain has no neuron at all.
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }
}
