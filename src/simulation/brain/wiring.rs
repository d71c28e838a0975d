//! Random wiring of neuron graphs: generation, crossover and the cleanup pass.
//!
//! Neurons live in an arena addressed by stable indices. A neuron is part of
//! the graph while at least one wire references it; removing a neuron filters
//! its wires out and never touches the arena itself.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::IndexedRandom;

use super::Brain;
use super::neuron::{ActionKind, InputKind, Neuron, NeuronKind, input_catalogue};
use crate::simulation::error::SimulationError;

/// Growth + cleanup rounds allowed before giving up.
pub const MAX_WIRING_ROUNDS: usize = 1000;
/// Wire draws allowed inside a single growth round.
pub const MAX_DRAWS_PER_ROUND: usize = 1000;

/// Most distinct wires a brain with `hidden` transition neurons can hold.
///
/// Inputs and hidden neurons feed hidden neurons and actions; no neuron feeds itself.
pub fn wiring_capacity(hidden: usize) -> usize {
    let sources = input_catalogue().len() + hidden;
    let destinations = hidden + ActionKind::ALL.len();
    sources * destinations - hidden
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ArenaWire {
    pub source: usize,
    pub weight: f64,
    pub destination: usize,
}

/// Work-in-progress graph.
#[derive(Debug, Clone, Default)]
pub(crate) struct Wiring {
    arena: Vec<Neuron>,
    wires: Vec<ArenaWire>,
}

impl Wiring {
    /// Arena holding the full input and action catalogues plus `hidden` transition neurons.
    fn fresh<R: Rng + ?Sized>(hidden: usize, rng: &mut R) -> Self {
        let mut arena = Vec::new();
        for (name, kind) in input_catalogue() {
            let kind = kind.unwrap_or_else(|| {
                let fixed = ((rng.random::<f64>() * 2.0 - 1.0) * 1000.0).round() / 1000.0;
                InputKind::Constant(fixed)
            });
            arena.push(Neuron::new(name, NeuronKind::Input(kind)));
        }
        arena.extend((0..hidden).map(|i| Neuron::new(format!("H{i}"), NeuronKind::Transition)));
        arena.extend(
            ActionKind::ALL
                .iter()
                .map(|&kind| Neuron::new(kind.name(), NeuronKind::Action(kind))),
        );
        Self {
            arena,
            wires: Vec::new(),
        }
    }

    /// Index of the canonical neuron named like `neuron`, added at rest when unseen.
    ///
    /// The first parent to introduce a name wins, so constants keep its value.
    fn intern(&mut self, neuron: &Neuron) -> usize {
        if let Some(id) = self.arena.iter().position(|n| n.name == neuron.name) {
            return id;
        }
        self.arena.push(Neuron::new(neuron.name.clone(), neuron.kind));
        self.arena.len() - 1
    }

    fn ids_where(&self, predicate: impl Fn(&Neuron) -> bool) -> Vec<usize> {
        self.arena
            .iter()
            .enumerate()
            .filter(|(_, neuron)| predicate(neuron))
            .map(|(id, _)| id)
            .collect()
    }

    fn contains_wire(&self, source: usize, destination: usize) -> bool {
        self.wires
            .iter()
            .any(|w| w.source == source && w.destination == destination)
    }

    /// Adds a wire unless the same `(source, destination)` pair already exists.
    fn add_wire(&mut self, wire: ArenaWire) -> bool {
        if self.contains_wire(wire.source, wire.destination) {
            return false;
        }
        self.wires.push(wire);
        true
    }

    fn remove_neuron(&mut self, id: usize) {
        self.wires.retain(|w| w.source != id && w.destination != id);
    }

    fn present(&self) -> HashSet<usize> {
        self.wires
            .iter()
            .flat_map(|w| [w.source, w.destination])
            .collect()
    }

    fn present_where(&self, predicate: impl Fn(&Neuron) -> bool) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .present()
            .into_iter()
            .filter(|&id| predicate(&self.arena[id]))
            .collect();
        ids.sort_unstable();
        ids
    }

    fn has_predecessor(&self, id: usize) -> bool {
        self.wires
            .iter()
            .any(|w| w.destination == id && w.source != id)
    }

    fn has_successor(&self, id: usize) -> bool {
        self.wires
            .iter()
            .any(|w| w.source == id && w.destination != id)
    }

    fn has_input(&self) -> bool {
        self.wires.iter().any(|w| self.arena[w.source].is_input())
    }

    fn has_movement(&self) -> bool {
        self.wires
            .iter()
            .any(|w| self.arena[w.destination].is_movement())
    }

    /// Enough wires, an input feeding the graph, and a movement action driven by it.
    fn is_complete(&self, target: usize) -> bool {
        self.wires.len() >= target && self.has_input() && self.has_movement()
    }

    /// Prunes structurally invalid neurons until the graph is stable.
    fn cleanup<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        loop {
            let mut changed = false;

            for id in self.present_where(Neuron::is_transition) {
                if !self.has_predecessor(id) || !self.has_successor(id) {
                    self.remove_neuron(id);
                    changed = true;
                }
            }

            for id in self.present_where(Neuron::is_action) {
                if !self.has_predecessor(id) {
                    self.remove_neuron(id);
                    changed = true;
                }
            }

            if !self.has_movement() {
                let actions = self.present_where(Neuron::is_action);
                if let Some(&id) = actions.choose(rng) {
                    self.remove_neuron(id);
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }
    }

    /// Compacts the surviving neurons into a brain.
    fn into_brain(self) -> Brain {
        let mut ids: Vec<usize> = self.present().into_iter().collect();
        ids.sort_unstable();
        let remap: HashMap<usize, usize> = ids
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new))
            .collect();
        let neurons = ids.iter().map(|&id| self.arena[id].clone()).collect();
        let wires = self
            .wires
            .iter()
            .map(|w| (remap[&w.source], w.weight, remap[&w.destination]))
            .collect();
        Brain::assemble(neurons, wires)
    }
}

/// Grows a random graph of at least `connections` wires using up to `max_hidden` hidden neurons.
pub(crate) fn generate<R: Rng + ?Sized>(
    connections: usize,
    max_hidden: usize,
    rng: &mut R,
) -> Result<Brain, SimulationError> {
    if connections == 0 {
        return Ok(Brain::default());
    }

    let mut wiring = Wiring::fresh(max_hidden, rng);
    let sources = wiring.ids_where(|n| n.is_input() || n.is_transition());
    let destinations = wiring.ids_where(|n| n.is_transition() || n.is_action());

    for round in 1..=MAX_WIRING_ROUNDS {
        let mut draws = 0;
        while !wiring.is_complete(connections) {
            draws += 1;
            if draws > MAX_DRAWS_PER_ROUND {
                return Err(SimulationError::GenerationExhausted { attempts: round });
            }
            let (Some(&source), Some(&destination)) =
                (sources.choose(rng), destinations.choose(rng))
            else {
                return Err(SimulationError::GenerationExhausted { attempts: round });
            };
            if source == destination {
                continue;
            }
            wiring.add_wire(ArenaWire {
                source,
                weight: rng.random_range(-2.0..2.0),
                destination,
            });
        }

        wiring.cleanup(rng);
        if wiring.is_complete(connections) {
            return Ok(wiring.into_brain());
        }
    }

    Err(SimulationError::GenerationExhausted {
        attempts: MAX_WIRING_ROUNDS,
    })
}

/// Builds a child graph out of the wires of both parents.
pub(crate) fn crossover<R: Rng + ?Sized>(
    parent1: &Brain,
    parent2: &Brain,
    rng: &mut R,
) -> Result<Brain, SimulationError> {
    let mut child = Wiring::default();
    let mut pool: Vec<ArenaWire> = Vec::new();

    for parent in [parent1, parent2] {
        for wire in parent.wires() {
            let source = child.intern(&parent.neurons()[wire.source]);
            let destination = child.intern(&parent.neurons()[wire.destination]);
            if !pool
                .iter()
                .any(|w| w.source == source && w.destination == destination)
            {
                pool.push(ArenaWire {
                    source,
                    weight: wire.weight,
                    destination,
                });
            }
        }
    }

    if pool.is_empty() {
        return Ok(Brain::default());
    }

    let (low, high) = {
        let a = parent1.connections_count();
        let b = parent2.connections_count();
        (a.min(b), a.max(b))
    };
    let target = rng.random_range(low..=high).min(pool.len());

    for round in 1..=MAX_WIRING_ROUNDS {
        while !child.is_complete(target) {
            let candidates: Vec<&ArenaWire> = pool
                .iter()
                .filter(|w| !child.contains_wire(w.source, w.destination))
                .collect();
            let Some(&&wire) = candidates.choose(rng) else {
                return Err(SimulationError::GenerationExhausted { attempts: round });
            };
            child.add_wire(wire);
        }

        child.cleanup(rng);
        if child.is_complete(target) {
            return Ok(child.into_brain());
        }
    }

    Err(SimulationError::GenerationExhausted {
        attempts: MAX_WIRING_ROUNDS,
    })
}
