//! Events produced while stepping the world.
//!
//! Passes push what happened into an [`EventQueue`]; the queue is drained and
//! handed to the caller once the step is over.

use serde::Serialize;

/// Why a creature was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeathCause {
    /// Life exhausted by starvation during the energy pass.
    Starvation,
    /// Killed by another creature.
    Killed {
        /// Attacker dealing the final blow.
        by: u64,
    },
}

/// Something that changed the population or the food supply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimulationEvent {
    /// A child was born from two parents.
    CreatureBorn {
        /// ID of the child.
        creature_id: u64,
        /// IDs of both parents.
        parents: (u64, u64),
        /// Generation of the child.
        generation: u32,
    },
    /// A creature died and was removed.
    CreatureDied {
        /// ID of the dead creature.
        creature_id: u64,
        /// What killed it.
        cause: DeathCause,
    },
    /// A creature ate a food point.
    FoodEaten {
        /// ID of the creature.
        creature_id: u64,
        /// ID of the eaten food point.
        food_id: u64,
        /// Food units moved into the stomach.
        quantity: u32,
    },
    /// A creature hit its nearest visible neighbor.
    Attack {
        /// ID of the attacker.
        attacker_id: u64,
        /// ID of the victim.
        victim_id: u64,
        /// Life points removed.
        damage: f64,
    },
    /// Movement of a creature failed; it kept its previous kinematics.
    WorkerTaskFailure {
        /// ID of the creature.
        creature_id: u64,
    },
}

/// Queue collecting events during a step.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SimulationEvent>,
}

impl EventQueue {
    /// Creates an empty event queue.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Adds an event to the queue.
    pub fn push(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    /// Drains all events from the queue.
    pub fn drain(&mut self) -> std::vec::Drain<'_, SimulationEvent> {
        self.events.drain(..)
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Checks whether no event is queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over the queued events.
    pub fn iter(&self) -> impl Iterator<Item = &SimulationEvent> {
        self.events.iter()
    }
}
