//! # Critters - Artificial Life on a Toroidal Plane
//!
//! A simulation of creatures driven by small evolvable neuron graphs. Creatures
//! sense their surroundings, move, eat food, emit light, attack each other and
//! reproduce sexually; their brains and traits are inherited from both parents.
//!
//! ## Features
//!
//! - Neuron-graph brains with wavefront propagation (cycles allowed)
//! - Random brain generation and crossover of two parent brains
//! - Vision-cone perception over a wrapping uniform spatial grid
//! - Digestion, starvation and life regeneration
//! - Movement computed in parallel on a fixed worker pool
//! - Periodic energy and food passes driven by timers
//! - Read-only telemetry for renderers and charts
//!
//! ## Core Modules
//!
//! - [`simulation::creature`] - Creature state and lifecycle
//! - [`simulation::brain`] - Neuron graphs
//! - [`simulation::ecosystem`] - Main simulation logic
//! - [`simulation::movement`] - Kinematics and the worker pool
//! - [`simulation::spatial`] - Spatial grid and visibility queries
//! - [`simulation::events`] - What happened during a step

/// Core simulation logic and data structures.
pub mod simulation {
    /// Neuron-graph brains: wiring, propagation and crossover.
    pub mod brain;
    /// Attacks between creatures.
    pub mod combat;
    /// Creature behavior, state, and lifecycle.
    pub mod creature;
    /// Main ecosystem simulation with a parallel movement phase.
    pub mod ecosystem;
    /// Error type shared by the simulation.
    pub mod error;
    /// Events produced while stepping the world.
    pub mod events;
    /// Food points and the generators spawning them.
    pub mod food;
    /// Geometric utility functions for distance calculations on a torus.
    pub mod geometric_utils;
    /// Trait for locatable entities.
    ///
    /// The [`locatable::Locatable`] trait is implemented by all entities that have
    /// a position in 2D space (food points, creatures and their grid records).
    pub mod locatable;
    /// Creature kinematics and the parallel movement phase.
    pub mod movement;
    /// Simulation parameters.
    pub mod params;
    /// Sexual reproduction between colliding creatures.
    pub mod reproduction;
    /// Seeded randomness.
    pub mod rng;
    /// Timers for the periodic energy and food passes.
    pub mod schedule;
    /// Uniform spatial grid over the toroidal world.
    pub mod spatial;
    /// Read-only views for renderers and charts.
    pub mod telemetry;
}
