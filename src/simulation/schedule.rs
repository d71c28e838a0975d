//! Periodic side inputs of the simulation.
//!
//! Energy bookkeeping and food generation run on their own timers rather than
//! once per frame. The scheduler turns elapsed frame time into the number of
//! passes owed and runs them against the ecosystem.

use super::ecosystem::Ecosystem;
use super::events::SimulationEvent;
use super::params::Params;

/// Fires every `interval_ms` milliseconds of accumulated time.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicTimer {
    interval_ms: f64,
    accumulated_ms: f64,
}

impl PeriodicTimer {
    /// Creates a timer. A zero interval is treated as one millisecond.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1) as f64,
            accumulated_ms: 0.0,
        }
    }

    /// Adds elapsed time and returns how many times the timer fired.
    pub fn advance(&mut self, elapsed_ms: f64) -> u32 {
        if elapsed_ms > 0.0 {
            self.accumulated_ms += elapsed_ms;
        }
        let mut fired = 0;
        while self.accumulated_ms >= self.interval_ms {
            self.accumulated_ms -= self.interval_ms;
            fired += 1;
        }
        fired
    }

    /// Time left before the next firing.
    pub fn remaining_ms(&self) -> f64 {
        self.interval_ms - self.accumulated_ms
    }
}

/// Drives the energy and food passes of an [`Ecosystem`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    energy: PeriodicTimer,
    food: PeriodicTimer,
}

impl Scheduler {
    /// Timers with the intervals configured in `params`.
    pub fn new(params: &Params) -> Self {
        Self {
            energy: PeriodicTimer::new(params.energy_interval_ms),
            food: PeriodicTimer::new(params.food_interval_ms),
        }
    }

    /// Runs the passes that came due during `elapsed_ms`.
    pub fn advance(&mut self, ecosystem: &mut Ecosystem, elapsed_ms: f64) -> Vec<SimulationEvent> {
        let mut events = Vec::new();
        for _ in 0..self.energy.advance(elapsed_ms) {
            events.extend(ecosystem.update_creatures_energies());
        }
        for _ in 0..self.food.advance(elapsed_ms) {
            ecosystem.generate_food();
        }
        events
    }

    /// Runs the due periodic passes, then one world step.
    pub fn run_frame(&mut self, ecosystem: &mut Ecosystem, elapsed_ms: f64) -> Vec<SimulationEvent> {
        let mut events = self.advance(ecosystem, elapsed_ms);
        events.extend(ecosystem.step(elapsed_ms));
        events
    }
}
