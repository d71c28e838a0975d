//! Sexual reproduction between colliding creatures.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, info};

use super::brain::Brain;
use super::creature::{Creature, Traits, random_direction};
use super::error::SimulationError;
use super::events::{EventQueue, SimulationEvent};
use super::geometric_utils::squares_collide;
use super::params::Params;

/// Creates the child of two parents, at full life, halfway between them.
///
/// Traits are picked from either parent and the brain is a crossover of both.
pub fn spawn_child<R: Rng + ?Sized>(
    id: u64,
    parent1: &Creature,
    parent2: &Creature,
    params: &Params,
    now: f64,
    rng: &mut R,
) -> Result<Creature, SimulationError> {
    let traits = Traits::inherit(parent1, parent2, rng);
    let brain = Brain::from_parents(&parent1.brain, &parent2.brain, rng)?;
    let position = (&parent1.position + &parent2.position) / 2.0;
    let generation = parent1.generation.max(parent2.generation) + 1;
    Ok(Creature::from_traits(
        id,
        generation,
        traits,
        brain,
        position,
        random_direction(rng),
        params,
        now,
    ))
}

/// Energy each parent pays for a child of the given size.
pub fn reproduction_cost(params: &Params, child_size: u32) -> f64 {
    params.reproduction_energy_factor * f64::from(child_size).powf(0.7)
}

/// Pairs every two colliding creatures ready to reproduce and adds their children.
///
/// Stops once `max_children_per_pass` children are pending or the population
/// would reach its cap. Returns the ids of the new children.
pub fn reproduce_creatures<R: Rng + ?Sized>(
    creatures: &mut BTreeMap<u64, Creature>,
    next_id: &mut u64,
    params: &Params,
    now: f64,
    rng: &mut R,
    events: &mut EventQueue,
) -> Vec<u64> {
    let existing = creatures.len();
    let ready: Vec<u64> = creatures
        .values()
        .filter(|c| c.can_repro(now, params.reproduction_cooldown))
        .map(|c| c.id)
        .collect();
    let mut children: Vec<Creature> = Vec::new();
    let is_capped = |pending: usize| {
        pending >= params.max_children_per_pass || existing + pending >= params.max_creatures_count
    };

    'outer: for (i, &first) in ready.iter().enumerate() {
        for &second in &ready[i + 1..] {
            if is_capped(children.len()) {
                break 'outer;
            }
            let (Some(parent1), Some(parent2)) = (creatures.get(&first), creatures.get(&second))
            else {
                continue;
            };
            if !parent1.can_repro(now, params.reproduction_cooldown)
                || !parent2.can_repro(now, params.reproduction_cooldown)
                || !squares_collide(
                    &parent1.position,
                    parent1.rect_side(),
                    &parent2.position,
                    parent2.rect_side(),
                )
            {
                continue;
            }

            let mut child = match spawn_child(*next_id, parent1, parent2, params, now, rng) {
                Ok(child) => child,
                Err(e) => {
                    debug!(parent1 = first, parent2 = second, error = %e, "child not created");
                    continue;
                }
            };
            *next_id += 1;

            let lost_energy = reproduction_cost(params, child.size);
            for parent_id in [first, second] {
                if let Some(parent) = creatures.get_mut(&parent_id) {
                    parent.last_reproduction = now;
                    parent.energy -= lost_energy;
                }
            }
            child.energy = lost_energy * params.child_initial_energy_percent;
            child.life = (child.max_life * params.child_initial_life_percent).round();

            events.push(SimulationEvent::CreatureBorn {
                creature_id: child.id,
                parents: (first, second),
                generation: child.generation,
            });
            children.push(child);
        }
    }

    if !children.is_empty() {
        info!("{} new creatures born", children.len());
    }
    let ids = children.iter().map(|c| c.id).collect();
    for child in children {
        creatures.insert(child.id, child);
    }
    debug_assert!(creatures.len() <= params.max_creatures_count.max(existing));
    ids
}
