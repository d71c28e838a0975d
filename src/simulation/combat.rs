//! Creatures attacking their nearest visible neighbor.

use std::collections::BTreeMap;

use tracing::info;

use super::creature::Creature;
use super::events::{DeathCause, EventQueue, SimulationEvent};
use super::params::Params;
use super::spatial::{CreatureLocation, SpatialGrid};

/// Damage dealt by an attacker at `distance` from its victim.
///
/// Falls linearly from `max_damage` at contact to 0 at the edge of vision.
pub fn attack_damage(max_damage: f64, distance: f64, vision_distance: f64) -> f64 {
    if vision_distance <= 0.0 {
        return 0.0;
    }
    (max_damage * (1.0 - distance / vision_distance)).round()
}

/// Lets every creature able to attack hit its nearest visible neighbor.
///
/// Victims whose life drops to zero are removed from the population and the
/// grid at once, so later attackers of this pass never target them. Returns
/// the ids of the killed creatures.
pub fn attack_creatures(
    creatures: &mut BTreeMap<u64, Creature>,
    grid: &mut SpatialGrid<CreatureLocation>,
    params: &Params,
    now: f64,
    events: &mut EventQueue,
) -> Vec<u64> {
    let attackers: Vec<u64> = creatures
        .values()
        .filter(|c| c.can_attack(now, params.attack_cooldown))
        .map(|c| c.id)
        .collect();
    let mut killed = Vec::new();
    let mut attacks = 0;

    for attacker_id in attackers {
        if attacks >= params.max_attacks_per_pass {
            break;
        }
        // killed earlier in this pass
        let Some(attacker) = creatures.get(&attacker_id) else {
            continue;
        };
        let Some((victim, distance)) = grid.query_closest(&attacker.vision_cone(), Some(attacker_id))
        else {
            continue;
        };
        let victim_id = victim.id;
        let damage = attack_damage(attacker.max_damage, distance, attacker.vision_distance);
        if damage == 0.0 {
            continue;
        }
        let Some(victim) = creatures.get_mut(&victim_id) else {
            continue;
        };

        victim.receive_damages(damage);
        victim.last_damage_received = Some(now);
        let victim_dead = victim.is_dead();
        let victim_cell = grid.cell_index(&victim.position);
        if let Some(attacker) = creatures.get_mut(&attacker_id) {
            attacker.last_damage_action = Some(now);
        }
        attacks += 1;
        events.push(SimulationEvent::Attack {
            attacker_id,
            victim_id,
            damage,
        });

        if victim_dead {
            creatures.remove(&victim_id);
            grid.take(victim_cell, victim_id);
            events.push(SimulationEvent::CreatureDied {
                creature_id: victim_id,
                cause: DeathCause::Killed { by: attacker_id },
            });
            killed.push(victim_id);
        }
    }

    if !killed.is_empty() {
        info!("{} creature(s) killed", killed.len());
    }
    killed
}
