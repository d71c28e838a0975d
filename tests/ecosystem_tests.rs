#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::collections::BTreeMap;

use critters::simulation::brain::{Brain, WorldView};
use critters::simulation::creature::{Creature, Traits};
use critters::simulation::ecosystem::Ecosystem;
use critters::simulation::events::{DeathCause, EventQueue, SimulationEvent};
use critters::simulation::params::Params;
use critters::simulation::reproduction::{reproduce_creatures, reproduction_cost};
use critters::simulation::rng::create_rng;
use critters::simulation::schedule::Scheduler;
use ndarray::Array1;

fn create_test_params() -> Params {
    Params {
        width: 200.0,
        height: 200.0,
        cell_size: 20.0,
        initial_creatures_count: 0,
        food_generators: vec![],
        workers: Some(2),
        seed: Some(7),
        ..Params::default()
    }
}

fn create_test_creature(params: &Params, x: f64, y: f64, size: u32) -> Creature {
    let traits = Traits {
        size,
        max_life: 20.0,
        life_regen_cost: 4.0,
        digestion_efficiency: 1.0,
        digestion_speed: 2.0,
        vision_distance: 100.0,
        vision_angle: 90.0,
        max_damage: 0.0,
    };
    Creature::from_traits(
        0,
        0,
        traits,
        Brain::default(),
        Array1::from_vec(vec![x, y]),
        Array1::from_vec(vec![1.0, 0.0]),
        params,
        0.0,
    )
}

fn create_parent(params: &Params, x: f64, generation: u32) -> Creature {
    let mut creature = create_test_creature(params, x, 50.0, 3);
    creature.generation = generation;
    creature.outputs.ready_for_reproduction = true;
    creature.last_reproduction = -100.0;
    creature
}

fn create_test_world() -> Ecosystem {
    Ecosystem::new(create_test_params()).unwrap()
}

#[test]
fn test_ecosystem_creation() {
    let params = Params {
        initial_creatures_count: 25,
        ..create_test_params()
    };
    let ecosystem = Ecosystem::new(params).unwrap();

    assert!(ecosystem.population() <= 25);
    assert!(ecosystem.population() > 0);
    assert_eq!(ecosystem.time(), 0.0);
    assert_eq!(ecosystem.food_count(), 0);
    assert_eq!(ecosystem.workers(), 2);
    assert!(ecosystem.check_invariants().is_ok());

    for creature in ecosystem.creatures() {
        assert_eq!(creature.generation, 0);
        assert_eq!(creature.life, creature.max_life);
    }
}

#[test]
fn test_invalid_params_are_rejected() {
    let params = Params {
        width: 0.0,
        ..create_test_params()
    };
    assert!(Ecosystem::new(params).is_err());

    let params = Params {
        min_connections: 8,
        max_connections: 2,
        ..create_test_params()
    };
    assert!(Ecosystem::new(params).is_err());

    // cells must tile the world exactly
    let params = Params {
        width: 105.0,
        height: 100.0,
        cell_size: 10.0,
        ..create_test_params()
    };
    assert!(params.validate().is_err());
    assert!(Ecosystem::new(params).is_err());

    // a brain drawn without hidden neurons holds at most 75 wires
    let params = Params {
        max_connections: 200,
        ..create_test_params()
    };
    assert!(params.validate().is_err());
    let params = Params {
        max_connections: 75,
        ..create_test_params()
    };
    assert!(params.validate().is_ok());
}

#[test]
fn test_params_from_json_fill_defaults() {
    let params = Params::from_json(r#"{"width": 300.0, "seed": 3}"#).unwrap();
    assert_eq!(params.width, 300.0);
    assert_eq!(params.seed, Some(3));
    assert_eq!(params.height, Params::default().height);

    assert!(Params::from_json(r#"{"fps": 0}"#).is_err());
    assert!(Params::from_json("not json").is_err());
}

#[test]
fn test_creature_eats_colliding_food() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let id = ecosystem
        .add_creature(create_test_creature(&params, 10.0, 10.0, 3))
        .unwrap();
    ecosystem.add_food(Array1::from_vec(vec![11.0, 11.0]), 20);
    let before = ecosystem.creature(id).unwrap().digesting;

    assert_eq!(ecosystem.detect_creature_eating(id), 1);
    assert_eq!(ecosystem.creature(id).unwrap().digesting, before + 20.0);
    assert_eq!(ecosystem.food_count(), 0);
}

#[test]
fn test_eating_stops_when_full() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let id = ecosystem
        .add_creature(create_test_creature(&params, 50.0, 50.0, 1))
        .unwrap();
    for _ in 0..3 {
        ecosystem.add_food(Array1::from_vec(vec![50.0, 50.0]), 35);
    }

    assert_eq!(ecosystem.detect_creature_eating(id), 1);
    assert_eq!(ecosystem.creature(id).unwrap().digesting, 7.0 + 35.0);
    assert_eq!(ecosystem.food_count(), 2);
}

#[test]
fn test_distant_food_is_left_alone() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let id = ecosystem
        .add_creature(create_test_creature(&params, 10.0, 10.0, 3))
        .unwrap();
    ecosystem.add_food(Array1::from_vec(vec![30.0, 10.0]), 20);

    assert_eq!(ecosystem.detect_creature_eating(id), 0);
    assert_eq!(ecosystem.food_count(), 1);
}

#[test]
fn test_colliding_parents_have_one_child() {
    let params = create_test_params();
    let mut creatures = BTreeMap::new();
    let mut first = create_parent(&params, 50.0, 2);
    first.id = 0;
    let mut second = create_parent(&params, 51.0, 4);
    second.id = 1;
    creatures.insert(0, first);
    creatures.insert(1, second);

    let mut next_id = 2;
    let mut events = EventQueue::new();
    let born = reproduce_creatures(
        &mut creatures,
        &mut next_id,
        &params,
        1.0,
        &mut create_rng(1),
        &mut events,
    );

    assert_eq!(born, vec![2]);
    assert_eq!(next_id, 3);
    let child = &creatures[&2];
    assert_eq!(child.generation, 5);
    assert_eq!(child.size, 3);
    assert_eq!(child.position[0], 50.5);

    let cost = reproduction_cost(&params, child.size);
    assert_eq!(cost, params.reproduction_energy_factor * 3.0_f64.powf(0.7));
    for parent in [&creatures[&0], &creatures[&1]] {
        assert_eq!(parent.energy, params.creature_starting_energy - cost);
        assert_eq!(parent.last_reproduction, 1.0);
    }
    assert_eq!(child.energy, cost * params.child_initial_energy_percent);
    assert_eq!(
        child.life,
        (child.max_life * params.child_initial_life_percent).round()
    );
    assert_eq!(events.len(), 1);
}

#[test]
fn test_reproduction_happens_during_step() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let a = ecosystem.add_creature(create_parent(&params, 50.0, 0)).unwrap();
    let b = ecosystem.add_creature(create_parent(&params, 51.0, 0)).unwrap();

    let events = ecosystem.step(16.0);
    assert_eq!(ecosystem.population(), 3);
    assert!(events.iter().any(|e| matches!(
        e,
        SimulationEvent::CreatureBorn { parents, generation: 1, .. } if *parents == (a, b)
    )));

    // parents are now cooling down
    ecosystem.step(16.0);
    assert_eq!(ecosystem.population(), 3);
    assert!(ecosystem.check_invariants().is_ok());
}

#[test]
fn test_population_cap_blocks_births() {
    let params = Params {
        max_creatures_count: 2,
        ..create_test_params()
    };
    let mut ecosystem = Ecosystem::new(params.clone()).unwrap();
    ecosystem.add_creature(create_parent(&params, 50.0, 0)).unwrap();
    ecosystem.add_creature(create_parent(&params, 51.0, 0)).unwrap();
    assert!(ecosystem
        .add_creature(create_parent(&params, 52.0, 0))
        .is_none());

    ecosystem.step(16.0);
    assert_eq!(ecosystem.population(), 2);
}

#[test]
fn test_children_per_pass_are_capped() {
    let params = Params {
        max_children_per_pass: 2,
        ..create_test_params()
    };
    let mut creatures = BTreeMap::new();
    // six separate colliding couples
    for pair in 0..6_u64 {
        let x = 10.0 + 30.0 * pair as f64;
        for (offset, id) in [(0.0, pair * 2), (1.0, pair * 2 + 1)] {
            let mut parent = create_parent(&params, x + offset, 0);
            parent.id = id;
            creatures.insert(id, parent);
        }
    }

    let mut next_id = 12;
    let mut events = EventQueue::new();
    let born = reproduce_creatures(
        &mut creatures,
        &mut next_id,
        &params,
        1.0,
        &mut create_rng(4),
        &mut events,
    );

    assert_eq!(born.len(), 2);
    assert_eq!(creatures.len(), 14);
    let spent = creatures
        .values()
        .filter(|c| c.last_reproduction == 1.0)
        .count();
    assert_eq!(spent, 4);
}

fn attack_chain_events(max_attacks_per_pass: usize) -> usize {
    let params = Params {
        max_attacks_per_pass,
        ..create_test_params()
    };
    let mut ecosystem = Ecosystem::new(params.clone()).unwrap();
    // each attacker faces the next one, 30 units ahead
    for i in 0..5 {
        let mut attacker = create_test_creature(&params, 10.0 + 30.0 * f64::from(i), 50.0, 3);
        attacker.max_damage = 10.0;
        attacker.outputs.ready_to_kill = true;
        ecosystem.add_creature(attacker).unwrap();
    }
    ecosystem
        .step(16.0)
        .iter()
        .filter(|e| matches!(e, SimulationEvent::Attack { .. }))
        .count()
}

#[test]
fn test_attacks_per_pass_are_capped() {
    assert_eq!(attack_chain_events(50), 4);
    assert_eq!(attack_chain_events(1), 1);
}

#[test]
fn test_attack_damages_nearest_visible_creature() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let mut attacker = create_test_creature(&params, 50.0, 50.0, 3);
    attacker.max_damage = 10.0;
    attacker.outputs.ready_to_kill = true;
    let attacker = ecosystem.add_creature(attacker).unwrap();
    let victim = ecosystem
        .add_creature(create_test_creature(&params, 60.0, 50.0, 3))
        .unwrap();

    let events = ecosystem.step(16.0);
    let victim_state = ecosystem.creature(victim).unwrap();
    assert_eq!(victim_state.life, 11.0);
    assert!(victim_state.hurt);
    assert!(victim_state.last_damage_received.is_some());
    assert!(events.contains(&SimulationEvent::Attack {
        attacker_id: attacker,
        victim_id: victim,
        damage: 9.0,
    }));

    // cooldown
    ecosystem.step(16.0);
    assert_eq!(ecosystem.creature(victim).unwrap().life, 11.0);
}

#[test]
fn test_killed_creature_is_removed() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let mut attacker = create_test_creature(&params, 50.0, 50.0, 3);
    attacker.max_damage = 10.0;
    attacker.outputs.ready_to_kill = true;
    let attacker = ecosystem.add_creature(attacker).unwrap();
    let mut victim = create_test_creature(&params, 60.0, 50.0, 3);
    victim.life = 5.0;
    let victim = ecosystem.add_creature(victim).unwrap();

    let events = ecosystem.step(16.0);
    assert!(ecosystem.creature(victim).is_none());
    assert_eq!(ecosystem.population(), 1);
    assert!(events.contains(&SimulationEvent::CreatureDied {
        creature_id: victim,
        cause: DeathCause::Killed { by: attacker },
    }));
    assert!(ecosystem.check_invariants().is_ok());
}

#[test]
fn test_energy_pass_removes_starved_creatures() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let healthy = ecosystem
        .add_creature(create_test_creature(&params, 20.0, 20.0, 3))
        .unwrap();
    let mut starving = create_test_creature(&params, 80.0, 80.0, 3);
    starving.life = 1.0;
    starving.energy = -100.0;
    starving.digesting = 0.0;
    let starving = ecosystem.add_creature(starving).unwrap();

    let events = ecosystem.update_creatures_energies();
    assert_eq!(
        events,
        vec![SimulationEvent::CreatureDied {
            creature_id: starving,
            cause: DeathCause::Starvation,
        }]
    );
    assert!(ecosystem.creature(starving).is_none());
    assert!(ecosystem.creature(healthy).is_some());
    assert_eq!(ecosystem.stats().total_deaths, 1);
}

#[test]
fn test_scheduler_runs_energy_pass_every_interval() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let mut starving = create_test_creature(&params, 80.0, 80.0, 3);
    starving.life = 1.0;
    starving.energy = -100.0;
    starving.digesting = 0.0;
    ecosystem.add_creature(starving).unwrap();
    let mut scheduler = Scheduler::new(ecosystem.params());

    scheduler.run_frame(&mut ecosystem, 500.0);
    assert_eq!(ecosystem.population(), 1);
    let events = scheduler.run_frame(&mut ecosystem, 500.0);
    assert_eq!(ecosystem.population(), 0);
    assert!(events
        .iter()
        .any(|e| matches!(e, SimulationEvent::CreatureDied { .. })));
}

#[test]
fn test_light_is_received_from_others() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let mut lamp = create_test_creature(&params, 50.0, 50.0, 3);
    lamp.outputs.light_emission = 100.0;
    let lamp = ecosystem.add_creature(lamp).unwrap();
    let observer = ecosystem
        .add_creature(create_test_creature(&params, 80.0, 50.0, 3))
        .unwrap();
    let far = ecosystem
        .add_creature(create_test_creature(&params, 50.0, 170.0, 3))
        .unwrap();

    let at = |id| ecosystem.creature(id).unwrap().position.clone();
    assert!((ecosystem.light_level(observer, &at(observer)) - 70.0).abs() < 1e-9);
    assert_eq!(ecosystem.light_level(lamp, &at(lamp)), 0.0);
    // 80 away through the edge of a 200-high world
    assert!((ecosystem.light_level(far, &at(far)) - 20.0).abs() < 1e-9);
}

#[test]
fn test_food_distance_uses_vision_cone() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let id = ecosystem
        .add_creature(create_test_creature(&params, 50.0, 50.0, 3))
        .unwrap();
    ecosystem.add_food(Array1::from_vec(vec![70.0, 50.0]), 10);
    ecosystem.add_food(Array1::from_vec(vec![30.0, 50.0]), 10);

    let cone = ecosystem.creature(id).unwrap().vision_cone();
    assert_eq!(ecosystem.food_distance(&cone), Some(20.0));
}

#[test]
fn test_food_generation_respects_cap() {
    let params = Params {
        max_food_count: 15,
        food_generators: Params::default().food_generators,
        ..create_test_params()
    };
    let mut ecosystem = Ecosystem::new(params).unwrap();
    ecosystem.generate_initial_food();
    for _ in 0..20 {
        ecosystem.generate_food();
    }
    assert!(ecosystem.food_count() <= 15);
    assert!(ecosystem.food_count() > 0);
    for food in ecosystem.food() {
        assert!((0.0..200.0).contains(&food.position[0]));
        assert!((0.0..200.0).contains(&food.position[1]));
        assert!((2..=35).contains(&food.quantity));
    }
}

#[test]
fn test_creature_selection() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let id = ecosystem
        .add_creature(create_test_creature(&params, 50.0, 50.0, 3))
        .unwrap();

    assert_eq!(ecosystem.creature_at(&Array1::from_vec(vec![52.0, 50.0])), Some(id));
    assert_eq!(ecosystem.creature_at(&Array1::from_vec(vec![90.0, 90.0])), None);
}

#[test]
fn test_telemetry_reflects_world() {
    let params = Params {
        initial_creatures_count: 10,
        ..create_test_params()
    };
    let mut ecosystem = Ecosystem::new(params).unwrap();
    ecosystem.add_food(Array1::from_vec(vec![5.0, 5.0]), 12);

    let creatures = ecosystem.creature_telemetry();
    assert_eq!(creatures.len(), ecosystem.population());
    assert_eq!(ecosystem.food_telemetry().len(), 1);

    let first = creatures[0].id;
    let graph = ecosystem.brain_graph(first).unwrap();
    assert_eq!(
        graph.wires.len(),
        ecosystem.creature(first).unwrap().brain.connections_count()
    );
    assert!(ecosystem.brain_graph(u64::MAX).is_none());

    let stats = ecosystem.stats();
    assert_eq!(stats.population, ecosystem.population());
    assert_eq!(stats.food_count, 1);
    assert!(serde_json::to_string(&stats).is_ok());
}

#[test]
fn test_long_run_keeps_invariants() {
    let params = Params {
        width: 400.0,
        height: 300.0,
        cell_size: 50.0,
        initial_creatures_count: 40,
        food_generators: Params::default().food_generators,
        seed: Some(9),
        ..create_test_params()
    };
    let frame_ms = params.frame_ms();
    let mut ecosystem = Ecosystem::new(params).unwrap();
    let mut scheduler = Scheduler::new(ecosystem.params());
    ecosystem.generate_initial_food();

    for frame in 0..300 {
        scheduler.run_frame(&mut ecosystem, frame_ms);
        if frame % 25 == 0 {
            ecosystem.check_invariants().unwrap();
        }
    }
    ecosystem.check_invariants().unwrap();
    assert!(ecosystem.time() > 4.9);
    for creature in ecosystem.creatures() {
        assert!((0.0..=creature.max_life).contains(&creature.life));
    }
}

#[test]
fn test_seeded_worlds_are_reproducible() {
    let params = Params {
        initial_creatures_count: 30,
        food_generators: Params::default().food_generators,
        seed: Some(21),
        ..create_test_params()
    };
    let run = |params: Params| {
        let mut ecosystem = Ecosystem::new(params).unwrap();
        let mut scheduler = Scheduler::new(ecosystem.params());
        ecosystem.generate_initial_food();
        for _ in 0..60 {
            scheduler.run_frame(&mut ecosystem, 16.0);
        }
        ecosystem
            .creatures()
            .map(|c| (c.id, c.position[0], c.position[1], c.energy))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(params.clone()), run(params));
}

#[cfg(debug_assertions)]
#[test]
fn test_failed_movement_keeps_previous_state() {
    let mut ecosystem = create_test_world();
    let params = ecosystem.params().clone();
    let healthy = ecosystem
        .add_creature(create_test_creature(&params, 20.0, 20.0, 3))
        .unwrap();
    let broken = ecosystem
        .add_creature(create_test_creature(&params, 80.0, 80.0, 0))
        .unwrap();
    let energy = ecosystem.creature(broken).unwrap().energy;

    let events = ecosystem.step(16.0);
    assert!(events.contains(&SimulationEvent::WorkerTaskFailure {
        creature_id: broken,
    }));
    assert_eq!(ecosystem.creature(broken).unwrap().energy, energy);
    assert!(ecosystem.creature(healthy).unwrap().energy < energy);
}
