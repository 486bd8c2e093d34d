//! Integration tests for transfer sessions driven by the engine clock.
//!
//! Exercises: spawn → enter_zone → update → events, with production cycles,
//! sessions and placement settles interleaving on one timeline.

use std::collections::HashSet;

use hecs::Entity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stockpile_core::prelude::*;
use stockpile_logic::config::{CarrierConfig, UnitConfig};
use stockpile_logic::production::UnitStatus;
use stockpile_logic::recipe::Recipe;
use stockpile_logic::resources::{ResourceId, ResourceKind};
use stockpile_logic::transfer::SessionEnd;

use ResourceKind::{Resource1 as A, Resource2 as B, Resource3 as C};

// ── Helpers ────────────────────────────────────────────────────────────

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn warehouse() -> UnitConfig {
    UnitConfig {
        name: "Warehouse".into(),
        supply_capacity: 5,
        production_capacity: 3,
        recipe: Recipe::new(vec![A, A, B]),
        output: C,
        ..UnitConfig::default()
    }
}

fn generator(name: &str, output: ResourceKind) -> UnitConfig {
    UnitConfig {
        name: name.into(),
        recipe: Recipe::default(),
        output,
        cycle_interval: 1.0,
        ..UnitConfig::default()
    }
}

fn player(capacity: usize, items: &[ResourceKind]) -> CarrierConfig {
    CarrierConfig {
        capacity,
        starting_items: items.to_vec(),
        ..CarrierConfig::default()
    }
}

/// Advance in 100 ms frames so every intermediate state is observed.
fn run_for(engine: &mut SimulationEngine, ms: u64, mut check: impl FnMut(&SimulationEngine)) {
    for _ in 0..ms / 100 {
        engine.advance(100);
        check(engine);
    }
}

fn session_end(events: &[SimEvent], actor: Entity) -> Option<SessionEnd> {
    events.iter().find_map(|e| match e {
        SimEvent::SessionEnded { actor: a, reason, .. } if *a == actor => Some(*reason),
        _ => None,
    })
}

fn kinds(items: &[stockpile_logic::resources::Resource]) -> Vec<ResourceKind> {
    items.iter().map(|r| r.kind).collect()
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn deposit_then_produce() {
    init_logging();
    let mut engine = SimulationEngine::new();
    let building = engine.spawn_building(warehouse()).unwrap();
    let actor = engine.spawn_actor(player(5, &[A, A, B])).unwrap();
    assert_eq!(engine.status(building).unwrap(), UnitStatus::NoSupplies);

    engine.enter_zone(actor, building, Zone::Receive).unwrap();
    run_for(&mut engine, 4_000, |e| {
        assert!(e.supply_contents(building).unwrap().len() <= 5);
    });

    let events = engine.drain_events();
    assert_eq!(session_end(&events, actor), Some(SessionEnd::BackpackEmpty));
    assert!(engine.active_session(actor).is_none());
    assert!(engine.backpack_contents(actor).unwrap().is_empty());
    assert!(engine.supply_contents(building).unwrap().is_empty());

    let products = engine.production_contents(building).unwrap();
    assert_eq!(kinds(&products), vec![C]);
    assert!(!products[0].in_transit());
    assert_eq!(engine.status_line(building).unwrap(), "Warehouse: ok");

    let consumed: usize = events
        .iter()
        .map(|e| match e {
            SimEvent::ItemsConsumed { items, .. } => items.len(),
            _ => 0,
        })
        .sum();
    assert_eq!(consumed, 3);
}

#[test]
fn missing_input_keeps_supply() {
    let mut engine = SimulationEngine::new();
    let building = engine.spawn_building(warehouse()).unwrap();
    let actor = engine.spawn_actor(player(5, &[A, B])).unwrap();

    engine.enter_zone(actor, building, Zone::Receive).unwrap();
    run_for(&mut engine, 4_000, |_| {});

    assert_eq!(engine.status(building).unwrap(), UnitStatus::NoSupplies);
    assert_eq!(engine.supply_contents(building).unwrap().len(), 2);
    assert!(engine.production_contents(building).unwrap().is_empty());
}

#[test]
fn deposit_leaves_unaccepted_items() {
    let mut engine = SimulationEngine::new();
    let building = engine
        .spawn_building(UnitConfig {
            recipe: Recipe::new(vec![A]),
            ..warehouse()
        })
        .unwrap();
    let actor = engine.spawn_actor(player(2, &[A, B])).unwrap();

    engine.enter_zone(actor, building, Zone::Receive).unwrap();
    run_for(&mut engine, 1_000, |_| {});

    let events = engine.drain_events();
    assert_eq!(session_end(&events, actor), Some(SessionEnd::NothingAcceptable));
    assert_eq!(kinds(&engine.backpack_contents(actor).unwrap()), vec![B]);
}

#[test]
fn cancelled_withdraw_loses_nothing() {
    init_logging();
    let mut engine = SimulationEngine::new();
    let mine = engine.spawn_building(generator("Mine", C)).unwrap();
    let actor = engine.spawn_actor(player(3, &[])).unwrap();

    engine.advance(2_500);
    engine.enter_zone(actor, mine, Zone::Release).unwrap();
    engine.advance(0);
    assert_eq!(engine.backpack_contents(actor).unwrap().len(), 1);
    assert!(engine.backpack_contents(actor).unwrap()[0].in_transit());

    // leave between two session ticks
    engine.advance(200);
    assert!(engine.exit_zone(actor).unwrap());
    assert!(!engine.exit_zone(actor).unwrap());
    engine.advance(3_000);

    let backpack = engine.backpack_contents(actor).unwrap();
    let production = engine.production_contents(mine).unwrap();
    assert_eq!(backpack.len(), 1);
    assert!(backpack.iter().chain(&production).all(|r| !r.in_transit()));
    assert_eq!(engine.in_flight(), 0);

    let events = engine.drain_events();
    let produced = events
        .iter()
        .filter(|e| matches!(e, SimEvent::ItemProduced { .. }))
        .count();
    assert_eq!(backpack.len() + production.len(), produced);
    assert_eq!(session_end(&events, actor), Some(SessionEnd::Cancelled));

    let ids: HashSet<ResourceId> = backpack.iter().chain(&production).map(|r| r.id).collect();
    assert_eq!(ids.len(), produced, "no item is in two containers");

    assert!(engine.release_resource(mine).unwrap().is_some());
}

#[test]
fn two_actors_never_overfill_supply() {
    let mut engine = SimulationEngine::new();
    let building = engine
        .spawn_building(UnitConfig {
            supply_capacity: 2,
            recipe: Recipe::new(vec![A, A]),
            cycle_interval: 100.0,
            poll_interval: 50.0,
            ..warehouse()
        })
        .unwrap();
    let first = engine.spawn_actor(player(2, &[A, A])).unwrap();
    let second = engine.spawn_actor(player(2, &[A, A])).unwrap();

    engine.enter_zone(first, building, Zone::Receive).unwrap();
    engine.enter_zone(second, building, Zone::Receive).unwrap();
    run_for(&mut engine, 5_000, |e| {
        let held = e.supply_contents(building).unwrap().len()
            + e.backpack_contents(first).unwrap().len()
            + e.backpack_contents(second).unwrap().len();
        assert_eq!(held, 4);
        assert!(e.supply_contents(building).unwrap().len() <= 2);
    });

    assert_eq!(engine.supply_contents(building).unwrap().len(), 2);
    // acceptable items remain, so both keep retrying
    assert!(engine.active_session(first).is_some());
    assert!(engine.active_session(second).is_some());
}

#[test]
fn reentering_replaces_session() {
    let mut engine = SimulationEngine::new();
    let building = engine.spawn_building(warehouse()).unwrap();
    let actor = engine.spawn_actor(player(2, &[])).unwrap();

    engine.enter_zone(actor, building, Zone::Receive).unwrap();
    engine.enter_zone(actor, building, Zone::Release).unwrap();
    assert_eq!(
        engine.active_session(actor),
        Some((building, Zone::Release.direction()))
    );
    let events = engine.drain_events();
    assert_eq!(session_end(&events, actor), Some(SessionEnd::Cancelled));

    // the cancelled deposit never runs, so no BackpackEmpty end is reported
    engine.advance(1_000);
    assert!(session_end(&engine.drain_events(), actor).is_none());
}

#[test]
fn destroyed_building_ends_sessions_and_settles_outgoing() {
    let mut engine = SimulationEngine::new();
    let mine = engine.spawn_building(generator("Mine", C)).unwrap();
    let actor = engine.spawn_actor(player(3, &[])).unwrap();

    engine.advance(1_500);
    engine.enter_zone(actor, mine, Zone::Release).unwrap();
    engine.advance(0);
    assert!(engine.backpack_contents(actor).unwrap()[0].in_transit());

    engine.destroy_building(mine).unwrap();
    assert_eq!(engine.building_count(), 0);
    assert_eq!(
        session_end(&engine.drain_events(), actor),
        Some(SessionEnd::UnitGone)
    );

    engine.advance(2_000);
    let backpack = engine.backpack_contents(actor).unwrap();
    assert_eq!(backpack.len(), 1);
    assert!(!backpack[0].in_transit());
    assert_eq!(engine.pending_tasks(), 0);
    assert!(engine.destroy_building(mine).is_err());
}

#[test]
fn deposit_below_settling_item_retargets_it() {
    let mut engine = SimulationEngine::new();
    let mine = engine.spawn_building(generator("Mine", C)).unwrap();
    let smelter = engine
        .spawn_building(UnitConfig {
            name: "Smelter".into(),
            recipe: Recipe::new(vec![A]),
            ..warehouse()
        })
        .unwrap();
    let actor = engine.spawn_actor(player(3, &[A, B])).unwrap();

    engine.advance(1_000);
    engine.enter_zone(actor, mine, Zone::Release).unwrap();
    engine.advance(0);
    let collected = engine
        .drain_events()
        .into_iter()
        .find_map(|e| match e {
            SimEvent::TransferStarted { placement, to, slot, .. }
                if to == ContainerRef::backpack(actor) =>
            {
                Some((placement, slot))
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(collected.1, 2);

    engine.enter_zone(actor, smelter, Zone::Receive).unwrap();
    engine.advance(0);
    let events = engine.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::PlacementRetargeted { placement, slot: 1, .. } if *placement == collected.0
    )));
    assert_eq!(engine.placement(collected.0).unwrap().slot, 1);
    assert_eq!(kinds(&engine.backpack_contents(actor).unwrap()), vec![B, C]);
}

// ── Randomized traffic ────────────────────────────────────────────────

#[test]
fn random_zone_traffic_conserves_items() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut engine = SimulationEngine::new();
    let buildings = [
        engine.spawn_building(generator("Quarry", A)).unwrap(),
        engine.spawn_building(generator("Forest", B)).unwrap(),
        engine.spawn_building(warehouse()).unwrap(),
    ];
    let actors = [
        engine.spawn_actor(player(3, &[A])).unwrap(),
        engine.spawn_actor(player(2, &[])).unwrap(),
    ];
    let mut produced = 0usize;
    let mut consumed = 0usize;

    for _ in 0..800 {
        let actor = actors[rng.gen_range(0..actors.len())];
        match rng.gen_range(0..4) {
            0 => {
                engine.exit_zone(actor).unwrap();
            }
            1 => {}
            _ => {
                let building = buildings[rng.gen_range(0..buildings.len())];
                let zone = if rng.gen_bool(0.5) { Zone::Receive } else { Zone::Release };
                engine.enter_zone(actor, building, zone).unwrap();
            }
        }
        engine.advance(rng.gen_range(0..400));

        for event in engine.drain_events() {
            match event {
                SimEvent::ItemProduced { .. } => produced += 1,
                SimEvent::ItemsConsumed { items, .. } => consumed += items.len(),
                _ => {}
            }
        }

        let mut held = Vec::new();
        for &b in &buildings {
            let supply = engine.supply_contents(b).unwrap();
            let production = engine.production_contents(b).unwrap();
            assert!(supply.len() <= 5);
            assert!(production.len() <= 3);
            held.extend(supply);
            held.extend(production);
        }
        for &a in &actors {
            let backpack = engine.backpack_contents(a).unwrap();
            assert!(backpack.len() <= engine.backpack_capacity(a).unwrap());
            held.extend(backpack);
        }

        assert_eq!(held.len(), 1 + produced - consumed);
        let locked = held.iter().filter(|r| r.in_transit()).count();
        assert_eq!(locked, engine.in_flight());
        let ids: HashSet<ResourceId> = held.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), held.len());
    }
}
