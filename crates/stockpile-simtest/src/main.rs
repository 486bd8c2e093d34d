//! Stockpile Headless Simulation Harness
//!
//! Validates the inventory model and the engine's timed sessions without a
//! renderer. Runs entirely in-process: no window, no input.
//!
//! Usage:
//!   cargo run -p stockpile-simtest
//!   cargo run -p stockpile-simtest -- --verbose
//!   cargo run -p stockpile-simtest -- --scenario path/to/scenario.json --seed 7

use hecs::Entity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stockpile_core::prelude::*;
use stockpile_logic::carrier::Carrier;
use stockpile_logic::config::{CarrierConfig, ScenarioConfig, UnitConfig};
use stockpile_logic::production::{ProductionUnit, Side, UnitStatus};
use stockpile_logic::recipe::Recipe;
use stockpile_logic::resources::{IdGen, ResourceKind};
use stockpile_logic::storage::Storage;
use stockpile_logic::transfer::SessionEnd;

// ── Bundled scenario (same JSON a game client would ship) ──────────────
const SCENARIO_JSON: &str = include_str!("../../../data/scenario.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn result(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

struct Options {
    verbose: bool,
    scenario: Option<String>,
    seed: u64,
}

fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let value_of = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    Options {
        verbose: args.iter().any(|a| a == "--verbose"),
        scenario: value_of("--scenario"),
        seed: value_of("--seed")
            .and_then(|s| s.parse().ok())
            .unwrap_or(42),
    }
}

fn main() {
    env_logger::init();
    let options = parse_args();
    println!("=== Stockpile Simulation Harness ===\n");

    let json = match &options.scenario {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("cannot read {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => SCENARIO_JSON.to_string(),
    };

    let mut results = Vec::new();

    // 1. Scenario file validation
    let scenario = validate_scenario(&json, &mut results);

    // 2. Storage contract
    results.extend(validate_storage_contract(options.seed));

    // 3. Production cycle
    results.extend(validate_production_cycle());

    // 4. Transfer sessions on the engine clock
    results.extend(validate_sessions());

    // 5. Randomized soak over the scenario
    if let Some(scenario) = scenario {
        results.extend(soak_scenario(&scenario, options.seed, options.verbose));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || options.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Scenario ─────────────────────────────────────────────────────────

fn validate_scenario(json: &str, results: &mut Vec<TestResult>) -> Option<ScenarioConfig> {
    println!("--- Scenario ---");
    let scenario = match ScenarioConfig::from_json(json) {
        Ok(s) => s,
        Err(e) => {
            results.push(result("scenario_parse", false, format!("{}", e)));
            return None;
        }
    };
    results.push(result(
        "scenario_parse",
        true,
        format!(
            "{} buildings, {} actors",
            scenario.buildings.len(),
            scenario.actors.len()
        ),
    ));
    results.push(result(
        "scenario_has_buildings",
        !scenario.buildings.is_empty(),
        format!("{} buildings", scenario.buildings.len()),
    ));
    results.push(result(
        "scenario_has_actors",
        !scenario.actors.is_empty(),
        format!("{} actors", scenario.actors.len()),
    ));

    // every recipe input must be produced somewhere or the chain stalls
    let outputs: Vec<ResourceKind> = scenario.buildings.iter().map(|b| b.output).collect();
    let orphaned: Vec<String> = scenario
        .buildings
        .iter()
        .flat_map(|b| b.recipe.inputs().iter().map(move |k| (b, *k)))
        .filter(|(_, k)| !outputs.contains(k))
        .map(|(b, k)| format!("{} needs {}", b.name, k))
        .collect();
    results.push(result(
        "scenario_inputs_produced",
        orphaned.is_empty(),
        if orphaned.is_empty() {
            "every recipe input has a producer".to_string()
        } else {
            orphaned.join(", ")
        },
    ));

    let unnamed = ResourceKind::all()
        .iter()
        .filter(|k| scenario.palette.material(**k) == k.label())
        .count();
    results.push(result(
        "scenario_palette",
        true,
        format!("{} kinds fall back to their label", unnamed),
    ));
    Some(scenario)
}

// ── 2. Storage ──────────────────────────────────────────────────────────

fn validate_storage_contract(seed: u64) -> Vec<TestResult> {
    println!("--- Storage Contract ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids = IdGen::new();
    let mut storage = Storage::new(5);
    let mut locked = Vec::new();
    let mut over_capacity = 0;
    let mut popped_locked = 0;

    for _ in 0..10_000 {
        match rng.gen_range(0..3) {
            0 => {
                let kind = ResourceKind::all()[rng.gen_range(0..3)];
                let placement = ids.placement();
                let item = ids.spawn(kind);
                let id = item.id;
                if storage.put(item, placement).is_ok() {
                    locked.push((id, placement));
                }
            }
            1 => {
                if let Some(item) = storage.pop() {
                    if item.in_transit() {
                        popped_locked += 1;
                    }
                }
            }
            _ => {
                if !locked.is_empty() {
                    let (id, placement) = locked.swap_remove(rng.gen_range(0..locked.len()));
                    storage.release_transit(id, placement);
                }
            }
        }
        if storage.len() > storage.capacity() {
            over_capacity += 1;
        }
    }
    results.push(result(
        "storage_capacity_bound",
        over_capacity == 0,
        format!("{} steps over capacity", over_capacity),
    ));
    results.push(result(
        "storage_pop_skips_transit",
        popped_locked == 0,
        format!("{} in-transit items popped", popped_locked),
    ));

    // recipe atomicity
    let mut storage = Storage::new(5);
    for kind in [ResourceKind::Resource1, ResourceKind::Resource2] {
        stock_settled(&mut storage, &mut ids, kind);
    }
    let before = storage.clone();
    let recipe = Recipe::new(vec![
        ResourceKind::Resource1,
        ResourceKind::Resource1,
        ResourceKind::Resource2,
    ]);
    let unsatisfied = storage.withdraw_for_recipe(&recipe);
    results.push(result(
        "recipe_all_or_nothing",
        unsatisfied.is_err() && storage == before,
        format!("{:?}, contents unchanged: {}", unsatisfied.err(), storage == before),
    ));

    results
}

/// Put an item and settle it at once.
fn stock_settled(storage: &mut Storage, ids: &mut IdGen, kind: ResourceKind) {
    let placement = ids.placement();
    let item = ids.spawn(kind);
    let id = item.id;
    if storage.put(item, placement).is_ok() {
        storage.release_transit(id, placement);
    }
}

// ── 3. Production ───────────────────────────────────────────────────────

fn validate_production_cycle() -> Vec<TestResult> {
    println!("--- Production Cycle ---");
    let mut results = Vec::new();
    let mut ids = IdGen::new();
    let mut unit = ProductionUnit::new(&UnitConfig {
        supply_capacity: 5,
        production_capacity: 3,
        recipe: Recipe::new(vec![
            ResourceKind::Resource1,
            ResourceKind::Resource1,
            ResourceKind::Resource2,
        ]),
        output: ResourceKind::Resource3,
        ..UnitConfig::default()
    });

    let deliver = |unit: &mut ProductionUnit, ids: &mut IdGen, kinds: &[ResourceKind]| {
        for &kind in kinds {
            let placement = ids.placement();
            if let Ok(placed) = unit.receive_resource(ids.spawn(kind), placement) {
                unit.release_transit(Side::Supply, placed.item, placement);
            }
        }
    };

    deliver(
        &mut unit,
        &mut ids,
        &[
            ResourceKind::Resource1,
            ResourceKind::Resource1,
            ResourceKind::Resource2,
        ],
    );
    let report = unit.run_cycle(&mut ids);
    let ok = matches!(&report, Ok(r) if r.status == UnitStatus::Ok)
        && unit.supply().is_empty()
        && unit.production().len() == 1;
    results.push(result(
        "cycle_consumes_recipe",
        ok,
        format!(
            "supply {}, production {}",
            unit.supply().len(),
            unit.production().len()
        ),
    ));

    deliver(
        &mut unit,
        &mut ids,
        &[ResourceKind::Resource1, ResourceKind::Resource2],
    );
    let before = unit.supply().clone();
    let report = unit.run_cycle(&mut ids);
    let ok = matches!(&report, Ok(r) if r.status == UnitStatus::NoSupplies)
        && unit.supply() == &before
        && unit.production().len() == 1;
    results.push(result("cycle_missing_input", ok, unit.status_line()));

    results
}

// ── 4. Sessions ─────────────────────────────────────────────────────────

fn validate_sessions() -> Vec<TestResult> {
    println!("--- Transfer Sessions ---");
    let mut results = Vec::new();

    // deposit leaves unaccepted kinds behind
    let mut engine = SimulationEngine::new();
    let outcome = (|| -> Result<(Vec<ResourceKind>, Option<SessionEnd>), EngineError> {
        let building = engine.spawn_building(UnitConfig {
            recipe: Recipe::new(vec![ResourceKind::Resource1]),
            ..UnitConfig::default()
        })?;
        let actor = engine.spawn_actor(CarrierConfig {
            capacity: 2,
            starting_items: vec![ResourceKind::Resource1, ResourceKind::Resource2],
            ..CarrierConfig::default()
        })?;
        engine.enter_zone(actor, building, Zone::Receive)?;
        for _ in 0..20 {
            engine.update(0.1);
        }
        let left = engine
            .backpack_contents(actor)?
            .iter()
            .map(|r| r.kind)
            .collect();
        Ok((left, session_end(&engine.drain_events(), actor)))
    })();
    results.push(match outcome {
        Ok((left, end)) => result(
            "deposit_ends_when_nothing_acceptable",
            left == vec![ResourceKind::Resource2] && end == Some(SessionEnd::NothingAcceptable),
            format!("backpack {:?}, end {:?}", left, end),
        ),
        Err(e) => result("deposit_ends_when_nothing_acceptable", false, e.to_string()),
    });

    // cancelling a withdraw mid-wait strands nothing
    let mut engine = SimulationEngine::new();
    let outcome = (|| -> Result<(usize, usize, bool), EngineError> {
        let mine = engine.spawn_building(UnitConfig {
            recipe: Recipe::default(),
            cycle_interval: 1.0,
            ..UnitConfig::default()
        })?;
        let actor = engine.spawn_actor(CarrierConfig::default())?;
        engine.advance(2_500);
        engine.enter_zone(actor, mine, Zone::Release)?;
        engine.advance(200);
        engine.exit_zone(actor)?;
        engine.advance(3_000);
        let stranded = engine
            .backpack_contents(actor)?
            .iter()
            .chain(engine.production_contents(mine)?.iter())
            .filter(|r| r.in_transit())
            .count();
        let collected = engine.backpack_contents(actor)?.len();
        Ok((stranded, collected, engine.release_resource(mine)?.is_some()))
    })();
    results.push(match outcome {
        Ok((stranded, collected, popped)) => result(
            "cancelled_withdraw_is_safe",
            stranded == 0 && collected == 1 && popped,
            format!(
                "{} stranded, {} collected, pop after cancel: {}",
                stranded, collected, popped
            ),
        ),
        Err(e) => result("cancelled_withdraw_is_safe", false, e.to_string()),
    });

    results
}

fn session_end(events: &[SimEvent], actor: Entity) -> Option<SessionEnd> {
    events.iter().find_map(|e| match e {
        SimEvent::SessionEnded { actor: a, reason, .. } if *a == actor => Some(*reason),
        _ => None,
    })
}

// ── 5. Soak ─────────────────────────────────────────────────────────────

/// Actors wander between random zones for ten simulated minutes while the
/// harness checks capacity, conservation and lock bookkeeping every frame.
fn soak_scenario(scenario: &ScenarioConfig, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Soak (seed {}) ---", seed);
    let mut results = Vec::new();
    let mut engine = match SimulationEngine::from_scenario(scenario) {
        Ok(e) => e,
        Err(e) => {
            results.push(result("soak_spawn", false, e.to_string()));
            return results;
        }
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let buildings = engine.buildings();
    let actors = engine.actors();

    let mut created: usize = scenario.actors.iter().map(|a| a.starting_items.len()).sum();
    let mut consumed = 0usize;
    let mut violations: Vec<String> = Vec::new();
    let mut transfers = 0usize;
    let frames = 10 * 60 * 20;

    for frame in 0..frames {
        for &actor in &actors {
            if rng.gen_bool(0.01) {
                let building = buildings[rng.gen_range(0..buildings.len())];
                let zone = if rng.gen_bool(0.5) {
                    Zone::Receive
                } else {
                    Zone::Release
                };
                if let Err(e) = engine.enter_zone(actor, building, zone) {
                    violations.push(format!("frame {}: enter_zone: {}", frame, e));
                }
            } else if rng.gen_bool(0.005) {
                let _ = engine.exit_zone(actor);
            }
        }

        engine.update(0.05);

        for event in engine.drain_events() {
            match event {
                SimEvent::ItemProduced { .. } => created += 1,
                SimEvent::ItemsConsumed { items, .. } => consumed += items.len(),
                SimEvent::TransferCompleted { .. } => transfers += 1,
                _ => {}
            }
        }

        let mut held = 0usize;
        let mut locked = 0usize;
        for &building in &buildings {
            check_world(&engine, building, &mut held, &mut locked, &mut violations);
        }
        for &actor in &actors {
            match engine.world.get::<&Carrier>(actor) {
                Ok(carrier) => {
                    if carrier.len() > carrier.capacity() {
                        violations.push(format!("frame {}: backpack over capacity", frame));
                    }
                    held += carrier.len();
                    locked += carrier.contents().iter().filter(|r| r.in_transit()).count();
                }
                Err(e) => violations.push(format!("frame {}: {}", frame, e)),
            }
        }
        if held != created - consumed {
            violations.push(format!(
                "frame {}: {} items held, {} expected",
                frame,
                held,
                created - consumed
            ));
        }
        if locked != engine.in_flight() {
            violations.push(format!(
                "frame {}: {} locked items but {} placements in flight",
                frame,
                locked,
                engine.in_flight()
            ));
        }
        if violations.len() > 10 {
            break;
        }
    }

    if verbose {
        for &building in &buildings {
            if let Ok(line) = engine.status_line(building) {
                println!("  {}", line);
            }
        }
    }

    results.push(result(
        "soak_invariants",
        violations.is_empty(),
        if violations.is_empty() {
            format!(
                "{} created, {} consumed, {} placements settled",
                created, consumed, transfers
            )
        } else {
            violations.join("; ")
        },
    ));
    results.push(result(
        "soak_made_progress",
        transfers > 0,
        format!("{} placements settled", transfers),
    ));
    results
}

fn check_world(
    engine: &SimulationEngine,
    building: Entity,
    held: &mut usize,
    locked: &mut usize,
    violations: &mut Vec<String>,
) {
    let unit = match engine.world.get::<&ProductionUnit>(building) {
        Ok(unit) => unit,
        Err(e) => {
            violations.push(e.to_string());
            return;
        }
    };
    for side in [Side::Supply, Side::Production] {
        let storage = unit.storage(side);
        if storage.len() > storage.capacity() {
            violations.push(format!("{} {:?} over capacity", unit.name(), side));
        }
        *held += storage.len();
        *locked += storage.contents().iter().filter(|r| r.in_transit()).count();
    }
}
