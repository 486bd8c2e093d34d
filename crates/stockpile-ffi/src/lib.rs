//! C FFI bindings for the Stockpile simulation engine
//!
//! This crate provides a C-compatible API so a game engine (Unity, Godot,
//! Unreal, ...) can own rendering and input while the model owns inventory,
//! production and transfers.
//!
//! Entities cross the boundary as non-zero `uint64_t` handles; `0` means
//! "none" or "failed".
//!
//! Drain `stockpile_poll_event` every frame. The queue holds a bounded number
//! of events and drops the oldest once full; `stockpile_dropped_events`
//! reports how many were lost.
//!
//! # Basic Usage (C)
//! ```c
//! #include "stockpile.h"
//!
//! StockpileHandle sim = stockpile_create();
//! uint8_t recipe[] = { 0, 0, 1 };
//! StockpileUnitConfig cfg = stockpile_default_unit_config();
//! uint64_t warehouse = stockpile_spawn_building(sim, &cfg, recipe, 3);
//! uint64_t player = stockpile_spawn_actor(sim, 5, 0.5f, 1.0f);
//!
//! // Player trigger callback
//! stockpile_enter_zone(sim, player, warehouse, 0);
//!
//! // Game loop
//! while (running) {
//!     stockpile_update(sim, delta_time);
//!
//!     StockpileEvent ev;
//!     while (stockpile_poll_event(sim, &ev)) {
//!         // start a tween on StockpileEventKind_TransferStarted,
//!         // snap on StockpileEventKind_TransferCompleted
//!     }
//! }
//!
//! stockpile_destroy(sim);
//! ```

use std::ffi::{c_char, CStr};

use hecs::Entity;
use stockpile_core::prelude::*;
use stockpile_logic::config::{CarrierConfig, ScenarioConfig, UnitConfig};
use stockpile_logic::constants::{capacity, timing};
use stockpile_logic::recipe::Recipe;
use stockpile_logic::resources::{PlacementId, Resource, ResourceKind};

/// Opaque handle to the simulation engine
pub type StockpileHandle = *mut SimulationEngine;

/// Sentinel for "no container" / "no value" in u8 fields
pub const STOCKPILE_NONE: u8 = 255;

/// Building construction parameters
#[repr(C)]
pub struct StockpileUnitConfig {
    pub supply_capacity: u32,
    pub production_capacity: u32,
    /// Output resource kind (0-2)
    pub output: u8,
    /// Seconds between production passes
    pub cycle_interval: f32,
    /// Seconds to wait after a pass that found no supplies
    pub poll_interval: f32,
    /// Seconds an item placed into this building stays in transit
    pub settle_time: f32,
    /// Slowest transfer interval allowed against this building; <= 0 for none
    pub transfer_interval: f32,
}

/// One item in a container
#[repr(C)]
pub struct StockpileItem {
    pub id: u64,
    pub kind: u8,
    /// 1 while a placement owns the item
    pub in_transit: u8,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockpileEventKind {
    TransferStarted = 0,
    TransferCompleted = 1,
    PlacementRetargeted = 2,
    ItemsConsumed = 3,
    ItemProduced = 4,
    StatusChanged = 5,
    SessionStarted = 6,
    SessionEnded = 7,
}

/// Flattened simulation event. Fields not used by `kind` are zero
/// (or `STOCKPILE_NONE` for u8 enums).
#[repr(C)]
pub struct StockpileEvent {
    pub kind: StockpileEventKind,
    pub placement: u64,
    pub item: u64,
    pub resource_kind: u8,
    pub from_owner: u64,
    /// 0 supply, 1 production, 2 backpack
    pub from_container: u8,
    pub to_owner: u64,
    pub to_container: u8,
    pub slot: u32,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub anchor_z: f32,
    pub settle_ms: u64,
    pub building: u64,
    pub actor: u64,
    /// 0 ok, 1 no space, 2 no supplies
    pub status: u8,
    /// 0 deposit, 1 withdraw
    pub direction: u8,
    /// 0 cancelled, 1 backpack empty, 2 nothing acceptable, 3 backpack full, 4 building gone
    pub reason: u8,
    /// Number of items consumed (ItemsConsumed)
    pub count: u32,
}

impl StockpileEvent {
    fn empty(kind: StockpileEventKind) -> Self {
        Self {
            kind,
            placement: 0,
            item: 0,
            resource_kind: STOCKPILE_NONE,
            from_owner: 0,
            from_container: STOCKPILE_NONE,
            to_owner: 0,
            to_container: STOCKPILE_NONE,
            slot: 0,
            anchor_x: 0.0,
            anchor_y: 0.0,
            anchor_z: 0.0,
            settle_ms: 0,
            building: 0,
            actor: 0,
            status: STOCKPILE_NONE,
            direction: STOCKPILE_NONE,
            reason: STOCKPILE_NONE,
            count: 0,
        }
    }
}

// ============================================================================
// Lifecycle Functions
// ============================================================================

/// Route `log` output to stderr (filtered by `RUST_LOG`). Safe to call twice.
#[no_mangle]
pub extern "C" fn stockpile_init_logging() {
    let _ = env_logger::try_init();
}

/// Create a new, empty simulation engine
///
/// Returns a handle that must be freed with `stockpile_destroy`
#[no_mangle]
pub extern "C" fn stockpile_create() -> StockpileHandle {
    Box::into_raw(Box::new(SimulationEngine::new()))
}

/// Create an engine populated from a JSON scenario
///
/// Returns null if the text is not valid UTF-8 or the scenario is invalid.
#[no_mangle]
pub extern "C" fn stockpile_create_from_json(json: *const c_char) -> StockpileHandle {
    if json.is_null() {
        return std::ptr::null_mut();
    }
    let text = match unsafe { CStr::from_ptr(json) }.to_str() {
        Ok(t) => t,
        Err(_) => return std::ptr::null_mut(),
    };
    let engine = ScenarioConfig::from_json(text)
        .map_err(EngineError::from)
        .and_then(|scenario| SimulationEngine::from_scenario(&scenario));
    match engine {
        Ok(engine) => Box::into_raw(Box::new(engine)),
        Err(e) => {
            log::warn!("scenario rejected: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Destroy a simulation engine and free its memory
#[no_mangle]
pub extern "C" fn stockpile_destroy(handle: StockpileHandle) {
    if !handle.is_null() {
        unsafe {
            drop(Box::from_raw(handle));
        }
    }
}

/// Building config filled with the model's defaults
#[no_mangle]
pub extern "C" fn stockpile_default_unit_config() -> StockpileUnitConfig {
    StockpileUnitConfig {
        supply_capacity: capacity::SUPPLY as u32,
        production_capacity: capacity::PRODUCTION as u32,
        output: ResourceKind::Resource3 as u8,
        cycle_interval: timing::CYCLE_INTERVAL,
        poll_interval: timing::SUPPLY_POLL_INTERVAL,
        settle_time: timing::SETTLE_TIME,
        transfer_interval: 0.0,
    }
}

/// Spawn a building
///
/// # Parameters
/// - `config`: capacities, output kind and timings
/// - `recipe`: `recipe_len` resource kinds (0-2); may be null when `recipe_len` is 0
///
/// Returns the building handle, or 0 if the config is invalid.
#[no_mangle]
pub extern "C" fn stockpile_spawn_building(
    handle: StockpileHandle,
    config: *const StockpileUnitConfig,
    recipe: *const u8,
    recipe_len: u32,
) -> u64 {
    if handle.is_null() || config.is_null() || (recipe.is_null() && recipe_len > 0) {
        return 0;
    }

    let sim = unsafe { &mut *handle };
    let cfg = unsafe { &*config };
    let raw: &[u8] = if recipe_len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(recipe, recipe_len as usize) }
    };
    let inputs: Option<Vec<ResourceKind>> = raw.iter().map(|&k| ResourceKind::from_u8(k)).collect();
    let (Some(inputs), Some(output)) = (inputs, ResourceKind::from_u8(cfg.output)) else {
        return 0;
    };

    let config = UnitConfig {
        supply_capacity: cfg.supply_capacity as usize,
        production_capacity: cfg.production_capacity as usize,
        recipe: Recipe::new(inputs),
        output,
        cycle_interval: cfg.cycle_interval,
        poll_interval: cfg.poll_interval,
        settle_time: cfg.settle_time,
        transfer_interval: (cfg.transfer_interval > 0.0).then_some(cfg.transfer_interval),
        ..UnitConfig::default()
    };
    match sim.spawn_building(config) {
        Ok(entity) => entity_to_u64(entity),
        Err(e) => {
            log::warn!("spawn_building failed: {}", e);
            0
        }
    }
}

/// Spawn an actor with an empty backpack
///
/// Returns the actor handle, or 0 if the parameters are invalid.
#[no_mangle]
pub extern "C" fn stockpile_spawn_actor(
    handle: StockpileHandle,
    capacity: u32,
    transfer_interval: f32,
    settle_time: f32,
) -> u64 {
    if handle.is_null() {
        return 0;
    }

    let sim = unsafe { &mut *handle };
    let config = CarrierConfig {
        capacity: capacity as usize,
        transfer_interval,
        settle_time,
        ..CarrierConfig::default()
    };
    match sim.spawn_actor(config) {
        Ok(entity) => entity_to_u64(entity),
        Err(e) => {
            log::warn!("spawn_actor failed: {}", e);
            0
        }
    }
}

/// Destroy a building. Returns false if it does not exist.
#[no_mangle]
pub extern "C" fn stockpile_destroy_building(handle: StockpileHandle, building: u64) -> bool {
    with_engine(handle, building, |sim, e| sim.destroy_building(e).is_ok())
}

/// Destroy an actor. Returns false if it does not exist.
#[no_mangle]
pub extern "C" fn stockpile_destroy_actor(handle: StockpileHandle, actor: u64) -> bool {
    with_engine(handle, actor, |sim, e| sim.destroy_actor(e).is_ok())
}

// ============================================================================
// Interaction
// ============================================================================

/// Actor entered a building's zone (0 receive / deposit, 1 release / withdraw)
#[no_mangle]
pub extern "C" fn stockpile_enter_zone(
    handle: StockpileHandle,
    actor: u64,
    building: u64,
    zone: u8,
) -> bool {
    let (Some(building), Some(zone)) = (entity_from_u64(building), Zone::from_u8(zone)) else {
        return false;
    };
    with_engine(handle, actor, |sim, a| sim.enter_zone(a, building, zone).is_ok())
}

/// Actor left its zone. Returns true if a session was running.
#[no_mangle]
pub extern "C" fn stockpile_exit_zone(handle: StockpileHandle, actor: u64) -> bool {
    with_engine(handle, actor, |sim, a| sim.exit_zone(a).unwrap_or(false))
}

/// Put a settled item of `kind` in an actor's backpack. False when full.
#[no_mangle]
pub extern "C" fn stockpile_give_item(handle: StockpileHandle, actor: u64, kind: u8) -> bool {
    let Some(kind) = ResourceKind::from_u8(kind) else {
        return false;
    };
    with_engine(handle, actor, |sim, a| {
        matches!(sim.give_item(a, kind), Ok(Some(_)))
    })
}

/// Hand an item of `kind` to a building's supply. False when full.
#[no_mangle]
pub extern "C" fn stockpile_receive_resource(
    handle: StockpileHandle,
    building: u64,
    kind: u8,
) -> bool {
    let Some(kind) = ResourceKind::from_u8(kind) else {
        return false;
    };
    with_engine(handle, building, |sim, b| {
        sim.receive_resource(b, kind).unwrap_or(false)
    })
}

/// Take a settled product out of a building
///
/// Returns its kind (0-2), or -1 if there was none.
#[no_mangle]
pub extern "C" fn stockpile_release_resource(handle: StockpileHandle, building: u64) -> i32 {
    let mut kind = -1;
    with_engine(handle, building, |sim, b| {
        if let Ok(Some(item)) = sim.release_resource(b) {
            kind = item.kind as i32;
        }
        true
    });
    kind
}

// ============================================================================
// Simulation Control
// ============================================================================

/// Update the simulation by delta_seconds (in real time)
///
/// The actual simulation time advanced depends on the time scale.
#[no_mangle]
pub extern "C" fn stockpile_update(handle: StockpileHandle, delta_seconds: f32) {
    if handle.is_null() {
        return;
    }

    let sim = unsafe { &mut *handle };
    sim.update(delta_seconds);
}

/// Set the time scale (1.0 = real-time, 10.0 = 10x speed)
#[no_mangle]
pub extern "C" fn stockpile_set_time_scale(handle: StockpileHandle, scale: f32) {
    if handle.is_null() {
        return;
    }

    let sim = unsafe { &mut *handle };
    sim.set_time_scale(scale);
}

/// Get current time scale
#[no_mangle]
pub extern "C" fn stockpile_get_time_scale(handle: StockpileHandle) -> f32 {
    if handle.is_null() {
        return 0.0;
    }

    let sim = unsafe { &*handle };
    sim.time_scale()
}

/// Simulation time in milliseconds since creation
#[no_mangle]
pub extern "C" fn stockpile_now_ms(handle: StockpileHandle) -> u64 {
    if handle.is_null() {
        return 0;
    }

    let sim = unsafe { &*handle };
    sim.now_ms()
}

// ============================================================================
// Query Functions
// ============================================================================

/// Building status: 0 ok, 1 no space, 2 no supplies, -1 unknown building
#[no_mangle]
pub extern "C" fn stockpile_unit_status(handle: StockpileHandle, building: u64) -> i32 {
    let (Some(sim), Some(b)) = (engine_ref(handle), entity_from_u64(building)) else {
        return -1;
    };
    sim.status(b).map(|s| s as i32).unwrap_or(-1)
}

/// Number of items in a container (0 supply, 1 production, 2 backpack)
#[no_mangle]
pub extern "C" fn stockpile_item_count(handle: StockpileHandle, owner: u64, container: u8) -> u32 {
    contents(handle, owner, container)
        .map(|items| items.len() as u32)
        .unwrap_or(0)
}

/// Item at `index` (0 = oldest) of a container
///
/// Returns true if successful, false if the index is out of bounds
#[no_mangle]
pub extern "C" fn stockpile_get_item(
    handle: StockpileHandle,
    owner: u64,
    container: u8,
    index: u32,
    item: *mut StockpileItem,
) -> bool {
    if item.is_null() {
        return false;
    }
    let Some(items) = contents(handle, owner, container) else {
        return false;
    };
    let Some(found) = items.get(index as usize) else {
        return false;
    };

    let out = unsafe { &mut *item };
    out.id = found.id.0;
    out.kind = found.kind as u8;
    out.in_transit = found.in_transit() as u8;
    true
}

/// Free backpack slots of an actor
#[no_mangle]
pub extern "C" fn stockpile_backpack_remaining(handle: StockpileHandle, actor: u64) -> u32 {
    let (Some(sim), Some(a)) = (engine_ref(handle), entity_from_u64(actor)) else {
        return 0;
    };
    sim.backpack_remaining(a).map(|n| n as u32).unwrap_or(0)
}

/// Settle progress (0.0-1.0) of an in-flight placement, or -1 once settled
#[no_mangle]
pub extern "C" fn stockpile_placement_progress(handle: StockpileHandle, placement: u64) -> f32 {
    let Some(sim) = engine_ref(handle) else {
        return -1.0;
    };
    sim.placement(PlacementId(placement))
        .map(|p| p.progress(sim.now_ms()))
        .unwrap_or(-1.0)
}

// ============================================================================
// Events
// ============================================================================

/// Pop the oldest pending event into `event`
///
/// Returns false when the queue is empty.
#[no_mangle]
pub extern "C" fn stockpile_poll_event(handle: StockpileHandle, event: *mut StockpileEvent) -> bool {
    if handle.is_null() || event.is_null() {
        return false;
    }

    let sim = unsafe { &mut *handle };
    let Some(next) = sim.pop_event() else {
        return false;
    };
    let out = unsafe { &mut *event };
    *out = flatten_event(next);
    true
}

/// Number of events dropped because the queue was not drained in time
#[no_mangle]
pub extern "C" fn stockpile_dropped_events(handle: StockpileHandle) -> u64 {
    engine_ref(handle).map(|sim| sim.dropped_events()).unwrap_or(0)
}

// ============================================================================
// Helper Functions
// ============================================================================

fn entity_to_u64(entity: Entity) -> u64 {
    entity.to_bits().get()
}

fn entity_from_u64(bits: u64) -> Option<Entity> {
    Entity::from_bits(bits)
}

fn engine_ref<'a>(handle: StockpileHandle) -> Option<&'a SimulationEngine> {
    if handle.is_null() {
        None
    } else {
        Some(unsafe { &*handle })
    }
}

/// Run `f` on the engine and a decoded entity; false if either is invalid.
fn with_engine(
    handle: StockpileHandle,
    entity: u64,
    f: impl FnOnce(&mut SimulationEngine, Entity) -> bool,
) -> bool {
    if handle.is_null() {
        return false;
    }
    let Some(entity) = entity_from_u64(entity) else {
        return false;
    };
    let sim = unsafe { &mut *handle };
    f(sim, entity)
}

fn contents(handle: StockpileHandle, owner: u64, container: u8) -> Option<Vec<Resource>> {
    let sim = engine_ref(handle)?;
    let owner = entity_from_u64(owner)?;
    match container {
        0 => sim.supply_contents(owner).ok(),
        1 => sim.production_contents(owner).ok(),
        2 => sim.backpack_contents(owner).ok(),
        _ => None,
    }
}

fn container_fields(container: Option<ContainerRef>) -> (u64, u8) {
    container
        .map(|c| (entity_to_u64(c.owner), c.kind as u8))
        .unwrap_or((0, STOCKPILE_NONE))
}

fn reason_code(reason: stockpile_logic::transfer::SessionEnd) -> u8 {
    use stockpile_logic::transfer::SessionEnd::*;
    match reason {
        Cancelled => 0,
        BackpackEmpty => 1,
        NothingAcceptable => 2,
        BackpackFull => 3,
        UnitGone => 4,
    }
}

fn direction_code(direction: stockpile_logic::transfer::Direction) -> u8 {
    match direction {
        stockpile_logic::transfer::Direction::Deposit => 0,
        stockpile_logic::transfer::Direction::Withdraw => 1,
    }
}

fn flatten_event(event: SimEvent) -> StockpileEvent {
    match event {
        SimEvent::TransferStarted {
            placement,
            item,
            kind,
            from,
            to,
            slot,
            anchor,
            settle_ms,
        } => {
            let (from_owner, from_container) = container_fields(from);
            let (to_owner, to_container) = container_fields(Some(to));
            StockpileEvent {
                placement: placement.0,
                item: item.0,
                resource_kind: kind as u8,
                from_owner,
                from_container,
                to_owner,
                to_container,
                slot: slot as u32,
                anchor_x: anchor.x,
                anchor_y: anchor.y,
                anchor_z: anchor.z,
                settle_ms,
                ..StockpileEvent::empty(StockpileEventKind::TransferStarted)
            }
        }
        SimEvent::TransferCompleted {
            placement,
            item,
            to,
        } => {
            let (to_owner, to_container) = container_fields(Some(to));
            StockpileEvent {
                placement: placement.0,
                item: item.0,
                to_owner,
                to_container,
                ..StockpileEvent::empty(StockpileEventKind::TransferCompleted)
            }
        }
        SimEvent::PlacementRetargeted {
            placement,
            item,
            to,
            slot,
            anchor,
        } => {
            let (to_owner, to_container) = container_fields(Some(to));
            StockpileEvent {
                placement: placement.0,
                item: item.0,
                to_owner,
                to_container,
                slot: slot as u32,
                anchor_x: anchor.x,
                anchor_y: anchor.y,
                anchor_z: anchor.z,
                ..StockpileEvent::empty(StockpileEventKind::PlacementRetargeted)
            }
        }
        SimEvent::ItemsConsumed { building, items } => StockpileEvent {
            building: entity_to_u64(building),
            count: items.len() as u32,
            ..StockpileEvent::empty(StockpileEventKind::ItemsConsumed)
        },
        SimEvent::ItemProduced {
            building,
            item,
            kind,
        } => StockpileEvent {
            building: entity_to_u64(building),
            item: item.0,
            resource_kind: kind as u8,
            ..StockpileEvent::empty(StockpileEventKind::ItemProduced)
        },
        SimEvent::StatusChanged { building, status } => StockpileEvent {
            building: entity_to_u64(building),
            status: status as u8,
            ..StockpileEvent::empty(StockpileEventKind::StatusChanged)
        },
        SimEvent::SessionStarted {
            actor,
            building,
            direction,
        } => StockpileEvent {
            actor: entity_to_u64(actor),
            building: entity_to_u64(building),
            direction: direction_code(direction),
            ..StockpileEvent::empty(StockpileEventKind::SessionStarted)
        },
        SimEvent::SessionEnded {
            actor,
            building,
            reason,
        } => StockpileEvent {
            actor: entity_to_u64(actor),
            building: entity_to_u64(building),
            reason: reason_code(reason),
            ..StockpileEvent::empty(StockpileEventKind::SessionEnded)
        },
    }
}
