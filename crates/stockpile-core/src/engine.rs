//! Simulation engine - main entry point for running the simulation

use hecs::{Entity, World};
use stockpile_logic::carrier::Carrier;
use stockpile_logic::config::{CarrierConfig, ScenarioConfig, UnitConfig};
use stockpile_logic::production::{ProductionUnit, UnitStatus};
use stockpile_logic::resources::{IdGen, Palette, PlacementId, Resource, ResourceId, ResourceKind};
use stockpile_logic::transfer::{Direction, SessionEnd, TransferSession};

use crate::components::*;
use crate::error::EngineError;
use crate::events::{EventLog, SimEvent};
use crate::placement::{Placement, PlacementBook};
use crate::scheduler::{Task, Timeline};
use crate::systems::*;

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world containing buildings and actors
    pub world: World,
    /// Simulation time in milliseconds since start
    now_ms: u64,
    /// Sub-millisecond remainder carried between updates
    carry_ms: f64,
    timeline: Timeline,
    ids: IdGen,
    placements: PlacementBook,
    events: EventLog,
    palette: Palette,

    // Configuration
    time_scale: f32,
}

impl SimulationEngine {
    /// Create a new empty simulation
    pub fn new() -> Self {
        Self {
            world: World::new(),
            now_ms: 0,
            carry_ms: 0.0,
            timeline: Timeline::new(),
            ids: IdGen::new(),
            placements: PlacementBook::new(),
            events: EventLog::new(),
            palette: Palette::default(),
            time_scale: 1.0,
        }
    }

    /// Build an engine with every building and actor of `scenario`.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self, EngineError> {
        scenario.validate()?;
        let mut engine = Self::new();
        engine.palette = scenario.palette.clone();
        for building in &scenario.buildings {
            engine.spawn_building(building.clone())?;
        }
        for actor in &scenario.actors {
            engine.spawn_actor(actor.clone())?;
        }
        Ok(engine)
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Spawn a building. Its first production pass runs on the next update.
    pub fn spawn_building(&mut self, config: UnitConfig) -> Result<Entity, EngineError> {
        config.validate()?;
        let unit = ProductionUnit::new(&config);
        let handle = CycleHandle::default();
        let token = handle.token.clone();
        let entity = self
            .world
            .spawn((Name(config.name.clone()), unit, handle));
        self.timeline.schedule(self.now_ms, Task::Cycle(entity), token);
        log::info!(
            "spawned building {} ({:?}): recipe {:?} → {}",
            config.name,
            entity,
            config.recipe.inputs(),
            config.output
        );
        Ok(entity)
    }

    /// Spawn an actor with its starting items already settled in the backpack.
    pub fn spawn_actor(&mut self, config: CarrierConfig) -> Result<Entity, EngineError> {
        config.validate()?;
        let mut carrier = Carrier::with_layout(config.capacity, config.layout);
        for &kind in &config.starting_items {
            carrier.stock(self.ids.spawn(kind))?;
        }
        let actor = Actor {
            transfer_ms: config.transfer_ms(),
            settle_ms: config.settle_ms(),
        };
        let entity = self
            .world
            .spawn((Name(config.name.clone()), actor, carrier));
        log::info!("spawned actor {} ({:?})", config.name, entity);
        Ok(entity)
    }

    /// Destroy a building: its cycle stops, items settling into it are
    /// dropped with it, and sessions against it end with `UnitGone`.
    /// Products already on their way into a backpack still settle.
    pub fn destroy_building(&mut self, building: Entity) -> Result<(), EngineError> {
        self.require_building(building)?;
        self.world.get::<&CycleHandle>(building)?.token.cancel();
        let dropped = self.placements.cancel_into(building);

        let visitors: Vec<Entity> = self
            .world
            .query::<&ActiveSession>()
            .iter()
            .filter(|(_, s)| s.0.target == building)
            .map(|(e, _)| e)
            .collect();
        for actor in visitors {
            self.end_session(actor, SessionEnd::UnitGone);
        }

        let _ = self.world.despawn(building);
        log::info!(
            "destroyed building {:?} ({} placements dropped)",
            building,
            dropped.len()
        );
        Ok(())
    }

    pub fn destroy_actor(&mut self, actor: Entity) -> Result<(), EngineError> {
        self.require_actor(actor)?;
        self.end_session(actor, SessionEnd::Cancelled);
        self.placements.cancel_into(actor);
        let _ = self.world.despawn(actor);
        log::info!("destroyed actor {:?}", actor);
        Ok(())
    }

    // ── Zones ──────────────────────────────────────────────────────────

    /// Start a session for `actor` against `building`, replacing any session
    /// the actor was running. The first step runs on the next update.
    pub fn enter_zone(
        &mut self,
        actor: Entity,
        building: Entity,
        zone: Zone,
    ) -> Result<(), EngineError> {
        self.require_building(building)?;
        let transfer_ms = self
            .world
            .get::<&Actor>(actor)
            .map_err(|_| EngineError::NoSuchActor(actor))?
            .transfer_ms;
        self.end_session(actor, SessionEnd::Cancelled);

        let unit_ms = self.world.get::<&ProductionUnit>(building)?.transfer_ms();
        let interval = TransferSession::<Entity>::interval_for(transfer_ms, unit_ms);
        let direction = zone.direction();
        let session = TransferSession::new(direction, building, interval);
        let token = session.token().clone();
        self.world
            .insert_one(actor, ActiveSession(session))
            .map_err(|_| EngineError::NoSuchActor(actor))?;
        self.timeline.schedule(self.now_ms, Task::Session(actor), token);

        log::info!(
            "{:?} entered {:?} zone of {:?} ({:?} every {} ms)",
            actor,
            zone,
            building,
            direction,
            interval
        );
        self.events.push(SimEvent::SessionStarted {
            actor,
            building,
            direction,
        });
        Ok(())
    }

    /// Cancel the actor's session. Returns whether one was running.
    pub fn exit_zone(&mut self, actor: Entity) -> Result<bool, EngineError> {
        self.require_actor(actor)?;
        Ok(self.end_session(actor, SessionEnd::Cancelled))
    }

    fn end_session(&mut self, actor: Entity, reason: SessionEnd) -> bool {
        let Ok(ActiveSession(session)) = self.world.remove_one::<ActiveSession>(actor) else {
            return false;
        };
        session.cancel();
        log::info!(
            "{:?} session with {:?} ended: {}",
            actor,
            session.target,
            reason.label()
        );
        self.events.push(SimEvent::SessionEnded {
            actor,
            building: session.target,
            reason,
        });
        true
    }

    // ── Direct container access ────────────────────────────────────────

    /// Hand a new item of `kind` to a building's supply from outside the
    /// model. Returns false, creating nothing, when the supply is full.
    pub fn receive_resource(
        &mut self,
        building: Entity,
        kind: ResourceKind,
    ) -> Result<bool, EngineError> {
        let result = {
            let mut unit = self
                .world
                .get::<&mut ProductionUnit>(building)
                .map_err(|_| EngineError::NoSuchBuilding(building))?;
            if !unit.can_receive() {
                return Ok(false);
            }
            let item = self.ids.spawn(kind);
            let placement = self.ids.placement();
            (unit.receive_resource(item, placement), unit.settle_ms())
        };
        match result {
            (Ok(placed), settle_ms) => {
                let (_, mut ctx) = self.split();
                begin_placement(
                    &mut ctx,
                    &placed,
                    None,
                    ContainerRef::supply(building),
                    settle_ms,
                );
                Ok(true)
            }
            (Err(_), _) => Ok(false),
        }
    }

    /// Take the most recent settled product out of a building.
    pub fn release_resource(&mut self, building: Entity) -> Result<Option<Resource>, EngineError> {
        let released = self
            .world
            .get::<&mut ProductionUnit>(building)
            .map_err(|_| EngineError::NoSuchBuilding(building))?
            .release_resource();
        self.flush(building)?;
        Ok(released)
    }

    /// Put a new settled item in an actor's backpack. Returns `None` when full.
    pub fn give_item(
        &mut self,
        actor: Entity,
        kind: ResourceKind,
    ) -> Result<Option<ResourceId>, EngineError> {
        let mut carrier = self
            .world
            .get::<&mut Carrier>(actor)
            .map_err(|_| EngineError::NoSuchActor(actor))?;
        if carrier.is_full() {
            return Ok(None);
        }
        let item = self.ids.spawn(kind);
        let id = item.id;
        carrier.stock(item)?;
        Ok(Some(id))
    }

    // ── Time ───────────────────────────────────────────────────────────

    /// Update the simulation by delta_seconds
    ///
    /// Every task due within the advanced window runs, in due-time order,
    /// each one atomically.
    pub fn update(&mut self, delta_seconds: f32) {
        let scaled = delta_seconds.max(0.0) as f64 * self.time_scale as f64 * 1000.0;
        if !scaled.is_finite() {
            log::warn!("ignoring non-finite update of {} s", delta_seconds);
            return;
        }
        self.carry_ms += scaled;
        let whole = self.carry_ms.floor();
        self.carry_ms -= whole;
        self.advance(whole as u64);
    }

    /// Advance the clock by exactly `ms` milliseconds of simulation time,
    /// stopping one millisecond short of `u64::MAX`.
    pub fn advance(&mut self, ms: u64) {
        // tasks whose due time saturated at u64::MAX never come due
        let target = self.now_ms.saturating_add(ms).min(u64::MAX - 1);
        while let Some(scheduled) = self.timeline.pop_due(target) {
            self.now_ms = self.now_ms.max(scheduled.due);
            if let Err(e) = self.run_task(scheduled.task) {
                log::warn!("{:?} failed: {}", scheduled.task, e);
            }
        }
        self.now_ms = target;
    }

    fn run_task(&mut self, task: Task) -> Result<(), EngineError> {
        let (world, mut ctx) = self.split();
        match task {
            Task::Cycle(building) => production_cycle_system(world, &mut ctx, building),
            Task::Settle(id) => settle_system(world, &mut ctx, id),
            Task::Session(actor) => match transfer_session_system(world, &mut ctx, actor) {
                Ok(Some(reason)) => {
                    self.end_session(actor, reason);
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(e) => {
                    self.end_session(actor, SessionEnd::Cancelled);
                    Err(e)
                }
            },
        }
    }

    /// Borrow the world and the task context side by side.
    fn split(&mut self) -> (&World, TaskContext<'_>) {
        (
            &self.world,
            TaskContext {
                now: self.now_ms,
                ids: &mut self.ids,
                timeline: &mut self.timeline,
                placements: &mut self.placements,
                events: &mut self.events,
            },
        )
    }

    fn flush(&mut self, owner: Entity) -> Result<(), EngineError> {
        let (world, mut ctx) = self.split();
        flush_retargets(world, &mut ctx, owner)
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Simulation time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    // ── Events ─────────────────────────────────────────────────────────

    pub fn pop_event(&mut self) -> Option<SimEvent> {
        self.events.pop()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Events lost because the queue filled up before it was drained
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn status(&self, building: Entity) -> Result<UnitStatus, EngineError> {
        self.with_unit(building, |u| u.status())
    }

    /// e.g. `"Warehouse: ok"`
    pub fn status_line(&self, building: Entity) -> Result<String, EngineError> {
        self.with_unit(building, |u| u.status_line())
    }

    pub fn supply_contents(&self, building: Entity) -> Result<Vec<Resource>, EngineError> {
        self.with_unit(building, |u| u.supply().contents().to_vec())
    }

    pub fn production_contents(&self, building: Entity) -> Result<Vec<Resource>, EngineError> {
        self.with_unit(building, |u| u.production().contents().to_vec())
    }

    /// Backpack items, oldest first
    pub fn backpack_contents(&self, actor: Entity) -> Result<Vec<Resource>, EngineError> {
        self.with_carrier(actor, |c| c.contents().to_vec())
    }

    pub fn backpack_remaining(&self, actor: Entity) -> Result<usize, EngineError> {
        self.with_carrier(actor, |c| c.remaining())
    }

    pub fn backpack_capacity(&self, actor: Entity) -> Result<usize, EngineError> {
        self.with_carrier(actor, |c| c.capacity())
    }

    /// Building and direction of the actor's running session
    pub fn active_session(&self, actor: Entity) -> Option<(Entity, Direction)> {
        self.world
            .get::<&ActiveSession>(actor)
            .ok()
            .map(|s| (s.0.target, s.0.direction))
    }

    pub fn placement(&self, id: PlacementId) -> Option<&Placement> {
        self.placements.get(id)
    }

    /// Placements that have not settled yet
    pub fn in_flight(&self) -> usize {
        self.placements.len()
    }

    pub fn building_count(&self) -> usize {
        self.world.query::<&ProductionUnit>().iter().count()
    }

    pub fn actor_count(&self) -> usize {
        self.world.query::<&Actor>().iter().count()
    }

    pub fn buildings(&self) -> Vec<Entity> {
        self.world
            .query::<&ProductionUnit>()
            .iter()
            .map(|(e, _)| e)
            .collect()
    }

    pub fn actors(&self) -> Vec<Entity> {
        self.world.query::<&Actor>().iter().map(|(e, _)| e).collect()
    }

    pub fn name(&self, entity: Entity) -> Option<String> {
        self.world.get::<&Name>(entity).ok().map(|n| n.0.clone())
    }

    /// Material bound to `kind` for rendering
    pub fn material(&self, kind: ResourceKind) -> &str {
        self.palette.material(kind)
    }

    /// Live tasks queued on the timeline
    pub fn pending_tasks(&self) -> usize {
        self.timeline.live_count()
    }

    fn with_unit<R>(
        &self,
        building: Entity,
        f: impl FnOnce(&ProductionUnit) -> R,
    ) -> Result<R, EngineError> {
        let unit = self
            .world
            .get::<&ProductionUnit>(building)
            .map_err(|_| EngineError::NoSuchBuilding(building))?;
        Ok(f(&unit))
    }

    fn with_carrier<R>(
        &self,
        actor: Entity,
        f: impl FnOnce(&Carrier) -> R,
    ) -> Result<R, EngineError> {
        let carrier = self
            .world
            .get::<&Carrier>(actor)
            .map_err(|_| EngineError::NoSuchActor(actor))?;
        Ok(f(&carrier))
    }

    fn require_building(&self, building: Entity) -> Result<(), EngineError> {
        self.with_unit(building, |_| ())
    }

    fn require_actor(&self, actor: Entity) -> Result<(), EngineError> {
        self.with_carrier(actor, |_| ())
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpile_logic::recipe::Recipe;
    use ResourceKind::*;

    fn generator(cycle_interval: f32) -> UnitConfig {
        UnitConfig {
            name: "Well".into(),
            recipe: Recipe::default(),
            output: Resource1,
            cycle_interval,
            ..UnitConfig::default()
        }
    }

    #[test]
    fn test_engine_creation() {
        let engine = SimulationEngine::new();
        assert_eq!(engine.building_count(), 0);
        assert_eq!(engine.actor_count(), 0);
        assert_eq!(engine.now_ms(), 0);
    }

    #[test]
    fn test_time_scale() {
        let mut engine = SimulationEngine::new();
        engine.set_time_scale(2.0);
        engine.update(1.0); // 1 real second = 2 sim seconds
        assert_eq!(engine.now_ms(), 2_000);

        engine.set_time_scale(-1.0);
        assert_eq!(engine.time_scale(), 0.0);
        engine.update(1.0);
        assert_eq!(engine.now_ms(), 2_000);
    }

    #[test]
    fn test_non_finite_time_is_ignored() {
        let mut engine = SimulationEngine::new();
        engine.spawn_building(generator(1.0)).unwrap();
        engine.update(1.0);
        engine.update(f32::INFINITY);
        engine.update(f32::NAN);
        assert_eq!(engine.now_ms(), 1_000);

        // the clock keeps running afterwards
        engine.update(0.5);
        assert_eq!(engine.now_ms(), 1_500);

        engine.set_time_scale(f32::INFINITY);
        assert_eq!(engine.time_scale(), 0.0);
        engine.update(1.0);
        assert_eq!(engine.now_ms(), 1_500);
    }

    #[test]
    fn test_advance_saturates_at_end_of_time() {
        let mut engine = SimulationEngine::new();
        engine.advance(u64::MAX);
        engine.advance(1_000);
        engine.update(5.0);
        assert_eq!(engine.now_ms(), u64::MAX - 1);
    }

    #[test]
    fn test_fractional_updates_accumulate() {
        let mut engine = SimulationEngine::new();
        for _ in 0..10 {
            engine.update(0.0005);
        }
        assert_eq!(engine.now_ms(), 5);
    }

    #[test]
    fn test_generator_produces_and_settles() {
        let mut engine = SimulationEngine::new();
        let well = engine.spawn_building(generator(1.0)).unwrap();
        assert_eq!(engine.status(well).unwrap(), UnitStatus::Ok);

        engine.advance(0);
        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::ItemProduced { building, kind: Resource1, .. } if *building == well)));
        let products = engine.production_contents(well).unwrap();
        assert_eq!(products.len(), 1);
        assert!(products[0].in_transit());
        assert_eq!(engine.in_flight(), 1);

        engine.advance(1_000);
        let products = engine.production_contents(well).unwrap();
        assert_eq!(products.len(), 2);
        assert!(!products[0].in_transit(), "first product settled");
        assert!(products[1].in_transit(), "second product just produced");
        assert_eq!(engine.in_flight(), 1);
    }

    #[test]
    fn test_full_production_reports_no_space() {
        let mut engine = SimulationEngine::new();
        let well = engine
            .spawn_building(UnitConfig {
                production_capacity: 1,
                ..generator(1.0)
            })
            .unwrap();
        engine.advance(1_000);
        assert_eq!(engine.status(well).unwrap(), UnitStatus::NoSpace);
        assert_eq!(engine.status_line(well).unwrap(), "Well: no space");
        assert_eq!(engine.production_contents(well).unwrap().len(), 1);
    }

    #[test]
    fn test_receive_resource_respects_capacity() {
        let mut engine = SimulationEngine::new();
        let warehouse = engine
            .spawn_building(UnitConfig {
                supply_capacity: 2,
                recipe: Recipe::new(vec![Resource1, Resource1]),
                ..UnitConfig::default()
            })
            .unwrap();
        assert!(engine.receive_resource(warehouse, Resource2).unwrap());
        assert!(engine.receive_resource(warehouse, Resource2).unwrap());
        assert!(!engine.receive_resource(warehouse, Resource2).unwrap());
        assert_eq!(engine.supply_contents(warehouse).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_entities_are_errors() {
        let mut engine = SimulationEngine::new();
        let actor = engine.spawn_actor(CarrierConfig::default()).unwrap();
        assert!(matches!(
            engine.status(actor),
            Err(EngineError::NoSuchBuilding(_))
        ));
        let well = engine.spawn_building(generator(1.0)).unwrap();
        assert!(matches!(
            engine.enter_zone(well, well, Zone::Release),
            Err(EngineError::NoSuchActor(_))
        ));
        assert!(matches!(
            engine.release_resource(actor),
            Err(EngineError::NoSuchBuilding(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut engine = SimulationEngine::new();
        let result = engine.spawn_building(UnitConfig {
            name: String::new(),
            ..UnitConfig::default()
        });
        assert!(matches!(result, Err(EngineError::Config(_))));
        assert_eq!(engine.building_count(), 0);
    }

    #[test]
    fn test_give_item_until_full() {
        let mut engine = SimulationEngine::new();
        let actor = engine
            .spawn_actor(CarrierConfig {
                capacity: 1,
                ..CarrierConfig::default()
            })
            .unwrap();
        assert!(engine.give_item(actor, Resource1).unwrap().is_some());
        assert!(engine.give_item(actor, Resource1).unwrap().is_none());
        assert_eq!(engine.backpack_remaining(actor).unwrap(), 0);
    }
}
