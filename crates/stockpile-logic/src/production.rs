//! Production buildings.
//!
//! A building owns a supply storage (filled by actors, drained by its recipe)
//! and a production storage (filled by its own cycle, drained by actors).
//! Actors may only write to supply and only read from production.
//!
//! The production cycle is a perpetual loop of passes, each pass running
//! `CheckProductionSpace → CheckSupplies → Producing` without suspension and
//! ending in a wait:
//!
//! | Outcome | Status | Wait |
//! |---------|--------|------|
//! | production full | `NoSpace` | cycle interval |
//! | recipe unsatisfied | `NoSupplies` | poll interval |
//! | produced one item | `Ok` | cycle interval |

use crate::config::UnitConfig;
use crate::error::StorageError;
use crate::layout::Vec3;
use crate::recipe::Recipe;
use crate::resources::{IdGen, PlacementId, Resource, ResourceId, ResourceKind};
use crate::stack::Retarget;
use crate::storage::Storage;

/// Observable state of a building, shown by status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitStatus {
    Ok = 0,
    NoSpace = 1,
    NoSupplies = 2,
}

impl UnitStatus {
    pub fn label(&self) -> &'static str {
        match self {
            UnitStatus::Ok => "ok",
            UnitStatus::NoSpace => "no space",
            UnitStatus::NoSupplies => "no supplies",
        }
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Steps of one production pass. Between passes the unit is idle, waiting
/// on the scheduler for `CycleReport::wait_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    CheckProductionSpace,
    CheckSupplies,
    Producing,
}

/// Which of a building's two storages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Supply,
    Production,
}

/// An item entering a container slot, locked to `placement` until it settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placed {
    pub item: ResourceId,
    pub kind: ResourceKind,
    pub placement: PlacementId,
    pub slot: usize,
    pub anchor: Vec3,
}

/// Result of one production pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub status: UnitStatus,
    /// Status before this pass differed from `status`
    pub status_changed: bool,
    /// Last phase the pass reached
    pub reached: CyclePhase,
    /// Milliseconds until the next pass
    pub wait_ms: u64,
    /// Recipe inputs destroyed by this pass
    pub consumed: Vec<Resource>,
    pub produced: Option<Placed>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionUnit {
    name: String,
    supply: Storage,
    production: Storage,
    recipe: Recipe,
    output: ResourceKind,
    cycle_ms: u64,
    poll_ms: u64,
    settle_ms: u64,
    transfer_ms: Option<u64>,
    status: UnitStatus,
}

impl ProductionUnit {
    /// Build a unit from an already validated config.
    pub fn new(config: &UnitConfig) -> Self {
        let status = if config.recipe.is_empty() {
            UnitStatus::Ok
        } else {
            UnitStatus::NoSupplies
        };
        Self {
            name: config.name.clone(),
            supply: Storage::with_layout(config.supply_capacity, config.supply_layout),
            production: Storage::with_layout(config.production_capacity, config.production_layout),
            recipe: config.recipe.clone(),
            output: config.output,
            cycle_ms: config.cycle_ms(),
            poll_ms: config.poll_ms(),
            settle_ms: config.settle_ms(),
            transfer_ms: config.transfer_ms(),
            status,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    /// e.g. `"Warehouse: no supplies"`
    pub fn status_line(&self) -> String {
        format!("{}: {}", self.name, self.status)
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn output(&self) -> ResourceKind {
        self.output
    }

    /// Kinds an actor may deposit here.
    pub fn accepts(&self, kind: ResourceKind) -> bool {
        self.recipe.accepts(kind)
    }

    pub fn supply(&self) -> &Storage {
        &self.supply
    }

    pub fn production(&self) -> &Storage {
        &self.production
    }

    pub fn storage(&self, side: Side) -> &Storage {
        match side {
            Side::Supply => &self.supply,
            Side::Production => &self.production,
        }
    }

    pub fn settle_ms(&self) -> u64 {
        self.settle_ms
    }

    pub fn cycle_ms(&self) -> u64 {
        self.cycle_ms
    }

    pub fn transfer_ms(&self) -> Option<u64> {
        self.transfer_ms
    }

    /// Hand the most recent settled product to an actor. Never blocks.
    pub fn release_resource(&mut self) -> Option<Resource> {
        self.production.pop()
    }

    pub fn can_receive(&self) -> bool {
        !self.supply.is_full()
    }

    /// Accept an item from an actor into supply.
    ///
    /// A full supply rejects the item and hands it back untouched.
    pub fn receive_resource(
        &mut self,
        resource: Resource,
        placement: PlacementId,
    ) -> Result<Placed, Resource> {
        let (item, kind) = (resource.id, resource.kind);
        let slot = self.supply.offer(resource, placement)?;
        Ok(Placed {
            item,
            kind,
            placement,
            slot,
            anchor: self.supply.position_for_index(slot),
        })
    }

    /// Run one production pass.
    ///
    /// Errors only if production storage rejects the product after the space
    /// check passed, which would be a broken invariant.
    pub fn run_cycle(&mut self, ids: &mut IdGen) -> Result<CycleReport, StorageError> {
        if self.production.is_full() {
            return Ok(self.finish(
                UnitStatus::NoSpace,
                CyclePhase::CheckProductionSpace,
                self.cycle_ms,
                Vec::new(),
                None,
            ));
        }

        let consumed = match self.supply.withdraw_for_recipe(&self.recipe) {
            Ok(items) => items,
            Err(_) => {
                return Ok(self.finish(
                    UnitStatus::NoSupplies,
                    CyclePhase::CheckSupplies,
                    self.poll_ms,
                    Vec::new(),
                    None,
                ))
            }
        };

        let product = ids.spawn(self.output);
        let placement = ids.placement();
        let item = product.id;
        let slot = self.production.put(product, placement)?;
        let produced = Placed {
            item,
            kind: self.output,
            placement,
            slot,
            anchor: self.production.position_for_index(slot),
        };
        Ok(self.finish(
            UnitStatus::Ok,
            CyclePhase::Producing,
            self.cycle_ms,
            consumed,
            Some(produced),
        ))
    }

    /// Clear the lock `placement` holds on `item` in `side`.
    pub fn release_transit(&mut self, side: Side, item: ResourceId, placement: PlacementId) -> bool {
        match side {
            Side::Supply => self.supply.release_transit(item, placement),
            Side::Production => self.production.release_transit(item, placement),
        }
    }

    pub fn drain_retargets(&mut self) -> Vec<(Side, Retarget)> {
        let mut out: Vec<(Side, Retarget)> = self
            .supply
            .drain_retargets()
            .into_iter()
            .map(|r| (Side::Supply, r))
            .collect();
        out.extend(
            self.production
                .drain_retargets()
                .into_iter()
                .map(|r| (Side::Production, r)),
        );
        out
    }

    fn finish(
        &mut self,
        status: UnitStatus,
        reached: CyclePhase,
        wait_ms: u64,
        consumed: Vec<Resource>,
        produced: Option<Placed>,
    ) -> CycleReport {
        let status_changed = self.status != status;
        self.status = status;
        CycleReport {
            status,
            status_changed,
            reached,
            wait_ms,
            consumed,
            produced,
        }
    }
}
