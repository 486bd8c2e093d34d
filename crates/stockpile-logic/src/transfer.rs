//! Transfer sessions between an actor's backpack and a building.
//!
//! A session is a repeating task: the scheduler calls [`TransferSession::step`]
//! once per interval until it returns [`SessionStep::Finished`]. Every step
//! checks and commits within the same call, so a session can be dropped or
//! cancelled between any two steps without leaving an item half moved.
//!
//! Deposit and withdraw end differently. A deposit ends as soon as nothing in
//! the backpack is acceptable; a withdraw keeps polling an empty building
//! because the building may still produce.

use crate::cancel::CancelToken;
use crate::carrier::Carrier;
use crate::error::StorageError;
use crate::production::{Placed, ProductionUnit};
use crate::resources::IdGen;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Backpack → building supply
    Deposit,
    /// Building production → backpack
    Withdraw,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEnd {
    Cancelled,
    BackpackEmpty,
    NothingAcceptable,
    BackpackFull,
    UnitGone,
}

impl SessionEnd {
    pub fn label(&self) -> &'static str {
        match self {
            SessionEnd::Cancelled => "cancelled",
            SessionEnd::BackpackEmpty => "backpack empty",
            SessionEnd::NothingAcceptable => "nothing acceptable",
            SessionEnd::BackpackFull => "backpack full",
            SessionEnd::UnitGone => "building gone",
        }
    }
}

/// What one step did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferOutcome {
    /// An item left backpack slot `from_slot` for the building's supply.
    Delivered { from_slot: usize, placed: Placed },
    /// The building's supply was full; the backpack is unchanged.
    Rejected,
    /// Acceptable items exist but are all still settling into the backpack.
    Waiting,
    /// A product left the building for the backpack.
    Collected { placed: Placed },
    /// The building had no settled product to hand out.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionStep {
    Continue {
        outcome: TransferOutcome,
        wait_ms: u64,
    },
    Finished(SessionEnd),
}

/// A running exchange with one building.
///
/// `T` identifies the target building in whatever world owns the session
/// (an ECS entity in the engine, a plain index in tests).
#[derive(Debug, Clone)]
pub struct TransferSession<T: Copy> {
    pub direction: Direction,
    pub target: T,
    pub interval_ms: u64,
    token: CancelToken,
}

impl<T: Copy> TransferSession<T> {
    pub fn new(direction: Direction, target: T, interval_ms: u64) -> Self {
        Self {
            direction,
            target,
            interval_ms,
            token: CancelToken::new(),
        }
    }

    /// The actor's interval, slowed to the building's when it sets one.
    pub fn interval_for(carrier_ms: u64, unit_ms: Option<u64>) -> u64 {
        unit_ms.map_or(carrier_ms, |unit| unit.max(carrier_ms))
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run one transfer attempt.
    ///
    /// Errors only when a container rejects an item after its capacity check
    /// passed in the same step.
    pub fn step(
        &self,
        carrier: &mut Carrier,
        unit: &mut ProductionUnit,
        ids: &mut IdGen,
    ) -> Result<SessionStep, StorageError> {
        if self.token.is_cancelled() {
            return Ok(SessionStep::Finished(SessionEnd::Cancelled));
        }
        match self.direction {
            Direction::Deposit => self.deposit(carrier, unit, ids),
            Direction::Withdraw => self.withdraw(carrier, unit, ids),
        }
    }

    fn deposit(
        &self,
        carrier: &mut Carrier,
        unit: &mut ProductionUnit,
        ids: &mut IdGen,
    ) -> Result<SessionStep, StorageError> {
        if carrier.is_empty() {
            return Ok(SessionStep::Finished(SessionEnd::BackpackEmpty));
        }

        let Some(index) = carrier.find_latest(|k| unit.accepts(k)) else {
            if carrier.has_locked(|k| unit.accepts(k)) {
                return Ok(self.wait(TransferOutcome::Waiting));
            }
            return Ok(SessionStep::Finished(SessionEnd::NothingAcceptable));
        };

        if !unit.can_receive() {
            return Ok(self.wait(TransferOutcome::Rejected));
        }
        let Some(item) = carrier.remove_at(index) else {
            return Ok(self.wait(TransferOutcome::Waiting));
        };

        match unit.receive_resource(item, ids.placement()) {
            Ok(placed) => Ok(self.wait(TransferOutcome::Delivered {
                from_slot: index,
                placed,
            })),
            Err(item) => {
                carrier.restore(index, item)?;
                Ok(self.wait(TransferOutcome::Rejected))
            }
        }
    }

    fn withdraw(
        &self,
        carrier: &mut Carrier,
        unit: &mut ProductionUnit,
        ids: &mut IdGen,
    ) -> Result<SessionStep, StorageError> {
        if carrier.is_full() {
            return Ok(SessionStep::Finished(SessionEnd::BackpackFull));
        }
        let Some(item) = unit.release_resource() else {
            return Ok(self.wait(TransferOutcome::Empty));
        };

        let (id, kind) = (item.id, item.kind);
        let placement = ids.placement();
        let slot = carrier.put(item, placement)?;
        Ok(self.wait(TransferOutcome::Collected {
            placed: Placed {
                item: id,
                kind,
                placement,
                slot,
                anchor: carrier.position_for_index(slot),
            },
        }))
    }

    fn wait(&self, outcome: TransferOutcome) -> SessionStep {
        SessionStep::Continue {
            outcome,
            wait_ms: self.interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnitConfig;
    use crate::production::Side;
    use crate::recipe::Recipe;
    use crate::resources::ResourceKind::{self, *};

    fn unit(recipe: Vec<ResourceKind>, supply: usize) -> ProductionUnit {
        ProductionUnit::new(&UnitConfig {
            supply_capacity: supply,
            recipe: Recipe::new(recipe),
            output: Resource3,
            ..UnitConfig::default()
        })
    }

    fn carrier(ids: &mut IdGen, capacity: usize, kinds: &[ResourceKind]) -> Carrier {
        let mut carrier = Carrier::new(capacity);
        for &kind in kinds {
            carrier.stock(ids.spawn(kind)).unwrap();
        }
        carrier
    }

    fn outcome(step: SessionStep) -> TransferOutcome {
        match step {
            SessionStep::Continue { outcome, .. } => outcome,
            SessionStep::Finished(end) => panic!("session ended early: {:?}", end),
        }
    }

    #[test]
    fn test_deposit_leaves_unacceptable_items_and_ends() {
        let mut ids = IdGen::new();
        let mut backpack = carrier(&mut ids, 2, &[Resource1, Resource2]);
        let mut building = unit(vec![Resource1], 5);
        let session = TransferSession::new(Direction::Deposit, 0u32, 500);

        let first = session.step(&mut backpack, &mut building, &mut ids).unwrap();
        match outcome(first) {
            TransferOutcome::Delivered { from_slot, placed } => {
                assert_eq!(from_slot, 0);
                assert_eq!(placed.kind, Resource1);
            }
            other => panic!("expected delivery, got {:?}", other),
        }
        assert_eq!(backpack.contents().len(), 1);
        assert_eq!(backpack.contents()[0].kind, Resource2);
        assert_eq!(building.supply().len(), 1);

        let second = session.step(&mut backpack, &mut building, &mut ids).unwrap();
        assert_eq!(second, SessionStep::Finished(SessionEnd::NothingAcceptable));
        assert_eq!(backpack.len(), 1);
    }

    #[test]
    fn test_deposit_retries_while_supply_full() {
        let mut ids = IdGen::new();
        let mut backpack = carrier(&mut ids, 2, &[Resource1]);
        let mut building = unit(vec![Resource1], 1);
        let occupant = ids.placement();
        let placed = building.receive_resource(ids.spawn(Resource1), occupant).unwrap();
        building.release_transit(Side::Supply, placed.item, occupant);
        let session = TransferSession::new(Direction::Deposit, 0u32, 500);

        for _ in 0..3 {
            let step = session.step(&mut backpack, &mut building, &mut ids).unwrap();
            assert_eq!(
                step,
                SessionStep::Continue {
                    outcome: TransferOutcome::Rejected,
                    wait_ms: 500
                }
            );
        }
        assert_eq!(backpack.len(), 1);
        assert_eq!(building.supply().len(), 1);

        // production frees the slot
        let report = building.run_cycle(&mut ids).unwrap();
        assert_eq!(report.consumed.len(), 1);
        let step = session.step(&mut backpack, &mut building, &mut ids).unwrap();
        assert!(matches!(outcome(step), TransferOutcome::Delivered { .. }));
        assert!(backpack.is_empty());
    }

    #[test]
    fn test_deposit_waits_for_settling_items() {
        let mut ids = IdGen::new();
        let mut backpack = Carrier::new(2);
        backpack.put(ids.spawn(Resource1), ids.placement()).unwrap();
        let mut building = unit(vec![Resource1], 5);
        let session = TransferSession::new(Direction::Deposit, 0u32, 500);

        let step = session.step(&mut backpack, &mut building, &mut ids).unwrap();
        assert_eq!(outcome(step), TransferOutcome::Waiting);
        assert!(building.supply().is_empty());
    }

    #[test]
    fn test_deposit_on_empty_backpack_ends() {
        let mut ids = IdGen::new();
        let mut backpack = Carrier::new(2);
        let mut building = unit(vec![Resource1], 5);
        let session = TransferSession::new(Direction::Deposit, 0u32, 500);
        assert_eq!(
            session.step(&mut backpack, &mut building, &mut ids).unwrap(),
            SessionStep::Finished(SessionEnd::BackpackEmpty)
        );
    }

    #[test]
    fn test_withdraw_polls_empty_building_until_full() {
        let mut ids = IdGen::new();
        let mut backpack = Carrier::new(1);
        let mut building = unit(Vec::new(), 5);
        let session = TransferSession::new(Direction::Withdraw, 0u32, 500);

        for _ in 0..4 {
            let step = session.step(&mut backpack, &mut building, &mut ids).unwrap();
            assert_eq!(outcome(step), TransferOutcome::Empty);
        }

        let report = building.run_cycle(&mut ids).unwrap();
        let product = report.produced.unwrap();
        building.release_transit(Side::Production, product.item, product.placement);

        let step = session.step(&mut backpack, &mut building, &mut ids).unwrap();
        match outcome(step) {
            TransferOutcome::Collected { placed } => {
                assert_eq!(placed.item, product.item);
                assert_eq!(placed.slot, 0);
                assert!(backpack.contents()[0].in_transit());
            }
            other => panic!("expected collection, got {:?}", other),
        }
        assert_eq!(
            session.step(&mut backpack, &mut building, &mut ids).unwrap(),
            SessionStep::Finished(SessionEnd::BackpackFull)
        );
    }

    #[test]
    fn test_cancelled_session_mutates_nothing() {
        let mut ids = IdGen::new();
        let mut backpack = carrier(&mut ids, 2, &[Resource1]);
        let mut building = unit(vec![Resource1], 5);
        let session = TransferSession::new(Direction::Deposit, 0u32, 500);
        let held_by_scheduler = session.token().clone();

        held_by_scheduler.cancel();
        assert!(session.is_cancelled());
        assert_eq!(
            session.step(&mut backpack, &mut building, &mut ids).unwrap(),
            SessionStep::Finished(SessionEnd::Cancelled)
        );
        assert_eq!(backpack.len(), 1);
        assert!(building.supply().is_empty());
    }

    #[test]
    fn test_interval_uses_slower_side() {
        assert_eq!(TransferSession::<u32>::interval_for(500, None), 500);
        assert_eq!(TransferSession::<u32>::interval_for(500, Some(800)), 800);
        assert_eq!(TransferSession::<u32>::interval_for(500, Some(200)), 500);
    }
}
