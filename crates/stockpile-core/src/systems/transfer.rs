//! Transfer session system.

use hecs::{Entity, World};
use stockpile_logic::carrier::Carrier;
use stockpile_logic::production::ProductionUnit;
use stockpile_logic::transfer::{SessionEnd, SessionStep, TransferOutcome};

use super::{begin_placement, flush_retargets, TaskContext};
use crate::components::{ActiveSession, Actor, ContainerRef};
use crate::error::EngineError;
use crate::scheduler::Task;

/// Run one step of `actor`'s session.
///
/// Returns the end reason when the session is over; the caller removes it.
pub fn transfer_session_system(
    world: &World,
    ctx: &mut TaskContext,
    actor: Entity,
) -> Result<Option<SessionEnd>, EngineError> {
    let session = match world.get::<&ActiveSession>(actor) {
        Ok(active) => active.0.clone(),
        // exited between scheduling and now
        Err(_) => return Ok(None),
    };
    let building = session.target;

    let (step, unit_settle_ms) = {
        let Ok(mut unit) = world.get::<&mut ProductionUnit>(building) else {
            return Ok(Some(SessionEnd::UnitGone));
        };
        let mut carrier = world.get::<&mut Carrier>(actor)?;
        (
            session.step(&mut carrier, &mut unit, ctx.ids)?,
            unit.settle_ms(),
        )
    };

    let (outcome, wait_ms) = match step {
        SessionStep::Finished(end) => return Ok(Some(end)),
        SessionStep::Continue { outcome, wait_ms } => (outcome, wait_ms),
    };

    match outcome {
        TransferOutcome::Delivered { from_slot, placed } => {
            log::debug!(
                "{:?} delivered {} from slot {} to {:?}",
                actor,
                placed.kind,
                from_slot,
                building
            );
            begin_placement(
                ctx,
                &placed,
                Some(ContainerRef::backpack(actor)),
                ContainerRef::supply(building),
                unit_settle_ms,
            );
            flush_retargets(world, ctx, actor)?;
        }
        TransferOutcome::Collected { placed } => {
            log::debug!("{:?} collected {} from {:?}", actor, placed.kind, building);
            let settle_ms = world.get::<&Actor>(actor)?.settle_ms;
            begin_placement(
                ctx,
                &placed,
                Some(ContainerRef::production(building)),
                ContainerRef::backpack(actor),
                settle_ms,
            );
            flush_retargets(world, ctx, building)?;
        }
        TransferOutcome::Rejected | TransferOutcome::Waiting | TransferOutcome::Empty => {}
    }

    ctx.timeline.schedule(
        ctx.now.saturating_add(wait_ms),
        Task::Session(actor),
        session.token().clone(),
    );
    Ok(None)
}
