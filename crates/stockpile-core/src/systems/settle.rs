//! Placement start, settle and retarget handling.

use hecs::{Entity, World};
use stockpile_logic::cancel::CancelToken;
use stockpile_logic::carrier::Carrier;
use stockpile_logic::production::{Placed, ProductionUnit};
use stockpile_logic::resources::PlacementId;

use super::TaskContext;
use crate::components::{ContainerKind, ContainerRef};
use crate::error::EngineError;
use crate::events::SimEvent;
use crate::placement::Placement;
use crate::scheduler::Task;

/// Record a placement the model just committed and schedule its settle.
pub fn begin_placement(
    ctx: &mut TaskContext,
    placed: &Placed,
    from: Option<ContainerRef>,
    to: ContainerRef,
    settle_ms: u64,
) {
    let token = CancelToken::new();
    ctx.placements.insert(Placement {
        id: placed.placement,
        item: placed.item,
        kind: placed.kind,
        from,
        to,
        slot: placed.slot,
        anchor: placed.anchor,
        started_at: ctx.now,
        settle_ms,
        token: token.clone(),
    });
    ctx.events.push(SimEvent::TransferStarted {
        placement: placed.placement,
        item: placed.item,
        kind: placed.kind,
        from,
        to,
        slot: placed.slot,
        anchor: placed.anchor,
        settle_ms,
    });
    let due = ctx.now.saturating_add(settle_ms);
    ctx.timeline.schedule(due, Task::Settle(placed.placement), token);
}

/// Release the transit lock held by `id`.
pub fn settle_system(
    world: &World,
    ctx: &mut TaskContext,
    id: PlacementId,
) -> Result<(), EngineError> {
    let Some(placement) = ctx.placements.remove(id) else {
        return Ok(());
    };
    let to = placement.to;
    let released = match to.kind.side() {
        Some(side) => world
            .get::<&mut ProductionUnit>(to.owner)?
            .release_transit(side, placement.item, id),
        None => world
            .get::<&mut Carrier>(to.owner)?
            .release_transit(placement.item, id),
    };
    if !released {
        log::warn!(
            "placement {:?} did not hold item {:?} in {:?}",
            id,
            placement.item,
            to.kind
        );
    }
    ctx.events.push(SimEvent::TransferCompleted {
        placement: id,
        item: placement.item,
        to,
    });
    Ok(())
}

/// Forward slot shifts recorded by `owner`'s containers to the placement book
/// and the event queue.
pub fn flush_retargets(
    world: &World,
    ctx: &mut TaskContext,
    owner: Entity,
) -> Result<(), EngineError> {
    let shifted: Vec<(ContainerKind, _)> =
        if let Ok(mut unit) = world.get::<&mut ProductionUnit>(owner) {
            unit.drain_retargets()
                .into_iter()
                .map(|(side, r)| (ContainerKind::from(side), r))
                .collect()
        } else {
            world
                .get::<&mut Carrier>(owner)?
                .drain_retargets()
                .into_iter()
                .map(|r| (ContainerKind::Backpack, r))
                .collect()
        };

    for (kind, r) in shifted {
        if ctx.placements.retarget(r.placement, r.slot, r.anchor) {
            ctx.events.push(SimEvent::PlacementRetargeted {
                placement: r.placement,
                item: r.item,
                to: ContainerRef { owner, kind },
                slot: r.slot,
                anchor: r.anchor,
            });
        }
    }
    Ok(())
}
