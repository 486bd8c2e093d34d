//! Production cycle system.

use hecs::{Entity, World};
use stockpile_logic::production::ProductionUnit;

use super::{begin_placement, flush_retargets, TaskContext};
use crate::components::{ContainerRef, CycleHandle};
use crate::error::EngineError;
use crate::events::SimEvent;
use crate::scheduler::Task;

/// Run one production pass of `building` and schedule the next.
pub fn production_cycle_system(
    world: &World,
    ctx: &mut TaskContext,
    building: Entity,
) -> Result<(), EngineError> {
    let (report, settle_ms) = {
        let mut unit = world.get::<&mut ProductionUnit>(building)?;
        (unit.run_cycle(ctx.ids)?, unit.settle_ms())
    };

    if !report.consumed.is_empty() {
        ctx.events.push(SimEvent::ItemsConsumed {
            building,
            items: report.consumed.iter().map(|r| (r.id, r.kind)).collect(),
        });
    }
    if let Some(produced) = &report.produced {
        log::debug!(
            "{:?} produced {} into slot {}",
            building,
            produced.kind,
            produced.slot
        );
        ctx.events.push(SimEvent::ItemProduced {
            building,
            item: produced.item,
            kind: produced.kind,
        });
        begin_placement(
            ctx,
            produced,
            None,
            ContainerRef::production(building),
            settle_ms,
        );
    }
    if report.status_changed {
        log::info!("{:?} status → {}", building, report.status);
        ctx.events.push(SimEvent::StatusChanged {
            building,
            status: report.status,
        });
    }
    flush_retargets(world, ctx, building)?;

    let token = world.get::<&CycleHandle>(building)?.token.clone();
    let due = ctx.now.saturating_add(report.wait_ms);
    ctx.timeline.schedule(due, Task::Cycle(building), token);
    Ok(())
}
