//! Systems - logic that runs one scheduled task against the world
//!
//! Systems read components through `&World` (hecs hands out per-component
//! borrows) and write everything else through a [`TaskContext`]. Spawning
//! and despawning stay in the engine.

mod production;
mod settle;
mod transfer;

pub use production::*;
pub use settle::*;
pub use transfer::*;

use stockpile_logic::resources::IdGen;

use crate::events::EventLog;
use crate::placement::PlacementBook;
use crate::scheduler::Timeline;

/// Engine state a running task may touch besides the world.
pub struct TaskContext<'a> {
    pub now: u64,
    pub ids: &'a mut IdGen,
    pub timeline: &'a mut Timeline,
    pub placements: &'a mut PlacementBook,
    pub events: &'a mut EventLog,
}
