//! Events for the presentation layer.
//!
//! The model never animates. It reports when an item starts moving, when it
//! settles and when its target slot shifts, and the renderer owns every
//! curve and frame in between.

use std::collections::VecDeque;

use hecs::Entity;
use stockpile_logic::layout::Vec3;
use stockpile_logic::production::UnitStatus;
use stockpile_logic::resources::{PlacementId, ResourceId, ResourceKind};
use stockpile_logic::transfer::{Direction, SessionEnd};

use crate::components::ContainerRef;

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// An item started moving into `to` at `slot`. `from` is `None` for a
    /// freshly produced item.
    TransferStarted {
        placement: PlacementId,
        item: ResourceId,
        kind: ResourceKind,
        from: Option<ContainerRef>,
        to: ContainerRef,
        slot: usize,
        anchor: Vec3,
        settle_ms: u64,
    },
    /// The item's transit lock was released.
    TransferCompleted {
        placement: PlacementId,
        item: ResourceId,
        to: ContainerRef,
    },
    /// A removal below an in-flight item moved its target slot.
    PlacementRetargeted {
        placement: PlacementId,
        item: ResourceId,
        to: ContainerRef,
        slot: usize,
        anchor: Vec3,
    },
    ItemsConsumed {
        building: Entity,
        items: Vec<(ResourceId, ResourceKind)>,
    },
    ItemProduced {
        building: Entity,
        item: ResourceId,
        kind: ResourceKind,
    },
    StatusChanged {
        building: Entity,
        status: UnitStatus,
    },
    SessionStarted {
        actor: Entity,
        building: Entity,
        direction: Direction,
    },
    SessionEnded {
        actor: Entity,
        building: Entity,
        reason: SessionEnd,
    },
}

/// Events kept before the oldest ones are dropped
pub const EVENT_LOG_CAPACITY: usize = 4096;

/// Bounded FIFO of events not yet consumed by the presentation layer.
///
/// When full, pushing drops the oldest event and counts it in `dropped()`.
#[derive(Debug)]
pub struct EventLog {
    queue: VecDeque<SimEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: SimEvent) {
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
            if self.dropped == 0 {
                log::warn!(
                    "event queue full ({} events), dropping oldest; drain it every frame",
                    self.capacity
                );
            }
            self.dropped += 1;
        }
        self.queue.push_back(event);
    }

    pub fn pop(&mut self) -> Option<SimEvent> {
        self.queue.pop_front()
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events discarded because nobody drained the queue in time
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
