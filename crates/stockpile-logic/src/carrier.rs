//! The actor's backpack.
//!
//! Same bounded-append and LIFO contract as [`Storage`](crate::storage::Storage),
//! plus removal at an arbitrary slot: a deposit hands over the most recent item
//! of an acceptable kind, which is not always the top of the stack.

use crate::error::StorageError;
use crate::layout::{SlotLayout, Vec3};
use crate::resources::{PlacementId, Resource, ResourceId, ResourceKind};
use crate::stack::{Retarget, Stack};

#[derive(Debug, Clone, PartialEq)]
pub struct Carrier {
    stack: Stack,
}

impl Carrier {
    pub fn new(capacity: usize) -> Self {
        Self::with_layout(capacity, SlotLayout::default())
    }

    pub fn with_layout(capacity: usize, layout: SlotLayout) -> Self {
        Self {
            stack: Stack::new(capacity, layout),
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.stack.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.stack.is_full()
    }

    /// Free slots left
    pub fn remaining(&self) -> usize {
        self.stack.capacity().saturating_sub(self.stack.len())
    }

    /// Current contents, oldest first
    pub fn contents(&self) -> &[Resource] {
        self.stack.items()
    }

    pub fn layout(&self) -> &SlotLayout {
        self.stack.layout()
    }

    /// Append an item that is already in place (no placement, no lock).
    pub fn stock(&mut self, resource: Resource) -> Result<usize, StorageError> {
        self.stack.push(resource)
    }

    /// Append `resource`, locked to `placement` until it settles.
    pub fn put(&mut self, resource: Resource, placement: PlacementId) -> Result<usize, StorageError> {
        self.stack
            .push_locked(resource, placement)
            .map_err(|_| StorageError::CapacityExceeded {
                capacity: self.capacity(),
            })
    }

    pub fn pop(&mut self) -> Option<Resource> {
        let index = self.stack.latest_unlocked_where(|_| true)?;
        Some(self.stack.remove(index))
    }

    /// Slot of the most recent settled item whose kind satisfies `pred`.
    pub fn find_latest(&self, pred: impl Fn(ResourceKind) -> bool) -> Option<usize> {
        self.stack.latest_unlocked_where(pred)
    }

    /// Whether an item matching `pred` is still settling into the backpack.
    pub fn has_locked(&self, pred: impl Fn(ResourceKind) -> bool) -> bool {
        self.stack.any_locked_where(pred)
    }

    /// Remove the item at `index`; items above it move down one slot.
    ///
    /// Returns `None` when the slot is empty or its item is still in transit.
    pub fn remove_at(&mut self, index: usize) -> Option<Resource> {
        if self.stack.items().get(index)?.in_transit() {
            return None;
        }
        Some(self.stack.remove(index))
    }

    /// Undo a [`remove_at`](Self::remove_at) made earlier in the same step.
    pub fn restore(&mut self, index: usize, resource: Resource) -> Result<(), StorageError> {
        self.stack.insert(index, resource)
    }

    pub fn release_transit(&mut self, item: ResourceId, placement: PlacementId) -> bool {
        self.stack.unlock(item, placement)
    }

    pub fn position_for_index(&self, index: usize) -> Vec3 {
        self.stack.position_for_index(index)
    }

    pub fn slot_of(&self, item: ResourceId) -> Option<usize> {
        self.stack.slot_of(item)
    }

    pub fn drain_retargets(&mut self) -> Vec<Retarget> {
        self.stack.drain_retargets()
    }
}
