//! Bounded, ordered item container shared by [`Storage`](crate::storage::Storage)
//! and [`Carrier`](crate::carrier::Carrier).
//!
//! Append order is arrival order. Removing an item shifts everything above it
//! down one slot; locked items that shift are recorded in the retarget outbox
//! so the renderer can move an in-flight placement to its new slot without
//! restarting it.

use crate::error::StorageError;
use crate::layout::{SlotLayout, Vec3};
use crate::resources::{PlacementId, Resource, ResourceId, ResourceKind};

/// An in-flight placement whose target slot moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retarget {
    pub placement: PlacementId,
    pub item: ResourceId,
    pub slot: usize,
    pub anchor: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Stack {
    items: Vec<Resource>,
    capacity: usize,
    layout: SlotLayout,
    retargets: Vec<Retarget>,
}

impl Stack {
    pub fn new(capacity: usize, layout: SlotLayout) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            layout,
            retargets: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    pub fn position_for_index(&self, index: usize) -> Vec3 {
        self.layout.position_for_index(index)
    }

    /// Append without a lock. Returns the new item's slot.
    pub fn push(&mut self, resource: Resource) -> Result<usize, StorageError> {
        if self.is_full() {
            return Err(StorageError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.items.push(resource);
        Ok(self.items.len() - 1)
    }

    /// Append and lock the item to `placement`. A full stack hands the item back.
    pub fn push_locked(
        &mut self,
        mut resource: Resource,
        placement: PlacementId,
    ) -> Result<usize, Resource> {
        if self.is_full() {
            return Err(resource);
        }
        resource.lock(placement);
        self.items.push(resource);
        Ok(self.items.len() - 1)
    }

    /// Index of the most recent unlocked item whose kind satisfies `pred`.
    pub fn latest_unlocked_where(&self, pred: impl Fn(ResourceKind) -> bool) -> Option<usize> {
        self.items
            .iter()
            .rposition(|r| !r.in_transit() && pred(r.kind))
    }

    pub fn any_locked_where(&self, pred: impl Fn(ResourceKind) -> bool) -> bool {
        self.items.iter().any(|r| r.in_transit() && pred(r.kind))
    }

    pub fn remove(&mut self, index: usize) -> Resource {
        let taken = self.items.remove(index);
        self.record_shift(index);
        taken
    }

    /// Remove every index in `indices` in one step. Returned items follow the
    /// order of `indices`.
    pub fn remove_all(&mut self, indices: &[usize]) -> Vec<Resource> {
        let mut order: Vec<(usize, usize)> = indices.iter().copied().enumerate().collect();
        order.sort_by(|a, b| b.1.cmp(&a.1));

        let mut slots: Vec<Option<Resource>> = vec![None; indices.len()];
        for (position, index) in &order {
            slots[*position] = Some(self.items.remove(*index));
        }
        if let Some(lowest) = indices.iter().min() {
            self.record_shift(*lowest);
        }
        slots.into_iter().flatten().collect()
    }

    /// Put an item back where a removal in the same step took it from.
    pub fn insert(&mut self, index: usize, resource: Resource) -> Result<(), StorageError> {
        if self.is_full() {
            return Err(StorageError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        let index = index.min(self.items.len());
        self.items.insert(index, resource);
        self.record_shift(index + 1);
        Ok(())
    }

    pub fn unlock(&mut self, item: ResourceId, placement: PlacementId) -> bool {
        self.items
            .iter_mut()
            .find(|r| r.id == item)
            .map(|r| r.unlock(placement))
            .unwrap_or(false)
    }

    pub fn slot_of(&self, item: ResourceId) -> Option<usize> {
        self.items.iter().position(|r| r.id == item)
    }

    pub fn drain_retargets(&mut self) -> Vec<Retarget> {
        std::mem::take(&mut self.retargets)
    }

    /// Record a retarget for every locked item now sitting at `from` or above.
    fn record_shift(&mut self, from: usize) {
        for (slot, item) in self.items.iter().enumerate().skip(from) {
            if let Some(placement) = item.transit() {
                self.retargets.retain(|r| r.placement != placement);
                self.retargets.push(Retarget {
                    placement,
                    item: item.id,
                    slot,
                    anchor: self.layout.position_for_index(slot),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::IdGen;

    #[test]
    fn test_remove_retargets_locked_items_above() {
        let mut ids = IdGen::new();
        let mut stack = Stack::new(4, SlotLayout::default());
        stack.push(ids.spawn(ResourceKind::Resource1)).unwrap();
        stack.push(ids.spawn(ResourceKind::Resource2)).unwrap();
        let moving = ids.spawn(ResourceKind::Resource3);
        let moving_id = moving.id;
        let placement = ids.placement();
        stack.push_locked(moving, placement).unwrap();

        stack.remove(0);
        let retargets = stack.drain_retargets();
        assert_eq!(retargets.len(), 1);
        assert_eq!(retargets[0].item, moving_id);
        assert_eq!(retargets[0].slot, 1);
        assert_eq!(retargets[0].anchor, SlotLayout::default().position_for_index(1));
        assert!(stack.drain_retargets().is_empty());
    }

    #[test]
    fn test_remove_all_keeps_requested_order() {
        let mut ids = IdGen::new();
        let mut stack = Stack::new(4, SlotLayout::default());
        let a = ids.spawn(ResourceKind::Resource1);
        let b = ids.spawn(ResourceKind::Resource2);
        let c = ids.spawn(ResourceKind::Resource3);
        let (a_id, c_id) = (a.id, c.id);
        stack.push(a).unwrap();
        stack.push(b).unwrap();
        stack.push(c).unwrap();

        let taken = stack.remove_all(&[2, 0]);
        assert_eq!(taken[0].id, c_id);
        assert_eq!(taken[1].id, a_id);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.items()[0].kind, ResourceKind::Resource2);
    }

    #[test]
    fn test_push_rejects_when_full() {
        let mut ids = IdGen::new();
        let mut stack = Stack::new(1, SlotLayout::default());
        stack.push(ids.spawn(ResourceKind::Resource1)).unwrap();
        assert_eq!(
            stack.push(ids.spawn(ResourceKind::Resource1)),
            Err(StorageError::CapacityExceeded { capacity: 1 })
        );
        assert_eq!(stack.len(), 1);
    }
}
