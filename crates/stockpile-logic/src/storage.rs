//! Building storage: bounded, LIFO, with all-or-nothing recipe withdrawal.

use crate::error::StorageError;
use crate::layout::{SlotLayout, Vec3};
use crate::recipe::Recipe;
use crate::resources::{PlacementId, Resource, ResourceId, ResourceKind};
use crate::stack::{Retarget, Stack};

/// A recipe slot had no eligible item. Nothing was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeUnsatisfied {
    /// First recipe input that could not be matched
    pub kind: ResourceKind,
}

/// Supply or production storage of a building.
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    stack: Stack,
}

impl Storage {
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

    pub fn contents(&self) -> &[Resource] {
        self.stack.items()
    }

    pub fn layout(&self) -> &SlotLayout {
        self.stack.layout()
    }

    /// Remove the most recent item that is not in transit.
    pub fn pop(&mut self) -> Option<Resource> {
        let index = self.stack.latest_unlocked_where(|_| true)?;
        Some(self.stack.remove(index))
    }

    /// Append `resource`, locked to `placement` until the placement settles.
    pub fn put(&mut self, resource: Resource, placement: PlacementId) -> Result<usize, StorageError> {
        self.offer(resource, placement)
            .map_err(|_| StorageError::CapacityExceeded {
                capacity: self.capacity(),
            })
    }

    /// Like [`put`](Self::put), but a full storage hands the item back.
    pub fn offer(&mut self, resource: Resource, placement: PlacementId) -> Result<usize, Resource> {
        self.stack.push_locked(resource, placement)
    }

    /// Take one distinct item per recipe input, most recent match first.
    ///
    /// Either every input is matched and all matches are removed together, or
    /// nothing changes.
    pub fn withdraw_for_recipe(
        &mut self,
        recipe: &Recipe,
    ) -> Result<Vec<Resource>, RecipeUnsatisfied> {
        let items = self.stack.items();
        let mut selected: Vec<usize> = Vec::with_capacity(recipe.len());
        for &kind in recipe.inputs() {
            let found = (0..items.len()).rev().find(|&i| {
                let item = &items[i];
                item.kind == kind && !item.in_transit() && !selected.contains(&i)
            });
            match found {
                Some(i) => selected.push(i),
                None => return Err(RecipeUnsatisfied { kind }),
            }
        }
        Ok(self.stack.remove_all(&selected))
    }

    /// Clear the lock `placement` holds on `item`.
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
