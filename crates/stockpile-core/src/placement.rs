//! In-flight placements.
//!
//! A placement is the move of one item into one container slot. It owns the
//! item's transit lock from the moment the item lands in the container until
//! its settle task runs. Placements are independent of the session or cycle
//! that started them, so ending a session never strands a lock.

use std::collections::HashMap;

use hecs::Entity;
use stockpile_logic::cancel::CancelToken;
use stockpile_logic::layout::Vec3;
use stockpile_logic::resources::{PlacementId, ResourceId, ResourceKind};

use crate::components::ContainerRef;

#[derive(Debug, Clone)]
pub struct Placement {
    pub id: PlacementId,
    pub item: ResourceId,
    pub kind: ResourceKind,
    pub from: Option<ContainerRef>,
    pub to: ContainerRef,
    pub slot: usize,
    /// Target anchor in the destination's local space
    pub anchor: Vec3,
    pub started_at: u64,
    pub settle_ms: u64,
    pub token: CancelToken,
}

impl Placement {
    pub fn settles_at(&self) -> u64 {
        self.started_at.saturating_add(self.settle_ms)
    }

    /// Fraction of the settle time elapsed at `now`, in `0.0..=1.0`.
    pub fn progress(&self, now: u64) -> f32 {
        if self.settle_ms == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at) as f32;
        (elapsed / self.settle_ms as f32).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Default)]
pub struct PlacementBook {
    active: HashMap<PlacementId, Placement>,
}

impl PlacementBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, placement: Placement) {
        self.active.insert(placement.id, placement);
    }

    pub fn get(&self, id: PlacementId) -> Option<&Placement> {
        self.active.get(&id)
    }

    pub fn remove(&mut self, id: PlacementId) -> Option<Placement> {
        self.active.remove(&id)
    }

    /// Point a placement at a new slot. Returns false if it already settled.
    pub fn retarget(&mut self, id: PlacementId, slot: usize, anchor: Vec3) -> bool {
        match self.active.get_mut(&id) {
            Some(p) => {
                p.slot = slot;
                p.anchor = anchor;
                true
            }
            None => false,
        }
    }

    /// Cancel and forget every placement into a container of `owner`.
    pub fn cancel_into(&mut self, owner: Entity) -> Vec<Placement> {
        let ids: Vec<PlacementId> = self
            .active
            .values()
            .filter(|p| p.to.owner == owner)
            .map(|p| p.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.active.remove(&id))
            .inspect(|p| p.token.cancel())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.active.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    fn placement(id: u64, to: ContainerRef) -> Placement {
        Placement {
            id: PlacementId(id),
            item: ResourceId(id),
            kind: ResourceKind::Resource1,
            from: None,
            to,
            slot: 0,
            anchor: Vec3::ZERO,
            started_at: 1_000,
            settle_ms: 1_000,
            token: CancelToken::new(),
        }
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut world = World::new();
        let owner = world.spawn(());
        let p = placement(1, ContainerRef::supply(owner));
        assert_eq!(p.progress(0), 0.0);
        assert_eq!(p.progress(1_500), 0.5);
        assert_eq!(p.progress(9_000), 1.0);
        assert_eq!(p.settles_at(), 2_000);
    }

    #[test]
    fn test_cancel_into_only_touches_owner() {
        let mut world = World::new();
        let building = world.spawn(());
        let actor = world.spawn(());
        let mut book = PlacementBook::new();
        book.insert(placement(1, ContainerRef::supply(building)));
        book.insert(placement(2, ContainerRef::backpack(actor)));

        let cancelled = book.cancel_into(building);
        assert_eq!(cancelled.len(), 1);
        assert!(cancelled[0].token.is_cancelled());
        assert!(book.get(PlacementId(1)).is_none());
        assert!(book.get(PlacementId(2)).is_some());
    }
}
