//! Resource kinds, item instances and id allocation.

use serde::{Deserialize, Serialize};

/// Tag identifying what a resource item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Resource1 = 0,
    Resource2 = 1,
    Resource3 = 2,
}

impl ResourceKind {
    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::Resource1,
            ResourceKind::Resource2,
            ResourceKind::Resource3,
        ]
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ResourceKind::Resource1),
            1 => Some(ResourceKind::Resource2),
            2 => Some(ResourceKind::Resource3),
            _ => None,
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Resource1 => "Resource1",
            ResourceKind::Resource2 => "Resource2",
            ResourceKind::Resource3 => "Resource3",
        }
    }

    /// Default UI color (RGB 0-255) when no material is bound
    pub fn color(&self) -> [u8; 3] {
        match self {
            ResourceKind::Resource1 => [200, 60, 60],
            ResourceKind::Resource2 => [60, 160, 60],
            ResourceKind::Resource3 => [60, 90, 210],
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Visual attribute bound to a resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProperty {
    pub kind: ResourceKind,
    pub material: String,
}

/// Kind → material lookup handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub properties: Vec<ResourceProperty>,
}

impl Palette {
    pub fn material(&self, kind: ResourceKind) -> &str {
        self.properties
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.material.as_str())
            .unwrap_or_else(|| kind.label())
    }
}

/// Identity of a single resource item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

/// Identity of one in-flight placement (the move of an item into a slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlacementId(pub u64);

/// A single resource item.
///
/// `transit` is the item's lock: while `Some(p)`, placement `p` owns the item
/// and no pop, recipe withdrawal or deposit may take it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    transit: Option<PlacementId>,
}

impl Resource {
    pub fn new(id: ResourceId, kind: ResourceKind) -> Self {
        Self {
            id,
            kind,
            transit: None,
        }
    }

    pub fn in_transit(&self) -> bool {
        self.transit.is_some()
    }

    pub fn transit(&self) -> Option<PlacementId> {
        self.transit
    }

    pub(crate) fn lock(&mut self, placement: PlacementId) {
        self.transit = Some(placement);
    }

    /// Clear the lock if `placement` holds it.
    pub(crate) fn unlock(&mut self, placement: PlacementId) -> bool {
        if self.transit == Some(placement) {
            self.transit = None;
            true
        } else {
            false
        }
    }
}

/// Monotonic allocator for item and placement ids.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next_resource: u64,
    next_placement: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(&mut self) -> ResourceId {
        self.next_resource += 1;
        ResourceId(self.next_resource)
    }

    pub fn placement(&mut self) -> PlacementId {
        self.next_placement += 1;
        PlacementId(self.next_placement)
    }

    /// Allocate a fresh item of `kind`.
    pub fn spawn(&mut self, kind: ResourceKind) -> Resource {
        Resource::new(self.resource(), kind)
    }
}
