//! Components and references shared by buildings and actors.

use hecs::Entity;
use stockpile_logic::production::Side;

/// Display name of a building or actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

/// Which container of an entity an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Supply = 0,
    Production = 1,
    Backpack = 2,
}

impl ContainerKind {
    /// The building storage this refers to, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            ContainerKind::Supply => Some(Side::Supply),
            ContainerKind::Production => Some(Side::Production),
            ContainerKind::Backpack => None,
        }
    }
}

impl From<Side> for ContainerKind {
    fn from(side: Side) -> Self {
        match side {
            Side::Supply => ContainerKind::Supply,
            Side::Production => ContainerKind::Production,
        }
    }
}

/// A specific container on a specific entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerRef {
    pub owner: Entity,
    pub kind: ContainerKind,
}

impl ContainerRef {
    pub fn supply(owner: Entity) -> Self {
        Self {
            owner,
            kind: ContainerKind::Supply,
        }
    }

    pub fn production(owner: Entity) -> Self {
        Self {
            owner,
            kind: ContainerKind::Production,
        }
    }

    pub fn backpack(owner: Entity) -> Self {
        Self {
            owner,
            kind: ContainerKind::Backpack,
        }
    }
}
