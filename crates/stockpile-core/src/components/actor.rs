//! Actor components.
//!
//! The backpack itself is the actor's
//! [`Carrier`](stockpile_logic::carrier::Carrier) component.

use hecs::Entity;
use stockpile_logic::transfer::{Direction, TransferSession};

/// Timing of a mobile actor, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub transfer_ms: u64,
    /// How long an item collected into the backpack stays in transit
    pub settle_ms: u64,
}

/// Interaction zones around a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Standing here hands backpack items to the building's supply
    Receive = 0,
    /// Standing here takes products from the building
    Release = 1,
}

impl Zone {
    pub fn direction(&self) -> Direction {
        match self {
            Zone::Receive => Direction::Deposit,
            Zone::Release => Direction::Withdraw,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Zone::Receive),
            1 => Some(Zone::Release),
            _ => None,
        }
    }
}

/// The one transfer session an actor may run at a time.
#[derive(Debug, Clone)]
pub struct ActiveSession(pub TransferSession<Entity>);
