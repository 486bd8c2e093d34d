//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.
//!
//! A building entity carries `(Name, ProductionUnit, CycleHandle)`; an actor
//! carries `(Name, Actor, Carrier)` plus an `ActiveSession` while it stands
//! in a zone.

mod actor;
mod building;
mod common;

pub use actor::*;
pub use building::*;
pub use common::*;
