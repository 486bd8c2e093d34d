//! Stockpile Core - Production and Hauling Simulation Engine
//!
//! An ECS-based simulation of production buildings and the actors who haul
//! resources between them.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Buildings and actors
//! - **Components**: Pure data attached to entities (ProductionUnit, Carrier, ActiveSession, etc.)
//! - **Systems**: One scheduled task each (production pass, transfer step, placement settle)
//!
//! Time is a deterministic millisecond clock. `update` advances it and runs
//! every task that fell due, in due-time order. Nothing in a task suspends,
//! so each capacity check and the mutation it guards happen together.
//!
//! # Example
//!
//! ```rust,no_run
//! use stockpile_core::prelude::*;
//! use stockpile_logic::config::{CarrierConfig, UnitConfig};
//!
//! let mut engine = SimulationEngine::new();
//! let warehouse = engine.spawn_building(UnitConfig::default()).unwrap();
//! let player = engine.spawn_actor(CarrierConfig::default()).unwrap();
//!
//! // Player walks into the receive zone
//! engine.enter_zone(player, warehouse, Zone::Receive).unwrap();
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//!     for _event in engine.drain_events() {
//!         // hand TransferStarted / TransferCompleted to the renderer
//!     }
//! }
//! ```

pub mod components;
pub mod engine;
pub mod error;
pub mod events;
pub mod placement;
pub mod scheduler;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::SimulationEngine;
    pub use crate::error::EngineError;
    pub use crate::events::SimEvent;
}
