//! Building components.
//!
//! The building's storages and status live in its
//! [`ProductionUnit`](stockpile_logic::production::ProductionUnit) component.

use stockpile_logic::cancel::CancelToken;

/// Stops the building's production cycle when the building is destroyed.
#[derive(Debug, Clone, Default)]
pub struct CycleHandle {
    pub token: CancelToken,
}
