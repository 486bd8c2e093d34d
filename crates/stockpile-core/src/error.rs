//! Engine error type.

use hecs::Entity;
use stockpile_logic::error::{ConfigError, StorageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no building {0:?}")]
    NoSuchBuilding(Entity),

    #[error("no actor {0:?}")]
    NoSuchActor(Entity),

    #[error("storage contract violated: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("component access failed: {0}")]
    Component(#[from] hecs::ComponentError),
}
