//! Error types for the domain model.
//!
//! Empty pops, unsatisfied recipes and full supplies are ordinary outcomes and
//! are reported through `Option` or outcome enums. The types here cover contract
//! violations and invalid configuration only.

use thiserror::Error;

/// A container was asked to hold more than it can.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    #[error("capacity exceeded: container holds {capacity} items")]
    CapacityExceeded { capacity: usize },
}

/// Invalid static configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("{name}: {field} must be positive, got {value}")]
    NonPositiveInterval {
        name: String,
        field: &'static str,
        value: f32,
    },

    #[error("{name}: poll interval {poll_ms} ms must be shorter than cycle interval {cycle_ms} ms")]
    PollNotShorterThanCycle {
        name: String,
        poll_ms: u64,
        cycle_ms: u64,
    },

    #[error("{name}: settle time must not be negative, got {value}")]
    NegativeSettle { name: String, value: f32 },

    #[error("{name}: {field} capacity must be at least 1")]
    ZeroCapacity { name: String, field: &'static str },

    #[error("{name}: recipe needs {needed} supply slots but capacity is {capacity}")]
    RecipeExceedsSupply {
        name: String,
        needed: usize,
        capacity: usize,
    },

    #[error("{name}: {count} starting items exceed backpack capacity {capacity}")]
    StartingItemsExceedCapacity {
        name: String,
        count: usize,
        capacity: usize,
    },

    #[error("invalid scenario file: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
