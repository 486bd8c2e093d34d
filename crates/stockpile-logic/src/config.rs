//! Static configuration for buildings, actors and whole scenarios.
//!
//! Everything here is fixed at construction time. Scenario files are JSON:
//!
//! ```json
//! {
//!   "buildings": [{
//!     "name": "Warehouse",
//!     "supply_capacity": 5,
//!     "production_capacity": 3,
//!     "recipe": ["Resource1", "Resource1", "Resource2"],
//!     "output": "Resource3",
//!     "cycle_interval": 3.0
//!   }],
//!   "actors": [{ "name": "Player", "capacity": 2, "starting_items": ["Resource1"] }]
//! }
//! ```
//!
//! Omitted fields take the defaults from [`crate::constants`].

use serde::{Deserialize, Serialize};

use crate::constants::{capacity, secs_to_ms, timing};
use crate::error::ConfigError;
use crate::layout::SlotLayout;
use crate::recipe::Recipe;
use crate::resources::{Palette, ResourceKind};

/// Construction parameters of a production building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    pub name: String,
    pub supply_capacity: usize,
    pub production_capacity: usize,
    pub recipe: Recipe,
    pub output: ResourceKind,
    /// Seconds between production passes
    pub cycle_interval: f32,
    /// Seconds to wait after a pass that found no supplies
    pub poll_interval: f32,
    /// Seconds a placed item stays in transit
    pub settle_time: f32,
    /// Optional floor on the transfer interval of sessions against this building
    pub transfer_interval: Option<f32>,
    pub supply_layout: SlotLayout,
    pub production_layout: SlotLayout,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            name: "Warehouse".into(),
            supply_capacity: capacity::SUPPLY,
            production_capacity: capacity::PRODUCTION,
            recipe: Recipe::new(vec![ResourceKind::Resource1, ResourceKind::Resource2]),
            output: ResourceKind::Resource3,
            cycle_interval: timing::CYCLE_INTERVAL,
            poll_interval: timing::SUPPLY_POLL_INTERVAL,
            settle_time: timing::SETTLE_TIME,
            transfer_interval: None,
            supply_layout: SlotLayout::default(),
            production_layout: SlotLayout::default(),
        }
    }
}

impl UnitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        positive(&self.name, "cycle_interval", self.cycle_interval)?;
        positive(&self.name, "poll_interval", self.poll_interval)?;
        if self.poll_ms() >= self.cycle_ms() {
            return Err(ConfigError::PollNotShorterThanCycle {
                name: self.name.clone(),
                poll_ms: self.poll_ms(),
                cycle_ms: self.cycle_ms(),
            });
        }
        if let Some(interval) = self.transfer_interval {
            positive(&self.name, "transfer_interval", interval)?;
        }
        settle(&self.name, self.settle_time)?;
        if self.production_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: self.name.clone(),
                field: "production",
            });
        }
        if self.recipe.len() > self.supply_capacity {
            return Err(ConfigError::RecipeExceedsSupply {
                name: self.name.clone(),
                needed: self.recipe.len(),
                capacity: self.supply_capacity,
            });
        }
        Ok(())
    }

    pub fn cycle_ms(&self) -> u64 {
        secs_to_ms(self.cycle_interval)
    }

    pub fn poll_ms(&self) -> u64 {
        secs_to_ms(self.poll_interval)
    }

    pub fn settle_ms(&self) -> u64 {
        secs_to_ms(self.settle_time)
    }

    pub fn transfer_ms(&self) -> Option<u64> {
        self.transfer_interval.map(secs_to_ms)
    }
}

/// Construction parameters of a mobile actor and its backpack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierConfig {
    pub name: String,
    pub capacity: usize,
    /// Seconds between two transfer attempts
    pub transfer_interval: f32,
    /// Seconds an item picked up stays in transit
    pub settle_time: f32,
    /// Items already in the backpack at spawn (oldest first)
    pub starting_items: Vec<ResourceKind>,
    pub layout: SlotLayout,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            name: "Player".into(),
            capacity: capacity::BACKPACK,
            transfer_interval: timing::TRANSFER_INTERVAL,
            settle_time: timing::SETTLE_TIME,
            starting_items: Vec::new(),
            layout: SlotLayout::default(),
        }
    }
}

impl CarrierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        positive(&self.name, "transfer_interval", self.transfer_interval)?;
        settle(&self.name, self.settle_time)?;
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: self.name.clone(),
                field: "backpack",
            });
        }
        if self.starting_items.len() > self.capacity {
            return Err(ConfigError::StartingItemsExceedCapacity {
                name: self.name.clone(),
                count: self.starting_items.len(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn transfer_ms(&self) -> u64 {
        secs_to_ms(self.transfer_interval)
    }

    pub fn settle_ms(&self) -> u64 {
        secs_to_ms(self.settle_time)
    }
}

/// A full world description: buildings, actors and the resource palette.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub palette: Palette,
    pub buildings: Vec<UnitConfig>,
    pub actors: Vec<CarrierConfig>,
}

impl ScenarioConfig {
    /// Parse and validate a JSON scenario.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let scenario: ScenarioConfig = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for building in &self.buildings {
            building.validate()?;
        }
        for actor in &self.actors {
            actor.validate()?;
        }
        Ok(())
    }
}

fn positive(name: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    // sub-millisecond intervals would schedule a task at the instant it ran
    if value.is_finite() && secs_to_ms(value) > 0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveInterval {
            name: name.to_string(),
            field,
            value,
        })
    }
}

fn settle(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeSettle {
            name: name.to_string(),
            value,
        })
    }
}
