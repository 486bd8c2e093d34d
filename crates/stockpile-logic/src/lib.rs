//! Pure domain model for Stockpile.
//!
//! Buildings convert supplies into products on a timer; actors carry items
//! between buildings in a bounded backpack. This crate holds the state and
//! the single-step operations on it. It has no clock and no ECS: callers
//! decide when a production pass or a transfer step runs, which keeps every
//! rule unit-testable.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cancel`] | Shared cancellation tokens for repeating tasks |
//! | [`carrier`] | Actor backpack with removal at any slot |
//! | [`config`] | Building, actor and scenario configuration (JSON) |
//! | [`constants`] | Default timings and capacities |
//! | [`error`] | Storage contract and configuration errors |
//! | [`layout`] | Slot index → anchor offset mapping |
//! | [`production`] | Production buildings and their cycle |
//! | [`recipe`] | Ordered recipe inputs |
//! | [`resources`] | Resource kinds, items, per-item transit locks, ids |
//! | [`storage`] | Bounded LIFO storage with atomic recipe withdrawal |
//! | [`transfer`] | Deposit and withdraw sessions |

pub mod cancel;
pub mod carrier;
pub mod config;
pub mod constants;
pub mod error;
pub mod layout;
pub mod production;
pub mod recipe;
pub mod resources;
mod stack;
pub mod storage;
pub mod transfer;

pub use stack::Retarget;
