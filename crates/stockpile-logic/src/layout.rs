//! Slot anchors for stacked items.
//!
//! The model never animates anything; it only tells the renderer where slot
//! `i` of a container sits relative to the container's transfer point.

use serde::{Deserialize, Serialize};

/// 3D offset in container-local space
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Self = Self { x: 0.0, y: 1.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

/// Maps a slot index to an anchor: `origin + step * index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotLayout {
    pub origin: Vec3,
    pub step: Vec3,
}

impl SlotLayout {
    pub fn new(origin: Vec3, step: Vec3) -> Self {
        Self { origin, step }
    }

    pub fn position_for_index(&self, index: usize) -> Vec3 {
        self.origin + self.step * index as f32
    }
}

impl Default for SlotLayout {
    /// Items stack upward, half a unit apart.
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            step: Vec3::UP * 0.5,
        }
    }
}
