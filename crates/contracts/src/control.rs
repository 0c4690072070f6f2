//! Vehicle motion commands.
//!
//! The triple (throttle, steer, brake) applied to override a vehicle's
//! motion, plus the velocity vector used to zero it out directly.

use serde::{Deserialize, Serialize};

/// 3D vector, m/s for velocities
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    /// Zero vector
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Structured vehicle control command
///
/// Ranges: throttle [0, 1], steer [-1, 1], brake [0, 1].
/// `new` clamps out-of-range inputs instead of rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleControl {
    pub throttle: f64,
    pub steer: f64,
    pub brake: f64,
}

impl VehicleControl {
    /// Create a control command, clamping each component to its legal range
    pub fn new(throttle: f64, steer: f64, brake: f64) -> Self {
        Self {
            throttle: throttle.clamp(0.0, 1.0),
            steer: steer.clamp(-1.0, 1.0),
            brake: brake.clamp(0.0, 1.0),
        }
    }

    /// Zero throttle, zero steer, maximum brake
    pub fn full_brake() -> Self {
        Self {
            throttle: 0.0,
            steer: 0.0,
            brake: 1.0,
        }
    }

    /// Neutral command: no throttle, no steer, no brake
    pub fn neutral() -> Self {
        Self {
            throttle: 0.0,
            steer: 0.0,
            brake: 0.0,
        }
    }
}

impl Default for VehicleControl {
    fn default() -> Self {
        Self::neutral()
    }
}
