//! PixelCountEvent - per-frame camera measurement.

use serde::{Deserialize, Serialize};

/// Measurement event delivered by the pixel-counting camera.
///
/// The camera counts matching pixels inside the simulator and reports one
/// scalar per rendered frame. The client never sees image data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelCountEvent {
    /// Sensor frame number
    pub frame: u64,

    /// CARLA simulation timestamp (seconds, f64) - primary clock
    pub timestamp: f64,

    /// Number of matching pixels counted for this frame
    pub pixel_count: u64,
}

impl PixelCountEvent {
    pub fn new(frame: u64, timestamp: f64, pixel_count: u64) -> Self {
        Self {
            frame,
            timestamp,
            pixel_count,
        }
    }
}
