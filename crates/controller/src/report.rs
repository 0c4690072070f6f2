//! Run statistics.

use std::time::Duration;

use crate::controller::StopRecord;
use crate::scenario::WaitOutcome;

/// Statistics from one scenario run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Wall-clock length of the run window
    pub duration: Duration,

    /// How the window ended
    pub outcome: WaitOutcome,

    /// Measurements delivered by the camera, guards included
    pub events_seen: u64,

    /// Largest pixel count observed
    pub peak_pixel_count: u64,

    /// The triggering measurement, if the threshold was crossed
    pub stop: Option<StopRecord>,

    /// Supervised vehicles in the run
    pub supervised: usize,

    /// NPC vehicles that actually spawned
    pub traffic: usize,
}

impl RunReport {
    /// Whether the stop transition happened
    pub fn stopped(&self) -> bool {
        self.stop.is_some()
    }

    /// Measurement rate over the window
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_seen as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Summary ===\n");
        println!("Window:");
        println!("  ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  ├─ Outcome: {:?}", self.outcome);
        println!("  ├─ Supervised vehicles: {}", self.supervised);
        println!("  └─ NPC vehicles: {}", self.traffic);

        println!("\nMeasurements:");
        println!("  ├─ Events observed: {}", self.events_seen);
        println!("  ├─ Events/sec: {:.2}", self.events_per_sec());
        println!("  └─ Peak pixel count: {}", self.peak_pixel_count);

        match &self.stop {
            Some(record) => {
                println!("\nStop triggered:");
                println!("  ├─ Frame: {}", record.frame);
                println!("  ├─ Timestamp: {:.3}s", record.timestamp);
                println!("  └─ Pixel count: {}", record.pixel_count);
            }
            None => println!("\nStop not triggered."),
        }
        println!();
    }
}
