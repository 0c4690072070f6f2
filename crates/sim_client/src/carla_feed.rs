//! CARLA pixel feed wrapper
//!
//! Wraps the CARLA native Sensor as a type implementing the `PixelFeed`
//! trait. Only compiled when the `real-carla` feature is enabled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use carla::client::Sensor;
use carla::sensor::SensorDataBase;
use contracts::{ActorId, PixelCallback, PixelCountEvent, PixelFeed};
use tracing::{debug, trace, warn};

/// CARLA Sensor wrapper
///
/// Forwards the pixel-count stream of the rgb_ocl camera to a
/// `PixelCallback`, allowing the controller to handle real sensors and
/// Mock feeds uniformly.
pub struct CarlaPixelFeed {
    actor_id: ActorId,
    sensor: Sensor,
    listening: Arc<AtomicBool>,
}

impl CarlaPixelFeed {
    /// Create new CARLA pixel feed
    pub fn new(actor_id: ActorId, sensor: Sensor) -> Self {
        Self {
            actor_id,
            sensor,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Decode the pixel-count payload
///
/// The sensor serializes a msgpack array holding one u64
/// (`PixelCountEventSerializer::Data`).
fn decode_pixel_count(payload: &[u8]) -> Option<u64> {
    let mut cursor = payload;
    let value = rmpv::decode::read_value(&mut cursor).ok()?;
    let entries = value.as_array()?;
    entries.first()?.as_u64()
}

impl PixelFeed for CarlaPixelFeed {
    fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    fn listen(&self, callback: PixelCallback) {
        // Idempotent: if already listening, don't register again
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!(actor_id = self.actor_id, "sensor already listening");
            return;
        }

        let actor_id = self.actor_id;
        let listening = self.listening.clone();

        debug!(actor_id, "starting CARLA pixel sensor");

        self.sensor.listen(move |sensor_data| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }

            let frame = sensor_data.frame() as u64;
            let timestamp = sensor_data.timestamp();

            match decode_pixel_count(sensor_data.as_raw_bytes()) {
                Some(pixel_count) => {
                    trace!(actor_id, frame, pixel_count, "pixel count received");
                    callback(PixelCountEvent::new(frame, timestamp, pixel_count));
                }
                None => {
                    trace!(actor_id, frame, "failed to decode pixel count payload");
                }
            }
        });
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(actor_id = self.actor_id, "stopping CARLA pixel sensor");
            self.sensor.stop();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reads_msgpack_count_array() {
        // msgpack fixarray(1) with a positive integer
        let payload = [0x91u8, 0xcd, 0x30, 0x39]; // [12345]
        assert_eq!(decode_pixel_count(&payload), Some(12345));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode_pixel_count(&[0xc1]), None);
        assert_eq!(decode_pixel_count(&[]), None);
    }
}
