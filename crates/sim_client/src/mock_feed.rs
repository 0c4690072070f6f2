//! Mock pixel feed
//!
//! Implements the `PixelFeed` trait without a simulator. Events are either
//! pushed synchronously from test code (`emit`) or replayed from a
//! background thread (`play`), matching the delivery model of a real
//! CARLA sensor callback.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use contracts::{ActorId, PixelCallback, PixelCountEvent, PixelFeed};
use tracing::{debug, trace};

/// Mock pixel-count feed
///
/// `emit` delivers one event on the caller's thread, which makes the
/// pre-arm race deterministic in tests. `play` spawns a generator thread
/// like a real sensor's dispatch context.
pub struct MockPixelFeed {
    actor_id: ActorId,
    listening: AtomicBool,
    callback: Mutex<Option<PixelCallback>>,
    frame: AtomicU64,
    started: Instant,
}

impl MockPixelFeed {
    /// Create a feed for the given camera actor
    pub fn new(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            listening: AtomicBool::new(false),
            callback: Mutex::new(None),
            frame: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Deliver a single measurement to the registered callback
    ///
    /// Returns false when nobody is listening (event dropped), true when
    /// the callback ran.
    pub fn emit(&self, pixel_count: u64) -> bool {
        if !self.listening.load(Ordering::Relaxed) {
            return false;
        }
        let callback = match self.callback.lock().unwrap().clone() {
            Some(cb) => cb,
            None => return false,
        };

        let frame = self.frame.fetch_add(1, Ordering::SeqCst) + 1;
        let event =
            PixelCountEvent::new(frame, self.started.elapsed().as_secs_f64(), pixel_count);
        trace!(actor_id = self.actor_id, frame, pixel_count, "mock feed emitting");
        callback(event);
        true
    }

    /// Replay a sequence of pixel counts from a background thread
    ///
    /// One event per `interval`, stopping early if listening ends.
    pub fn play(self: &Arc<Self>, counts: Vec<u64>, interval: Duration) -> thread::JoinHandle<()> {
        let feed = Arc::clone(self);
        thread::spawn(move || {
            debug!(
                actor_id = feed.actor_id,
                events = counts.len(),
                interval_ms = interval.as_millis() as u64,
                "mock feed playback started"
            );
            for count in counts {
                if !feed.is_listening() {
                    break;
                }
                feed.emit(count);
                thread::sleep(interval);
            }
            debug!(actor_id = feed.actor_id, "mock feed playback finished");
        })
    }
}

impl PixelFeed for MockPixelFeed {
    fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    fn listen(&self, callback: PixelCallback) {
        // Idempotent: if already listening, don't register again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.callback.lock().unwrap() = Some(callback);
        debug!(actor_id = self.actor_id, "mock feed listening");
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            // Drop the callback so captured handles are released
            *self.callback.lock().unwrap() = None;
            debug!(actor_id = self.actor_id, "mock feed stopped");
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}
