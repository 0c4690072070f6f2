//! PixelFeed trait - measurement source abstraction
//!
//! Defines a unified interface for the camera's pixel-count stream,
//! decoupling the controller from concrete sensor implementations.
//! Supports unified handling of real CARLA sensors and Mock feeds.

use std::sync::Arc;

use crate::{ActorId, PixelCountEvent};

/// Measurement callback type
///
/// When the camera produces a pixel count, it delivers a `PixelCountEvent`
/// through this callback. Uses `Arc` to allow callback sharing across
/// multiple contexts.
pub type PixelCallback = Arc<dyn Fn(PixelCountEvent) + Send + Sync>;

/// Pixel-count feed trait
///
/// Abstracts the common behavior of the real CARLA camera and Mock feeds.
/// The callback runs on the feed's own dispatch context, concurrently with
/// the thread that registered it - implementations and consumers must not
/// assume any ordering against the registering thread.
pub trait PixelFeed: Send + Sync {
    /// Actor handle of the camera backing this feed
    fn actor_id(&self) -> ActorId;

    /// Register the measurement callback
    ///
    /// Events may begin arriving before this call returns. If already
    /// listening, repeated calls are idempotent (won't register multiple
    /// callbacks).
    fn listen(&self, callback: PixelCallback);

    /// Stop listening
    ///
    /// Stops event delivery. For Mock feeds, stops the background thread;
    /// for real sensors, calls CARLA sensor.stop().
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}

/// Blanket delegation so a shared `Arc<T>` can stand in for its feed.
///
/// Lives in this crate because the orphan rule forbids implementing the
/// `PixelFeed` trait for the foreign `Arc` type in downstream crates.
impl<T: PixelFeed + ?Sized> PixelFeed for Arc<T> {
    fn actor_id(&self) -> ActorId {
        (**self).actor_id()
    }

    fn listen(&self, callback: PixelCallback) {
        (**self).listen(callback)
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn is_listening(&self) -> bool {
        (**self).is_listening()
    }
}
