//! CARLA client abstraction
//!
//! Defines traits for interacting with the simulator, supporting real
//! implementation and mock testing.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use contracts::{
    ActorId, PixelFeed, SpawnPoint, Transform, VehicleControl, VehicleRequest, Vector3D,
};

use crate::error::Result;

/// Simulator client trait
///
/// Abstracts the simulator session for testing and future implementation
/// replacement. Session and actor lifecycle operations are async; vehicle
/// control and feed access are sync because they are issued from the
/// sensor callback thread.
pub trait SimClient: Send + Sync {
    /// Connect to the simulator server
    ///
    /// `timeout` bounds how long the session waits for the server before
    /// failing. Fatal on failure; nothing has been spawned yet.
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Number of recommended spawn points on the current map
    fn spawn_point_count(&self) -> impl Future<Output = Result<usize>> + Send;

    /// Spawn a vehicle (strict)
    ///
    /// Fails if the spot is occupied, the blueprint is unknown, or the
    /// spawn index is out of range.
    fn spawn_vehicle(
        &self,
        request: &VehicleRequest,
        spawn: SpawnPoint,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Spawn a vehicle (best-effort)
    ///
    /// Returns `Ok(None)` when the spot is already occupied; any other
    /// failure (e.g. unknown blueprint) is still an error.
    fn try_spawn_vehicle(
        &self,
        request: &VehicleRequest,
        spawn: SpawnPoint,
    ) -> impl Future<Output = Result<Option<ActorId>>> + Send;

    /// Spawn the pixel-count camera attached to a parent vehicle
    ///
    /// # Arguments
    /// * `blueprint` - Sensor blueprint name, e.g., "sensor.camera.rgb_ocl"
    /// * `transform` - Pose relative to the parent actor
    /// * `parent_id` - Parent vehicle actor ID
    /// * `attributes` - Sensor attributes
    fn spawn_camera(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Enable or disable autonomous driving on a vehicle
    fn set_autopilot(&self, actor_id: ActorId, enabled: bool) -> Result<()>;

    /// Command a vehicle's target velocity directly, bypassing physics
    fn set_target_velocity(&self, actor_id: ActorId, velocity: Vector3D) -> Result<()>;

    /// Apply a structured control command to a vehicle
    fn apply_control(&self, actor_id: ActorId, control: VehicleControl) -> Result<()>;

    /// Destroy an actor
    ///
    /// Idempotent operation: returns Ok if the actor doesn't exist.
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    /// Destroy many actors in one request
    ///
    /// Best-effort: a per-actor failure is logged and does not abort
    /// destruction of the remaining actors.
    fn destroy_batch(&self, actor_ids: &[ActorId]) -> impl Future<Output = Result<()>> + Send;

    /// Check if an actor exists
    fn actor_exists(&self, actor_id: ActorId) -> impl Future<Output = Result<bool>> + Send;

    /// Get the measurement feed of a spawned camera
    ///
    /// Returns an object implementing `PixelFeed`, None if the actor is
    /// unknown or is not a camera. This is the core interface for
    /// unifying Mock and Real sensors.
    fn pixel_feed(&self, actor_id: ActorId) -> Option<Box<dyn PixelFeed>>;
}
