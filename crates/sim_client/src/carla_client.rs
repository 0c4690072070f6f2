//! Real CARLA client implementation
//!
//! Connects to a CARLA server using the carla-rust crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use carla::client::{ActorBase, Client, Sensor, Vehicle, World};
use carla::geom::{Location, Rotation, Transform as CarlaTransform, Vector3D as CarlaVector3D};
use carla::rpc::VehicleControl as CarlaVehicleControl;
use contracts::{
    ActorId, PixelFeed, SpawnPoint, Transform, VehicleControl, VehicleRequest, Vector3D,
};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::carla_feed::CarlaPixelFeed;
use crate::client::SimClient;
use crate::error::{Result, SimClientError};

/// Real CARLA client
///
/// Wraps carla-rust's Client, implements the SimClient trait.
/// Uses Mutex for interior mutability, allowing `&self` methods to modify
/// World; the registry keeps every spawned actor for teardown and makes
/// destroy idempotent.
#[derive(Default, Clone)]
pub struct RealCarlaClient {
    /// CARLA client
    client: Arc<Mutex<Option<Client>>>,
    /// World reference (uses Mutex for interior mutability)
    world: Arc<Mutex<Option<World>>>,
    /// Created actors list (for teardown)
    actors: Arc<Mutex<HashMap<ActorId, ActorType>>>,
}

/// Actor type enumeration
#[derive(Clone)]
enum ActorType {
    Vehicle(Vehicle),
    Sensor(Sensor),
}

impl RealCarlaClient {
    /// Create new client (disconnected state)
    pub fn new() -> Self {
        Self::default()
    }

    /// Access World with mutable reference, ensuring connected
    fn with_world_mut<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut World) -> Result<R>,
    {
        let mut world_guard = self.world.lock().unwrap();
        let world = world_guard
            .as_mut()
            .ok_or_else(|| SimClientError::connection("not connected to CARLA server"))?;
        f(world)
    }

    /// Save actor to registry for teardown
    fn store_actor(&self, actor_id: ActorId, actor: ActorType) {
        self.actors.lock().unwrap().insert(actor_id, actor);
    }

    fn vehicle_handle(&self, actor_id: ActorId) -> Result<Vehicle> {
        let actors = self.actors.lock().unwrap();
        match actors.get(&actor_id) {
            Some(ActorType::Vehicle(vehicle)) => Ok(vehicle.clone()),
            _ => Err(SimClientError::ActorNotFound { actor_id }),
        }
    }

    /// Resolve the spawn transform among the map's recommended points
    fn select_spawn_transform(world: &mut World, spawn: SpawnPoint) -> Result<CarlaTransform> {
        let spawn_points = world.map().recommended_spawn_points();
        let count = spawn_points.len();
        if count == 0 {
            return Err(SimClientError::spawn(
                "spawn_point",
                "map has no recommended spawn points",
            ));
        }

        let index = match spawn {
            SpawnPoint::Index(index) => {
                if index >= count {
                    return Err(SimClientError::spawn(
                        "spawn_point",
                        format!("spawn index {index} out of range (have {count})"),
                    ));
                }
                index
            }
            SpawnPoint::Random => rand::rng().random_range(0..count),
        };

        spawn_points
            .get(index)
            .cloned()
            .ok_or_else(|| SimClientError::spawn("spawn_point", "spawn point lookup failed"))
    }

    /// Resolve the vehicle blueprint, applying the color attribute
    fn resolve_vehicle_blueprint(
        world: &mut World,
        request: &VehicleRequest,
    ) -> Result<carla::client::ActorBlueprint> {
        let library = world.blueprint_library();

        let mut blueprint = match &request.blueprint {
            Some(name) => library
                .find(name)
                .ok_or_else(|| SimClientError::blueprint_not_found(name))?,
            None => {
                let vehicles = library.filter("vehicle.*");
                let count = vehicles.len();
                if count == 0 {
                    return Err(SimClientError::blueprint_not_found("vehicle.*"));
                }
                let index = rand::rng().random_range(0..count);
                vehicles
                    .get(index)
                    .ok_or_else(|| SimClientError::blueprint_not_found("vehicle.*"))?
            }
        };

        // The library does not expose recommended color values; a random
        // "R,G,B" triple stands in when no color is configured.
        let color = request.color.clone().unwrap_or_else(|| {
            let mut rng = rand::rng();
            format!(
                "{},{},{}",
                rng.random_range(0..=255u8),
                rng.random_range(0..=255u8),
                rng.random_range(0..=255u8)
            )
        });
        if !blueprint.set_attribute("color", &color) {
            warn!(color = %color, "failed to set vehicle color attribute");
        }

        Ok(blueprint)
    }

    fn create_vehicle(
        world: &mut World,
        request: &VehicleRequest,
        spawn: SpawnPoint,
    ) -> Result<Vehicle> {
        let blueprint = Self::resolve_vehicle_blueprint(world, request)?;
        let transform = Self::select_spawn_transform(world, spawn)?;
        let label = request.blueprint.as_deref().unwrap_or("vehicle.*");

        let actor = world
            .spawn_actor(&blueprint, &transform)
            .map_err(|e| SimClientError::spawn(label, e.to_string()))?;

        Vehicle::try_from(actor)
            .map_err(|_| SimClientError::spawn(label, "spawned actor is not a vehicle"))
    }

    fn create_camera(
        world: &mut World,
        blueprint_name: &str,
        transform: Transform,
        parent: &Vehicle,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<Sensor> {
        let library = world.blueprint_library();
        let mut blueprint = library
            .find(blueprint_name)
            .ok_or_else(|| SimClientError::blueprint_not_found(blueprint_name))?;

        for (key, value) in attributes {
            if !blueprint.set_attribute(key, value) {
                warn!(key, value, "failed to set camera attribute");
            }
        }

        let carla_transform = Self::to_carla_transform(transform);
        let actor = world
            .spawn_actor_attached(&blueprint, &carla_transform, parent, None)
            .map_err(|e| SimClientError::AttachFailed {
                blueprint: blueprint_name.to_string(),
                parent_id,
                message: e.to_string(),
            })?;

        Sensor::try_from(actor).map_err(|_| SimClientError::AttachFailed {
            blueprint: blueprint_name.to_string(),
            parent_id,
            message: "spawned actor is not a sensor".to_string(),
        })
    }

    fn destroy_vehicle_actor(vehicle: Vehicle, actor_id: ActorId) {
        if !vehicle.destroy() {
            warn!(actor_id, "destroy vehicle returned false");
        }
    }

    fn destroy_sensor_actor(sensor: Sensor, actor_id: ActorId) {
        if sensor.is_listening() {
            sensor.stop();
        }
        if !sensor.destroy() {
            warn!(actor_id, "destroy sensor returned false");
        }
    }

    /// Convert internal Transform to CARLA Transform
    fn to_carla_transform(transform: Transform) -> CarlaTransform {
        let location = Location {
            x: transform.location.x as f32,
            y: transform.location.y as f32,
            z: transform.location.z as f32,
        };
        let rotation = Rotation {
            pitch: transform.rotation.pitch as f32,
            yaw: transform.rotation.yaw as f32,
            roll: transform.rotation.roll as f32,
        };
        CarlaTransform { location, rotation }
    }

    /// Get underlying CARLA Sensor object
    pub fn get_sensor(&self, actor_id: ActorId) -> Option<Sensor> {
        let actors = self.actors.lock().unwrap();
        match actors.get(&actor_id) {
            Some(ActorType::Sensor(sensor)) => Some(sensor.clone()),
            _ => None,
        }
    }
}

impl SimClient for RealCarlaClient {
    #[instrument(name = "carla_connect", skip(self, timeout), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let mut client = Client::connect(host, port, None);
        client.set_timeout(timeout);
        let world = client.world();

        info!(
            map = %world.map().name(),
            "connected to CARLA server"
        );

        *self.client.lock().unwrap() = Some(client);
        *self.world.lock().unwrap() = Some(world);

        Ok(())
    }

    async fn spawn_point_count(&self) -> Result<usize> {
        self.with_world_mut(|world| Ok(world.map().recommended_spawn_points().len()))
    }

    #[instrument(name = "carla_spawn_vehicle", skip(self, request), fields(blueprint = ?request.blueprint))]
    async fn spawn_vehicle(&self, request: &VehicleRequest, spawn: SpawnPoint) -> Result<ActorId> {
        let vehicle = self.with_world_mut(|world| Self::create_vehicle(world, request, spawn))?;
        let actor_id = vehicle.id();

        debug!(actor_id, "vehicle spawned");
        self.store_actor(actor_id, ActorType::Vehicle(vehicle));
        Ok(actor_id)
    }

    #[instrument(name = "carla_try_spawn_vehicle", skip(self, request), fields(blueprint = ?request.blueprint))]
    async fn try_spawn_vehicle(
        &self,
        request: &VehicleRequest,
        spawn: SpawnPoint,
    ) -> Result<Option<ActorId>> {
        // The Rust client has no dedicated try_spawn; a spawn rejection
        // (occupied spot) is reported as None, blueprint lookup errors
        // still propagate.
        let resolved = self.with_world_mut(|world| {
            let blueprint = Self::resolve_vehicle_blueprint(world, request)?;
            let transform = Self::select_spawn_transform(world, spawn)?;
            Ok(world.spawn_actor(&blueprint, &transform).ok())
        })?;

        let Some(actor) = resolved else {
            debug!("spawn point occupied, skipping");
            return Ok(None);
        };

        let vehicle = Vehicle::try_from(actor).map_err(|_| {
            SimClientError::spawn(
                request.blueprint.as_deref().unwrap_or("vehicle.*"),
                "spawned actor is not a vehicle",
            )
        })?;
        let actor_id = vehicle.id();

        debug!(actor_id, "npc vehicle spawned");
        self.store_actor(actor_id, ActorType::Vehicle(vehicle));
        Ok(Some(actor_id))
    }

    #[instrument(
        name = "carla_spawn_camera",
        skip(self, transform, attributes),
        fields(blueprint = %blueprint, parent_id)
    )]
    async fn spawn_camera(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        let parent = self.vehicle_handle(parent_id)?;
        let sensor = self.with_world_mut(|world| {
            Self::create_camera(world, blueprint, transform, &parent, parent_id, attributes)
        })?;

        let actor_id = sensor.id();
        debug!(actor_id, parent_id, "camera spawned and attached");
        self.store_actor(actor_id, ActorType::Sensor(sensor));
        Ok(actor_id)
    }

    fn set_autopilot(&self, actor_id: ActorId, enabled: bool) -> Result<()> {
        let vehicle = self.vehicle_handle(actor_id)?;
        vehicle.set_autopilot(enabled);
        debug!(actor_id, enabled, "autopilot updated");
        Ok(())
    }

    fn set_target_velocity(&self, actor_id: ActorId, velocity: Vector3D) -> Result<()> {
        let vehicle = self.vehicle_handle(actor_id)?;
        vehicle.set_target_velocity(&CarlaVector3D {
            x: velocity.x as f32,
            y: velocity.y as f32,
            z: velocity.z as f32,
        });
        Ok(())
    }

    fn apply_control(&self, actor_id: ActorId, control: VehicleControl) -> Result<()> {
        let vehicle = self.vehicle_handle(actor_id)?;
        vehicle.apply_control(&CarlaVehicleControl {
            throttle: control.throttle as f32,
            steer: control.steer as f32,
            brake: control.brake as f32,
            ..Default::default()
        });
        Ok(())
    }

    #[instrument(name = "carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let mut actors = self.actors.lock().unwrap();

        if let Some(actor) = actors.remove(&actor_id) {
            match actor {
                ActorType::Vehicle(v) => Self::destroy_vehicle_actor(v, actor_id),
                ActorType::Sensor(s) => Self::destroy_sensor_actor(s, actor_id),
            }
            debug!(actor_id, "actor destroyed");
        }

        // Idempotent: return Ok even if not exists
        Ok(())
    }

    #[instrument(name = "carla_destroy_batch", skip(self, actor_ids), fields(count = actor_ids.len()))]
    async fn destroy_batch(&self, actor_ids: &[ActorId]) -> Result<()> {
        for &actor_id in actor_ids {
            if let Err(e) = self.destroy_actor(actor_id).await {
                warn!(actor_id, error = %e, "batch destroy entry failed");
            }
        }
        Ok(())
    }

    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(self.actors.lock().unwrap().contains_key(&actor_id))
    }

    fn pixel_feed(&self, actor_id: ActorId) -> Option<Box<dyn PixelFeed>> {
        let sensor = self.get_sensor(actor_id)?;
        Some(Box::new(CarlaPixelFeed::new(actor_id, sensor)))
    }
}

#[cfg(test)]
mod tests {
    // Real client tests require a CARLA server running.
    // These tests are marked as ignore, only run when a server is available.

    use super::*;

    #[tokio::test]
    #[ignore = "requires CARLA server"]
    async fn test_real_client_connect() {
        let mut client = RealCarlaClient::new();
        client
            .connect("localhost", 2000, Duration::from_secs_f64(2.0))
            .await
            .unwrap();
    }
}
