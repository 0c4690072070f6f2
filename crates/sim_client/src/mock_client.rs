//! Mock CARLA client
//!
//! Mock implementation for unit tests and offline runs, supporting
//! injectable failure scenarios and a recorded command log.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{
    ActorId, PixelFeed, SpawnPoint, Transform, VehicleControl, VehicleRequest, Vector3D,
};
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::client::SimClient;
use crate::error::{Result, SimClientError};
use crate::mock_feed::MockPixelFeed;

/// Mock client configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Recommended spawn points on the mock map
    pub spawn_point_count: usize,
    /// Spawn indices considered occupied from the start
    pub occupied_spawn_indices: Vec<usize>,
    /// Blueprint names that should fail lookup
    pub unknown_blueprints: Vec<String>,
    /// Blueprint names whose strict spawn should fail
    pub fail_vehicles: Vec<String>,
    /// Actor IDs whose destroy should fail
    pub fail_destroy: Vec<ActorId>,
    /// Reject the connect call
    pub fail_connect: bool,
    /// Pool used to resolve random blueprint requests
    pub vehicle_blueprints: Vec<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            spawn_point_count: 200,
            occupied_spawn_indices: Vec::new(),
            unknown_blueprints: Vec::new(),
            fail_vehicles: Vec::new(),
            fail_destroy: Vec::new(),
            fail_connect: false,
            vehicle_blueprints: vec![
                "vehicle.dodge.charger_2020".to_string(),
                "vehicle.ford.ambulance".to_string(),
                "vehicle.tesla.model3".to_string(),
                "vehicle.audi.tt".to_string(),
                "vehicle.nissan.micra".to_string(),
            ],
        }
    }
}

/// One recorded vehicle command, for test assertions
#[derive(Debug, Clone, PartialEq)]
pub enum CommandRecord {
    Autopilot { actor_id: ActorId, enabled: bool },
    TargetVelocity { actor_id: ActorId, velocity: Vector3D },
    Control { actor_id: ActorId, control: VehicleControl },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActorKind {
    Vehicle,
    Sensor,
}

#[derive(Debug, Clone)]
struct SpawnedActor {
    blueprint: String,
    kind: ActorKind,
    #[allow(dead_code)]
    parent: Option<ActorId>,
}

struct MockInner {
    config: MockConfig,
    /// Actor ID counter, starts at 1000 for easy identification
    next_actor_id: AtomicU32,
    connected: Mutex<bool>,
    actors: Mutex<HashMap<ActorId, SpawnedActor>>,
    /// Spawn indices currently taken (seeded from config, grows on spawn)
    occupied: Mutex<HashSet<usize>>,
    /// Every vehicle command issued through this client, in order
    commands: Mutex<Vec<CommandRecord>>,
    autopilot: Mutex<HashMap<ActorId, bool>>,
    feeds: Mutex<HashMap<ActorId, Arc<MockPixelFeed>>>,
    /// Actors actually removed by destroy calls, in order
    destroyed: Mutex<Vec<ActorId>>,
}

/// Mock CARLA client
///
/// Interior state is Arc-shared so the client is cheaply `Clone`, same as
/// the real client; the measurement callback captures its own handle.
#[derive(Clone)]
pub struct MockSimClient {
    inner: Arc<MockInner>,
}

impl MockSimClient {
    /// Create a default mock client
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a mock client with failure injection
    pub fn with_config(config: MockConfig) -> Self {
        let occupied = config.occupied_spawn_indices.iter().copied().collect();
        Self {
            inner: Arc::new(MockInner {
                config,
                next_actor_id: AtomicU32::new(1000),
                connected: Mutex::new(false),
                actors: Mutex::new(HashMap::new()),
                occupied: Mutex::new(occupied),
                commands: Mutex::new(Vec::new()),
                autopilot: Mutex::new(HashMap::new()),
                feeds: Mutex::new(HashMap::new()),
                destroyed: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Number of live actors
    pub fn actor_count(&self) -> usize {
        self.inner.actors.lock().unwrap().len()
    }

    /// Whether the actor is currently alive
    pub fn has_actor(&self, actor_id: ActorId) -> bool {
        self.inner.actors.lock().unwrap().contains_key(&actor_id)
    }

    /// Blueprint a live actor was spawned from
    pub fn actor_blueprint(&self, actor_id: ActorId) -> Option<String> {
        self.inner
            .actors
            .lock()
            .unwrap()
            .get(&actor_id)
            .map(|actor| actor.blueprint.clone())
    }

    /// Recorded commands, in issue order
    pub fn commands(&self) -> Vec<CommandRecord> {
        self.inner.commands.lock().unwrap().clone()
    }

    /// Recorded commands targeting one actor
    pub fn commands_for(&self, actor_id: ActorId) -> Vec<CommandRecord> {
        self.commands()
            .into_iter()
            .filter(|record| match record {
                CommandRecord::Autopilot { actor_id: id, .. }
                | CommandRecord::TargetVelocity { actor_id: id, .. }
                | CommandRecord::Control { actor_id: id, .. } => *id == actor_id,
            })
            .collect()
    }

    /// Actors removed by destroy calls, in order (no-op destroys excluded)
    pub fn destroyed(&self) -> Vec<ActorId> {
        self.inner.destroyed.lock().unwrap().clone()
    }

    /// Autopilot state of a vehicle (false if never set)
    pub fn autopilot_enabled(&self, actor_id: ActorId) -> bool {
        self.inner
            .autopilot
            .lock()
            .unwrap()
            .get(&actor_id)
            .copied()
            .unwrap_or(false)
    }

    /// The mock feed registered for a spawned camera
    pub fn feed(&self, actor_id: ActorId) -> Option<Arc<MockPixelFeed>> {
        self.inner.feeds.lock().unwrap().get(&actor_id).cloned()
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.inner.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if *self.inner.connected.lock().unwrap() {
            Ok(())
        } else {
            Err(SimClientError::connection("not connected"))
        }
    }

    /// Resolve a blueprint request against the mock library
    fn resolve_blueprint(&self, request: &VehicleRequest) -> Result<String> {
        let config = &self.inner.config;
        match &request.blueprint {
            Some(name) => {
                if config.unknown_blueprints.contains(name) {
                    return Err(SimClientError::blueprint_not_found(name));
                }
                Ok(name.clone())
            }
            None => config
                .vehicle_blueprints
                .choose(&mut rand::rng())
                .cloned()
                .ok_or_else(|| SimClientError::blueprint_not_found("vehicle.*")),
        }
    }

    /// Pick the concrete spawn index; Ok(None) means the spot is occupied
    fn resolve_spawn_index(&self, spawn: SpawnPoint) -> Result<Option<usize>> {
        let count = self.inner.config.spawn_point_count;
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

        let mut occupied = self.inner.occupied.lock().unwrap();
        if occupied.contains(&index) {
            return Ok(None);
        }
        occupied.insert(index);
        Ok(Some(index))
    }

    fn insert_vehicle(&self, blueprint: String) -> ActorId {
        let actor_id = self.allocate_actor_id();
        self.inner.actors.lock().unwrap().insert(
            actor_id,
            SpawnedActor {
                blueprint,
                kind: ActorKind::Vehicle,
                parent: None,
            },
        );
        actor_id
    }

    fn vehicle_exists(&self, actor_id: ActorId) -> Result<()> {
        let actors = self.inner.actors.lock().unwrap();
        match actors.get(&actor_id) {
            Some(actor) if actor.kind == ActorKind::Vehicle => Ok(()),
            _ => Err(SimClientError::ActorNotFound { actor_id }),
        }
    }

    fn record(&self, record: CommandRecord) {
        self.inner.commands.lock().unwrap().push(record);
    }
}

impl Default for MockSimClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClient for MockSimClient {
    #[instrument(name = "mock_connect", skip(self, _timeout), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16, _timeout: Duration) -> Result<()> {
        if self.inner.config.fail_connect {
            return Err(SimClientError::connection(format!(
                "mock refused connection to {host}:{port}"
            )));
        }
        *self.inner.connected.lock().unwrap() = true;
        Ok(())
    }

    async fn spawn_point_count(&self) -> Result<usize> {
        self.ensure_connected()?;
        Ok(self.inner.config.spawn_point_count)
    }

    #[instrument(name = "mock_spawn_vehicle", skip(self, request), fields(blueprint = ?request.blueprint))]
    async fn spawn_vehicle(&self, request: &VehicleRequest, spawn: SpawnPoint) -> Result<ActorId> {
        self.ensure_connected()?;
        let blueprint = self.resolve_blueprint(request)?;

        if self.inner.config.fail_vehicles.contains(&blueprint) {
            return Err(SimClientError::spawn(&blueprint, "mock failure"));
        }

        match self.resolve_spawn_index(spawn)? {
            Some(_) => Ok(self.insert_vehicle(blueprint)),
            None => Err(SimClientError::spawn(&blueprint, "spawn point occupied")),
        }
    }

    #[instrument(name = "mock_try_spawn_vehicle", skip(self, request), fields(blueprint = ?request.blueprint))]
    async fn try_spawn_vehicle(
        &self,
        request: &VehicleRequest,
        spawn: SpawnPoint,
    ) -> Result<Option<ActorId>> {
        self.ensure_connected()?;
        let blueprint = self.resolve_blueprint(request)?;

        match self.resolve_spawn_index(spawn)? {
            Some(_) => Ok(Some(self.insert_vehicle(blueprint))),
            None => {
                debug!(blueprint = %blueprint, "spawn point occupied, skipping");
                Ok(None)
            }
        }
    }

    #[instrument(
        name = "mock_spawn_camera",
        skip(self, _transform, _attributes),
        fields(blueprint = %blueprint, parent_id)
    )]
    async fn spawn_camera(
        &self,
        blueprint: &str,
        _transform: Transform,
        parent_id: ActorId,
        _attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        self.ensure_connected()?;

        if self.inner.config.unknown_blueprints.iter().any(|b| b == blueprint) {
            return Err(SimClientError::blueprint_not_found(blueprint));
        }
        if !self.inner.actors.lock().unwrap().contains_key(&parent_id) {
            return Err(SimClientError::AttachFailed {
                blueprint: blueprint.to_string(),
                parent_id,
                message: "parent actor not found".into(),
            });
        }

        let actor_id = self.allocate_actor_id();
        self.inner.actors.lock().unwrap().insert(
            actor_id,
            SpawnedActor {
                blueprint: blueprint.to_string(),
                kind: ActorKind::Sensor,
                parent: Some(parent_id),
            },
        );
        self.inner
            .feeds
            .lock()
            .unwrap()
            .insert(actor_id, Arc::new(MockPixelFeed::new(actor_id)));
        Ok(actor_id)
    }

    fn set_autopilot(&self, actor_id: ActorId, enabled: bool) -> Result<()> {
        self.vehicle_exists(actor_id)?;
        self.inner.autopilot.lock().unwrap().insert(actor_id, enabled);
        self.record(CommandRecord::Autopilot { actor_id, enabled });
        Ok(())
    }

    fn set_target_velocity(&self, actor_id: ActorId, velocity: Vector3D) -> Result<()> {
        self.vehicle_exists(actor_id)?;
        self.record(CommandRecord::TargetVelocity { actor_id, velocity });
        Ok(())
    }

    fn apply_control(&self, actor_id: ActorId, control: VehicleControl) -> Result<()> {
        self.vehicle_exists(actor_id)?;
        self.record(CommandRecord::Control { actor_id, control });
        Ok(())
    }

    #[instrument(name = "mock_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        if self.inner.config.fail_destroy.contains(&actor_id) {
            return Err(SimClientError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        // Idempotent: destroying an unknown actor is a no-op
        if self.inner.actors.lock().unwrap().remove(&actor_id).is_some() {
            if let Some(feed) = self.inner.feeds.lock().unwrap().remove(&actor_id) {
                feed.stop();
            }
            self.inner.destroyed.lock().unwrap().push(actor_id);
        }
        Ok(())
    }

    #[instrument(name = "mock_destroy_batch", skip(self, actor_ids), fields(count = actor_ids.len()))]
    async fn destroy_batch(&self, actor_ids: &[ActorId]) -> Result<()> {
        for &actor_id in actor_ids {
            if let Err(e) = self.destroy_actor(actor_id).await {
                warn!(actor_id, error = %e, "batch destroy entry failed");
            }
        }
        Ok(())
    }

    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(self.inner.actors.lock().unwrap().contains_key(&actor_id))
    }

    fn pixel_feed(&self, actor_id: ActorId) -> Option<Box<dyn PixelFeed>> {
        let feed = self.inner.feeds.lock().unwrap().get(&actor_id).cloned()?;
        Some(Box::new(feed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connected_client() -> MockSimClient {
        let mut client = MockSimClient::new();
        client
            .connect("localhost", 2000, Duration::from_secs_f64(2.0))
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn spawn_vehicle_allocates_ids_from_1000() {
        let client = connected_client().await;
        let actor_id = client
            .spawn_vehicle(&VehicleRequest::random(), SpawnPoint::Index(0))
            .await
            .unwrap();
        assert!(actor_id >= 1000);
        assert_eq!(client.actor_count(), 1);
    }

    #[tokio::test]
    async fn strict_spawn_fails_on_occupied_index() {
        let client = connected_client().await;
        client
            .spawn_vehicle(&VehicleRequest::random(), SpawnPoint::Index(5))
            .await
            .unwrap();

        let err = client
            .spawn_vehicle(&VehicleRequest::random(), SpawnPoint::Index(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SimClientError::SpawnFailed { .. }));
    }

    #[tokio::test]
    async fn try_spawn_returns_none_on_occupied_index() {
        let client = MockSimClient::with_config(MockConfig {
            occupied_spawn_indices: vec![7],
            ..Default::default()
        });
        let mut client = client;
        client
            .connect("localhost", 2000, Duration::from_secs_f64(2.0))
            .await
            .unwrap();

        let spawned = client
            .try_spawn_vehicle(&VehicleRequest::random(), SpawnPoint::Index(7))
            .await
            .unwrap();
        assert!(spawned.is_none());
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn unknown_blueprint_is_an_error_even_best_effort() {
        let mut client = MockSimClient::with_config(MockConfig {
            unknown_blueprints: vec!["vehicle.does.not_exist".to_string()],
            ..Default::default()
        });
        client
            .connect("localhost", 2000, Duration::from_secs_f64(2.0))
            .await
            .unwrap();

        let err = client
            .try_spawn_vehicle(
                &VehicleRequest::named("vehicle.does.not_exist"),
                SpawnPoint::Index(0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SimClientError::BlueprintNotFound { .. }));
    }

    #[tokio::test]
    async fn camera_requires_live_parent() {
        let client = connected_client().await;
        let err = client
            .spawn_camera(
                "sensor.camera.rgb_ocl",
                Transform::default(),
                4242,
                &HashMap::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SimClientError::AttachFailed { .. }));
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        let client = connected_client().await;
        let actor_id = client
            .spawn_vehicle(&VehicleRequest::random(), SpawnPoint::Index(0))
            .await
            .unwrap();

        client.destroy_actor(actor_id).await.unwrap();
        // Second destroy is a no-op, not an error
        client.destroy_actor(actor_id).await.unwrap();
        assert_eq!(client.destroyed(), vec![actor_id]);
    }

    #[tokio::test]
    async fn camera_feed_is_available_after_spawn() {
        let client = connected_client().await;
        let vehicle = client
            .spawn_vehicle(&VehicleRequest::random(), SpawnPoint::Index(0))
            .await
            .unwrap();
        let camera = client
            .spawn_camera(
                "sensor.camera.rgb_ocl",
                Transform::default(),
                vehicle,
                &HashMap::new(),
            )
            .await
            .unwrap();

        assert!(client.pixel_feed(camera).is_some());
        assert!(client.pixel_feed(vehicle).is_none());
    }

    #[tokio::test]
    async fn commands_are_recorded_in_order() {
        let client = connected_client().await;
        let actor_id = client
            .spawn_vehicle(&VehicleRequest::random(), SpawnPoint::Index(0))
            .await
            .unwrap();

        client.set_autopilot(actor_id, false).unwrap();
        client.set_target_velocity(actor_id, Vector3D::ZERO).unwrap();
        client
            .apply_control(actor_id, VehicleControl::full_brake())
            .unwrap();

        let records = client.commands_for(actor_id);
        assert_eq!(
            records,
            vec![
                CommandRecord::Autopilot {
                    actor_id,
                    enabled: false
                },
                CommandRecord::TargetVelocity {
                    actor_id,
                    velocity: Vector3D::ZERO
                },
                CommandRecord::Control {
                    actor_id,
                    control: VehicleControl::full_brake()
                },
            ]
        );
    }
}
