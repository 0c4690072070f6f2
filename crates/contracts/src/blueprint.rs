//! ScenarioBlueprint - Config Loader output
//!
//! Describes a complete stop-scenario: simulator session, supervised
//! vehicles, the pixel-count camera, stop threshold, NPC traffic and the
//! run window.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete scenario blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Simulator session settings
    #[serde(default)]
    pub world: WorldConfig,

    /// Supervised vehicles, primary first (the camera attaches to the
    /// first entry)
    pub vehicles: Vec<VehicleConfig>,

    /// Pixel-count camera settings
    #[serde(default)]
    pub camera: CameraConfig,

    /// Stop decision settings
    pub stop: StopConfig,

    /// Best-effort NPC traffic settings
    #[serde(default)]
    pub traffic: TrafficConfig,

    /// Run window settings
    pub run: RunConfig,
}

/// Simulator session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// CARLA server address
    #[serde(default = "default_carla_host")]
    pub carla_host: String,

    /// CARLA server port
    #[serde(default = "default_carla_port")]
    pub carla_port: u16,

    /// Connection timeout (seconds)
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: f64,
}

fn default_carla_host() -> String {
    "localhost".to_string()
}

fn default_carla_port() -> u16 {
    2000
}

fn default_timeout_sec() -> f64 {
    2.0
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            carla_host: default_carla_host(),
            carla_port: default_carla_port(),
            timeout_sec: default_timeout_sec(),
        }
    }
}

/// Supervised vehicle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Unique identifier
    pub id: String,

    /// Blueprint name (e.g., "vehicle.dodge.charger_2020");
    /// None = random choice among vehicle blueprints
    #[serde(default)]
    pub blueprint: Option<String>,

    /// Color attribute as "R,G,B"; None = random
    #[serde(default)]
    pub color: Option<String>,

    /// Index into the map's recommended spawn points; None = random
    #[serde(default)]
    pub spawn_index: Option<usize>,
}

impl VehicleConfig {
    /// Blueprint request for the client
    pub fn request(&self) -> VehicleRequest {
        VehicleRequest {
            blueprint: self.blueprint.clone(),
            color: self.color.clone(),
        }
    }

    /// Spawn point selection for the client
    pub fn spawn_point(&self) -> SpawnPoint {
        match self.spawn_index {
            Some(index) => SpawnPoint::Index(index),
            None => SpawnPoint::Random,
        }
    }
}

/// Blueprint selection passed to the client at spawn time
///
/// `blueprint: None` means "pick a random vehicle blueprint";
/// `color: None` means "pick a random color".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleRequest {
    pub blueprint: Option<String>,
    pub color: Option<String>,
}

impl VehicleRequest {
    /// Fully random vehicle
    pub fn random() -> Self {
        Self::default()
    }

    pub fn named(blueprint: impl Into<String>) -> Self {
        Self {
            blueprint: Some(blueprint.into()),
            color: None,
        }
    }
}

/// Spawn transform selection among the map's recommended spawn points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPoint {
    /// Fixed index into the recommended spawn list
    Index(usize),
    /// Uniform random choice among unoccupied points
    Random,
}

/// Pixel-count camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Sensor blueprint name
    #[serde(default = "default_camera_blueprint")]
    pub blueprint: String,

    /// Mount pose relative to the parent vehicle
    #[serde(default = "default_camera_transform")]
    pub transform: Transform,

    /// Sensor-specific attributes
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

fn default_camera_blueprint() -> String {
    "sensor.camera.rgb_ocl".to_string()
}

fn default_camera_transform() -> Transform {
    Transform {
        location: Location {
            x: 1.5,
            y: 0.0,
            z: 2.4,
        },
        rotation: Rotation::default(),
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            blueprint: default_camera_blueprint(),
            transform: default_camera_transform(),
            attributes: HashMap::new(),
        }
    }
}

/// Stop decision configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopConfig {
    /// Pixel count above which the supervised vehicles are stopped
    /// (strictly greater-than)
    pub pixel_threshold: u64,
}

/// Best-effort NPC traffic configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Number of spawn attempts; occupied spots are skipped, not retried
    #[serde(default)]
    pub count: usize,
}

/// Run window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Fixed wall-clock duration of the autopilot window (seconds)
    pub duration_sec: f64,
}

/// 3D transform: location + rotation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Location (x, y, z) in meters
    #[serde(default)]
    pub location: Location,

    /// Rotation (pitch, yaw, roll) in degrees
    #[serde(default)]
    pub rotation: Rotation,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
    #[serde(default)]
    pub roll: f64,
}

impl ScenarioBlueprint {
    /// The primary vehicle (camera parent); None for an empty vehicle list
    pub fn primary_vehicle(&self) -> Option<&VehicleConfig> {
        self.vehicles.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_defaults_match_mount_offset() {
        let camera = CameraConfig::default();
        assert_eq!(camera.blueprint, "sensor.camera.rgb_ocl");
        assert_eq!(camera.transform.location.x, 1.5);
        assert_eq!(camera.transform.location.z, 2.4);
    }

    #[test]
    fn vehicle_config_maps_to_request_and_spawn_point() {
        let fixed = VehicleConfig {
            id: "ego".into(),
            blueprint: Some("vehicle.dodge.charger_2020".into()),
            color: Some("0,0,240".into()),
            spawn_index: Some(120),
        };
        assert_eq!(fixed.spawn_point(), SpawnPoint::Index(120));
        assert_eq!(
            fixed.request().blueprint.as_deref(),
            Some("vehicle.dodge.charger_2020")
        );

        let random = VehicleConfig {
            id: "npc".into(),
            blueprint: None,
            color: None,
            spawn_index: None,
        };
        assert_eq!(random.spawn_point(), SpawnPoint::Random);
        assert_eq!(random.request(), VehicleRequest::random());
    }
}
