//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::load_blueprint;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    world: WorldInfo,
    vehicles: Vec<VehicleInfo>,
    camera: CameraInfo,
    pixel_threshold: u64,
    traffic_count: usize,
    duration_sec: f64,
}

#[derive(Serialize)]
struct WorldInfo {
    carla_host: String,
    carla_port: u16,
    timeout_sec: f64,
}

#[derive(Serialize)]
struct VehicleInfo {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    blueprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spawn_index: Option<usize>,
}

#[derive(Serialize)]
struct CameraInfo {
    blueprint: String,
    x: f64,
    z: f64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::ScenarioBlueprint) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        world: WorldInfo {
            carla_host: blueprint.world.carla_host.clone(),
            carla_port: blueprint.world.carla_port,
            timeout_sec: blueprint.world.timeout_sec,
        },
        vehicles: blueprint
            .vehicles
            .iter()
            .map(|v| VehicleInfo {
                id: v.id.clone(),
                blueprint: v.blueprint.clone(),
                color: v.color.clone(),
                spawn_index: v.spawn_index,
            })
            .collect(),
        camera: CameraInfo {
            blueprint: blueprint.camera.blueprint.clone(),
            x: blueprint.camera.transform.location.x,
            z: blueprint.camera.transform.location.z,
        },
        pixel_threshold: blueprint.stop.pixel_threshold,
        traffic_count: blueprint.traffic.count,
        duration_sec: blueprint.run.duration_sec,
    }
}

fn print_config_info(blueprint: &contracts::ScenarioBlueprint) {
    println!("\n=== Scenario Info ===\n");
    println!(
        "CARLA: {}:{} (timeout {:.1}s)",
        blueprint.world.carla_host, blueprint.world.carla_port, blueprint.world.timeout_sec
    );

    println!("\nVehicles ({}):", blueprint.vehicles.len());
    for (index, vehicle) in blueprint.vehicles.iter().enumerate() {
        let role = if index == 0 { "primary" } else { "secondary" };
        println!(
            "  - {} [{}]: {} color={} spawn={}",
            vehicle.id,
            role,
            vehicle.blueprint.as_deref().unwrap_or("<random>"),
            vehicle.color.as_deref().unwrap_or("<random>"),
            vehicle
                .spawn_index
                .map(|i| i.to_string())
                .unwrap_or_else(|| "<random>".to_string()),
        );
    }

    println!(
        "\nCamera: {} mounted at (x={}, z={}) on the primary vehicle",
        blueprint.camera.blueprint,
        blueprint.camera.transform.location.x,
        blueprint.camera.transform.location.z
    );
    println!("Stop threshold: {} pixels", blueprint.stop.pixel_threshold);
    println!("Traffic: {} best-effort spawns", blueprint.traffic.count);
    println!("Run window: {:.1}s", blueprint.run.duration_sec);
    println!();
}
