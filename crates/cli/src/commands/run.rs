//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::ScenarioBlueprint;
use controller::{RunReport, Scenario};
use sim_client::SimClient;
use tracing::info;

use crate::cli::RunArgs;
use crate::commands::load_blueprint;

/// Execute the `run` command
pub async fn run_scenario(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding CARLA host from CLI");
        blueprint.world.carla_host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding CARLA port from CLI");
        blueprint.world.carla_port = port;
    }
    if let Some(duration) = args.duration {
        info!(duration, "Overriding run duration from CLI");
        blueprint.run.duration_sec = duration;
    }
    if let Some(threshold) = args.threshold {
        info!(threshold, "Overriding pixel threshold from CLI");
        blueprint.stop.pixel_threshold = threshold;
    }

    info!(
        host = %blueprint.world.carla_host,
        port = blueprint.world.carla_port,
        vehicles = blueprint.vehicles.len(),
        threshold = blueprint.stop.pixel_threshold,
        duration_sec = blueprint.run.duration_sec,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_scenario_summary(&blueprint);
        return Ok(());
    }

    let report = execute(blueprint).await?;
    report.print_summary();

    info!("Pixel Brake finished");
    Ok(())
}

/// Run the scenario against a real CARLA server
#[cfg(feature = "real-carla")]
async fn execute(blueprint: ScenarioBlueprint) -> Result<RunReport> {
    use sim_client::RealCarlaClient;

    let client = RealCarlaClient::new();
    let mut scenario = Scenario::new(client, blueprint);
    drive(&mut scenario, |_| {}).await
}

/// Run the scenario against the mock client
#[cfg(not(feature = "real-carla"))]
async fn execute(blueprint: ScenarioBlueprint) -> Result<RunReport> {
    use sim_client::MockSimClient;
    use std::time::Duration;

    info!("Mock mode - no CARLA server required");

    let client = MockSimClient::new();
    let feed_client = client.clone();
    let threshold = blueprint.stop.pixel_threshold;
    let duration_sec = blueprint.run.duration_sec;
    let mut scenario = Scenario::new(client, blueprint);

    drive(&mut scenario, move |scenario: &Scenario<MockSimClient>| {
        // Replay a rising pixel-count ramp crossing the threshold
        // mid-run, so an offline run demonstrates the stop transition.
        let Some(camera) = scenario.roster().camera() else {
            return;
        };
        let Some(feed) = feed_client.feed(camera) else {
            return;
        };
        feed.play(ramp(threshold, duration_sec), Duration::from_millis(100));
    })
    .await
}

/// Initialize, populate, run; teardown on every exit path
async fn drive<C, F>(scenario: &mut Scenario<C>, after_setup: F) -> Result<RunReport>
where
    C: SimClient + Clone + 'static,
    F: FnOnce(&Scenario<C>),
{
    let outcome = setup_and_run(scenario, after_setup).await;

    scenario.teardown().await;

    outcome.context("Scenario execution failed")
}

async fn setup_and_run<C, F>(
    scenario: &mut Scenario<C>,
    after_setup: F,
) -> controller::Result<RunReport>
where
    C: SimClient + Clone + 'static,
    F: FnOnce(&Scenario<C>),
{
    scenario.initialize().await?;
    scenario.populate_traffic().await?;
    after_setup(scenario);
    scenario.run(setup_shutdown_signal()).await
}

/// Mock measurement ramp: ~10 events/sec, crossing the threshold halfway
#[cfg(not(feature = "real-carla"))]
fn ramp(threshold: u64, duration_sec: f64) -> Vec<u64> {
    let events = ((duration_sec * 10.0) as u64).max(10);
    let step = threshold / (events / 2).max(1) + 1;
    (0..events).map(|i| i * step).collect()
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print scenario summary for dry-run mode
fn print_scenario_summary(blueprint: &ScenarioBlueprint) {
    println!("\n=== Scenario Summary ===\n");
    println!("World:");
    println!(
        "  CARLA: {}:{} (timeout {:.1}s)",
        blueprint.world.carla_host, blueprint.world.carla_port, blueprint.world.timeout_sec
    );

    println!("\nVehicles ({}):", blueprint.vehicles.len());
    for vehicle in &blueprint.vehicles {
        let bp = vehicle.blueprint.as_deref().unwrap_or("<random>");
        let spawn = vehicle
            .spawn_index
            .map(|i| i.to_string())
            .unwrap_or_else(|| "<random>".to_string());
        println!("  - {} ({}) at spawn point {}", vehicle.id, bp, spawn);
    }

    println!(
        "\nCamera: {} at (x={}, z={})",
        blueprint.camera.blueprint,
        blueprint.camera.transform.location.x,
        blueprint.camera.transform.location.z
    );
    println!("Stop threshold: {} pixels", blueprint.stop.pixel_threshold);
    println!("Traffic: {} best-effort spawns", blueprint.traffic.count);
    println!("Run window: {:.1}s", blueprint.run.duration_sec);
    println!();
}
