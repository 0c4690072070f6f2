//! Scenario orchestration
//!
//! Drives one stop-scenario end to end: connect, spawn the supervised
//! vehicles and the camera, populate best-effort traffic, run the
//! autopilot window, tear everything down.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    ActorRoster, PixelCallback, PixelFeed, ScenarioBlueprint, SpawnPoint, VehicleRequest,
};
use sim_client::SimClient;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::controller::StopController;
use crate::error::{Result, ScenarioError};
use crate::report::RunReport;

/// How the run window ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The fixed duration elapsed
    Completed,
    /// The cancellation future resolved first
    Cancelled,
}

/// One scenario run
///
/// Every spawned actor lands in the roster immediately, so teardown can
/// destroy it even when a later step of initialization fails.
pub struct Scenario<C: SimClient + Clone + 'static> {
    client: C,
    blueprint: ScenarioBlueprint,
    roster: ActorRoster,
    controller: Option<Arc<StopController>>,
    feed: Option<Box<dyn PixelFeed>>,
}

impl<C: SimClient + Clone + 'static> Scenario<C> {
    /// Create a scenario over a disconnected client
    pub fn new(client: C, blueprint: ScenarioBlueprint) -> Self {
        Self {
            client,
            blueprint,
            roster: ActorRoster::new(),
            controller: None,
            feed: None,
        }
    }

    /// Spawned actor bookkeeping
    pub fn roster(&self) -> &ActorRoster {
        &self.roster
    }

    /// The stop controller, once initialized
    pub fn controller(&self) -> Option<&Arc<StopController>> {
        self.controller.as_ref()
    }

    /// Underlying client handle
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Connect, spawn the supervised vehicles and the camera, register
    /// the measurement callback
    ///
    /// Events may begin arriving as soon as the callback is registered,
    /// before traffic exists or autopilot is enabled; the controller's
    /// armed flag keeps that window safe. On error, whatever was already
    /// spawned stays in the roster for teardown.
    #[instrument(name = "scenario_initialize", skip(self))]
    pub async fn initialize(&mut self) -> Result<Arc<StopController>> {
        if self.blueprint.vehicles.is_empty() {
            return Err(ScenarioError::NoVehicles);
        }

        let world = self.blueprint.world.clone();
        info!(
            host = %world.carla_host,
            port = world.carla_port,
            "connecting to CARLA server"
        );
        self.client
            .connect(
                &world.carla_host,
                world.carla_port,
                Duration::from_secs_f64(world.timeout_sec),
            )
            .await?;

        let vehicles = self.blueprint.vehicles.clone();
        for config in &vehicles {
            let actor_id = self
                .client
                .spawn_vehicle(&config.request(), config.spawn_point())
                .await?;
            info!(vehicle = %config.id, actor_id, "created vehicle");
            self.roster.register_vehicle(config.id.clone(), actor_id);
        }

        let primary = self.roster.supervised_ids()[0];
        let camera_config = self.blueprint.camera.clone();
        let camera = self
            .client
            .spawn_camera(
                &camera_config.blueprint,
                camera_config.transform,
                primary,
                &camera_config.attributes,
            )
            .await?;
        info!(actor_id = camera, blueprint = %camera_config.blueprint, "created camera");
        self.roster.register_camera(camera);

        let controller = Arc::new(StopController::new(
            self.blueprint.stop.pixel_threshold,
            self.roster.supervised_ids(),
        ));

        let feed = self
            .client
            .pixel_feed(camera)
            .ok_or(ScenarioError::FeedUnavailable { actor_id: camera })?;

        let callback_controller = Arc::clone(&controller);
        let callback_client = self.client.clone();
        let callback: PixelCallback = Arc::new(move |event| {
            callback_controller.observe(&callback_client, &event);
        });
        feed.listen(callback);
        self.feed = Some(feed);

        self.controller = Some(Arc::clone(&controller));
        Ok(controller)
    }

    /// Best-effort NPC traffic
    ///
    /// One independent attempt per configured count: random blueprint at
    /// a random spawn point; an occupied spot is skipped without error
    /// and never retried. Returns how many actually spawned.
    #[instrument(name = "scenario_populate_traffic", skip(self), fields(count = self.blueprint.traffic.count))]
    pub async fn populate_traffic(&mut self) -> Result<usize> {
        let attempts = self.blueprint.traffic.count;
        let mut spawned = 0;

        for attempt in 0..attempts {
            match self
                .client
                .try_spawn_vehicle(&VehicleRequest::random(), SpawnPoint::Random)
                .await?
            {
                Some(actor_id) => {
                    debug!(actor_id, "created npc vehicle");
                    self.roster.register_traffic(actor_id);
                    spawned += 1;
                }
                None => debug!(attempt, "spawn point occupied, skipped"),
            }
        }

        if attempts > 0 {
            info!(spawned, attempts, "traffic populated");
        }
        Ok(spawned)
    }

    /// Enable autopilot on every spawned vehicle, then arm the controller
    ///
    /// Arming comes last: measurements must not act before all actors
    /// drive.
    pub fn start(&self) -> Result<()> {
        let controller = self.controller.as_ref().ok_or(ScenarioError::NotInitialized)?;

        for (id, actor_id) in self.roster.supervised() {
            let actor_id = *actor_id;
            self.client.set_autopilot(actor_id, true)?;
            info!(vehicle = %id, actor_id, "autopilot enabled");
        }
        for &actor_id in self.roster.traffic_ids() {
            // NPC vehicles are best-effort through and through
            if let Err(e) = self.client.set_autopilot(actor_id, true) {
                warn!(actor_id, error = %e, "failed to enable npc autopilot");
            }
        }

        controller.arm();
        info!("running simulation");
        Ok(())
    }

    /// Block for the configured duration or until `cancel` resolves
    ///
    /// The stop event does not end the window early; this is a fixed-time
    /// observation run.
    pub async fn wait(&self, cancel: impl Future<Output = ()>) -> WaitOutcome {
        let duration = Duration::from_secs_f64(self.blueprint.run.duration_sec);
        tokio::select! {
            _ = sleep(duration) => {
                info!("finished simulation");
                WaitOutcome::Completed
            }
            _ = cancel => {
                warn!("simulation cancelled");
                WaitOutcome::Cancelled
            }
        }
    }

    /// `start` + `wait`, reporting what happened
    pub async fn run(&self, cancel: impl Future<Output = ()>) -> Result<RunReport> {
        self.start()?;
        let started = Instant::now();
        let outcome = self.wait(cancel).await;
        Ok(self.report(outcome, started.elapsed()))
    }

    /// Snapshot the run into a report
    pub fn report(&self, outcome: WaitOutcome, duration: Duration) -> RunReport {
        let controller = self.controller.as_ref();
        RunReport {
            duration,
            outcome,
            events_seen: controller.map_or(0, |c| c.events_seen()),
            peak_pixel_count: controller.map_or(0, |c| c.peak_pixel_count()),
            stop: controller.and_then(|c| c.stop_record()),
            supervised: self.roster.supervised().len(),
            traffic: self.roster.traffic_ids().len(),
        }
    }

    /// Destroy everything this scenario spawned
    ///
    /// Best-effort and unconditional: runs after partial initialization
    /// failures too, and per-actor destroy failures never abort the rest.
    /// The camera goes down individually first, then the batch covers
    /// every tracked actor (camera included; destroy is idempotent).
    #[instrument(name = "scenario_teardown", skip(self), fields(actors = self.roster.len()))]
    pub async fn teardown(&mut self) {
        info!("destroying actors");

        if let Some(feed) = self.feed.take() {
            feed.stop();
        }

        if let Some(camera) = self.roster.camera() {
            if let Err(e) = self.client.destroy_actor(camera).await {
                warn!(actor_id = camera, error = %e, "failed to destroy camera");
            }
        }

        let all = self.roster.all_actor_ids();
        if !all.is_empty() {
            if let Err(e) = self.client.destroy_batch(&all).await {
                warn!(error = %e, "batch destroy failed");
            }
        }

        info!("teardown finished");
    }
}
