//! StopController - the threshold decision.
//!
//! Holds the shared flags the measurement callback and the scenario
//! thread both touch. The stop transition is one-way: once `stopped` is
//! set it never reverts, and the halt sequence is issued at most once
//! per vehicle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use contracts::{ActorId, PixelCountEvent, VehicleControl, Vector3D};
use sim_client::SimClient;
use tracing::{debug, info, warn};

/// The moment the threshold was crossed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopRecord {
    pub frame: u64,
    pub timestamp: f64,
    pub pixel_count: u64,
}

/// What `observe` did with one measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Setup not complete yet; event ignored
    NotArmed,
    /// Stop already happened; event ignored
    AlreadyStopped,
    /// Below or at the threshold; nothing to do
    BelowThreshold,
    /// This event crossed the threshold; these vehicles were halted
    Stopped { halted: Vec<ActorId> },
}

/// Threshold-triggered stop controller
///
/// The callback invokes `observe` from the sensor dispatch context while
/// the scenario thread is still spawning traffic and enabling autopilot;
/// `armed` gates that window and `stopped` makes the transition
/// exactly-once under concurrent events.
pub struct StopController {
    threshold: u64,
    /// Supervised vehicles, primary first; halt order is fixed
    vehicles: Vec<ActorId>,
    armed: AtomicBool,
    stopped: AtomicBool,
    events_seen: AtomicU64,
    peak_pixel_count: AtomicU64,
    stop_record: Mutex<Option<StopRecord>>,
}

impl StopController {
    /// Create a controller supervising the given vehicles
    pub fn new(threshold: u64, vehicles: Vec<ActorId>) -> Self {
        Self {
            threshold,
            vehicles,
            armed: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            events_seen: AtomicU64::new(0),
            peak_pixel_count: AtomicU64::new(0),
            stop_record: Mutex::new(None),
        }
    }

    /// Allow measurements to act; one-way
    ///
    /// Called once all supporting actors are spawned and autopilot is
    /// enabled. Events arriving earlier are observed but never issue
    /// commands.
    pub fn arm(&self) {
        if !self.armed.swap(true, Ordering::AcqRel) {
            debug!("controller armed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stop threshold (strictly greater-than)
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Total measurements observed, guards included
    pub fn events_seen(&self) -> u64 {
        self.events_seen.load(Ordering::Relaxed)
    }

    /// Largest pixel count observed so far
    pub fn peak_pixel_count(&self) -> u64 {
        self.peak_pixel_count.load(Ordering::Relaxed)
    }

    /// The measurement that triggered the stop, if any
    pub fn stop_record(&self) -> Option<StopRecord> {
        *self.stop_record.lock().unwrap()
    }

    /// Process one measurement
    ///
    /// Runs on the sensor dispatch context. Exactly one event ever
    /// returns `Stopped`; everything after it is a no-op.
    pub fn observe<C: SimClient>(&self, client: &C, event: &PixelCountEvent) -> Observation {
        self.events_seen.fetch_add(1, Ordering::Relaxed);
        self.peak_pixel_count
            .fetch_max(event.pixel_count, Ordering::Relaxed);
        debug!(
            frame = event.frame,
            pixel_count = event.pixel_count,
            "pixel count observed"
        );

        if self.stopped.load(Ordering::Acquire) {
            return Observation::AlreadyStopped;
        }
        if !self.armed.load(Ordering::Acquire) {
            debug!(frame = event.frame, "not all actors spawned, ignoring measurement");
            return Observation::NotArmed;
        }
        if event.pixel_count <= self.threshold {
            return Observation::BelowThreshold;
        }

        // Claim the transition; exactly one concurrent caller wins
        if self
            .stopped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Observation::AlreadyStopped;
        }

        info!(
            pixel_count = event.pixel_count,
            threshold = self.threshold,
            "pixel limit reached, stopping vehicles"
        );

        let mut halted = Vec::with_capacity(self.vehicles.len());
        for &vehicle in &self.vehicles {
            match Self::halt_vehicle(client, vehicle) {
                Ok(()) => {
                    info!(actor_id = vehicle, "vehicle stopped");
                    halted.push(vehicle);
                }
                // Remaining vehicles are still halted; a partially
                // stopped pair is the accepted degraded state.
                Err(e) => warn!(actor_id = vehicle, error = %e, "failed to stop vehicle"),
            }
        }

        *self.stop_record.lock().unwrap() = Some(StopRecord {
            frame: event.frame,
            timestamp: event.timestamp,
            pixel_count: event.pixel_count,
        });

        Observation::Stopped { halted }
    }

    /// Disable autopilot, zero the velocity, stand on the brake
    fn halt_vehicle<C: SimClient>(client: &C, actor_id: ActorId) -> sim_client::Result<()> {
        client.set_autopilot(actor_id, false)?;
        client.set_target_velocity(actor_id, Vector3D::ZERO)?;
        client.apply_control(actor_id, VehicleControl::full_brake())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_client::{CommandRecord, MockSimClient, SpawnPoint, VehicleRequest};
    use std::time::Duration;

    async fn client_with_vehicles(count: usize) -> (MockSimClient, Vec<ActorId>) {
        let mut client = MockSimClient::new();
        client
            .connect("localhost", 2000, Duration::from_secs_f64(2.0))
            .await
            .unwrap();
        let mut vehicles = Vec::new();
        for index in 0..count {
            vehicles.push(
                client
                    .spawn_vehicle(&VehicleRequest::random(), SpawnPoint::Index(index))
                    .await
                    .unwrap(),
            );
        }
        (client, vehicles)
    }

    fn event(pixel_count: u64) -> PixelCountEvent {
        PixelCountEvent::new(1, 0.05, pixel_count)
    }

    #[tokio::test]
    async fn unarmed_controller_ignores_measurements() {
        let (client, vehicles) = client_with_vehicles(1).await;
        let controller = StopController::new(10_000, vehicles);

        assert_eq!(
            controller.observe(&client, &event(50_000)),
            Observation::NotArmed
        );
        assert!(!controller.is_stopped());
        assert!(client.commands().is_empty());
    }

    #[tokio::test]
    async fn threshold_is_strictly_greater_than() {
        let (client, vehicles) = client_with_vehicles(1).await;
        let controller = StopController::new(10_000, vehicles);
        controller.arm();

        assert_eq!(
            controller.observe(&client, &event(10_000)),
            Observation::BelowThreshold
        );
        assert!(client.commands().is_empty());

        assert!(matches!(
            controller.observe(&client, &event(10_001)),
            Observation::Stopped { .. }
        ));
    }

    #[tokio::test]
    async fn crossing_issues_the_full_halt_sequence_once() {
        let (client, vehicles) = client_with_vehicles(1).await;
        let actor_id = vehicles[0];
        let controller = StopController::new(10_000, vehicles);
        controller.arm();

        let observation = controller.observe(&client, &event(10_500));
        assert_eq!(
            observation,
            Observation::Stopped {
                halted: vec![actor_id]
            }
        );
        assert!(controller.is_stopped());
        assert_eq!(
            client.commands_for(actor_id),
            vec![
                CommandRecord::Autopilot {
                    actor_id,
                    enabled: false
                },
                CommandRecord::TargetVelocity {
                    actor_id,
                    velocity: contracts::Vector3D::ZERO
                },
                CommandRecord::Control {
                    actor_id,
                    control: VehicleControl::full_brake()
                },
            ]
        );

        // Further measurements, above threshold included, are no-ops
        assert_eq!(
            controller.observe(&client, &event(15_000)),
            Observation::AlreadyStopped
        );
        assert_eq!(client.commands_for(actor_id).len(), 3);
        let record = controller.stop_record().unwrap();
        assert_eq!(record.pixel_count, 10_500);
    }

    #[tokio::test]
    async fn both_vehicles_are_halted_primary_first() {
        let (client, vehicles) = client_with_vehicles(2).await;
        let (primary, secondary) = (vehicles[0], vehicles[1]);
        let controller = StopController::new(22_000, vehicles);
        controller.arm();

        let observation = controller.observe(&client, &event(23_000));
        assert_eq!(
            observation,
            Observation::Stopped {
                halted: vec![primary, secondary]
            }
        );

        // Primary's three commands come before the secondary's
        let order: Vec<ActorId> = client
            .commands()
            .iter()
            .map(|record| match record {
                CommandRecord::Autopilot { actor_id, .. }
                | CommandRecord::TargetVelocity { actor_id, .. }
                | CommandRecord::Control { actor_id, .. } => *actor_id,
            })
            .collect();
        assert_eq!(order, vec![primary, primary, primary, secondary, secondary, secondary]);
    }

    #[tokio::test]
    async fn counters_track_every_measurement() {
        let (client, vehicles) = client_with_vehicles(1).await;
        let controller = StopController::new(10_000, vehicles);

        controller.observe(&client, &event(500));
        controller.arm();
        controller.observe(&client, &event(9_000));
        controller.observe(&client, &event(12_000));

        assert_eq!(controller.events_seen(), 3);
        assert_eq!(controller.peak_pixel_count(), 12_000);
    }
}
