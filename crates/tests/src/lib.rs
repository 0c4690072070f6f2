//! # Integration Tests
//!
//! End-to-end scenario tests against the mock client (no CARLA needed).
//!
//! Covers:
//! - Both scenario variants, setup through teardown
//! - Pre-arm measurement suppression and stop idempotence
//! - Best-effort traffic population
//! - Teardown coverage after partial initialization

#[cfg(test)]
mod e2e_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ActorId, CameraConfig, RunConfig, ScenarioBlueprint, StopConfig, TrafficConfig,
        VehicleConfig, VehicleControl, Vector3D, WorldConfig,
    };
    use controller::Scenario;
    use sim_client::{CommandRecord, MockConfig, MockSimClient};
    use std::sync::Arc;

    fn solo_blueprint() -> ScenarioBlueprint {
        ScenarioBlueprint {
            version: Default::default(),
            world: WorldConfig::default(),
            vehicles: vec![VehicleConfig {
                id: "ego".into(),
                blueprint: None,
                color: None,
                spawn_index: Some(162),
            }],
            camera: CameraConfig::default(),
            stop: StopConfig {
                pixel_threshold: 10_000,
            },
            traffic: TrafficConfig { count: 40 },
            run: RunConfig { duration_sec: 20.0 },
        }
    }

    fn duo_blueprint() -> ScenarioBlueprint {
        ScenarioBlueprint {
            version: Default::default(),
            world: WorldConfig::default(),
            vehicles: vec![
                VehicleConfig {
                    id: "cam_vehicle".into(),
                    blueprint: Some("vehicle.dodge.charger_2020".into()),
                    color: Some("0,0,240".into()),
                    spawn_index: Some(120),
                },
                VehicleConfig {
                    id: "red_vehicle".into(),
                    blueprint: Some("vehicle.ford.ambulance".into()),
                    color: Some("240,0,0".into()),
                    spawn_index: Some(36),
                },
            ],
            camera: CameraConfig::default(),
            stop: StopConfig {
                pixel_threshold: 22_000,
            },
            traffic: TrafficConfig::default(),
            run: RunConfig { duration_sec: 15.0 },
        }
    }

    /// The exact halt sequence one vehicle receives
    fn halt_sequence(actor_id: ActorId) -> Vec<CommandRecord> {
        vec![
            CommandRecord::Autopilot {
                actor_id,
                enabled: false,
            },
            CommandRecord::TargetVelocity {
                actor_id,
                velocity: Vector3D::ZERO,
            },
            CommandRecord::Control {
                actor_id,
                control: VehicleControl::full_brake(),
            },
        ]
    }

    /// Full solo-variant flow: events before arming are suppressed, the
    /// first crossing stops the vehicle exactly once.
    #[tokio::test]
    async fn solo_variant_stops_the_ego_vehicle_once() {
        let client = MockSimClient::new();
        let mut scenario = Scenario::new(client.clone(), solo_blueprint());

        let stopper = scenario.initialize().await.unwrap();
        let ego = scenario.roster().supervised_ids()[0];
        let camera = scenario.roster().camera().unwrap();
        let feed = client.feed(camera).unwrap();

        // Feed fires before traffic has finished spawning: no action
        assert!(feed.emit(500));
        assert!(!stopper.is_stopped());
        assert!(client.commands().is_empty());

        scenario.populate_traffic().await.unwrap();
        scenario.start().unwrap();
        assert!(client.autopilot_enabled(ego));

        // First crossing stops the vehicle
        feed.emit(10_500);
        assert!(stopper.is_stopped());
        assert!(!client.autopilot_enabled(ego));

        let expected: Vec<CommandRecord> = std::iter::once(CommandRecord::Autopilot {
            actor_id: ego,
            enabled: true,
        })
        .chain(halt_sequence(ego))
        .collect();
        assert_eq!(client.commands_for(ego), expected);

        // A later, larger measurement changes nothing
        feed.emit(15_000);
        assert_eq!(client.commands_for(ego).len(), expected.len());
        assert_eq!(stopper.stop_record().unwrap().pixel_count, 10_500);

        scenario.teardown().await;
        assert_eq!(client.actor_count(), 0);
    }

    /// Full duo-variant flow: one crossing stops both vehicles, primary
    /// first; later events are logged only.
    #[tokio::test]
    async fn duo_variant_stops_both_vehicles_in_order() {
        let client = MockSimClient::new();
        let mut scenario = Scenario::new(client.clone(), duo_blueprint());

        let stopper = scenario.initialize().await.unwrap();
        let supervised = scenario.roster().supervised_ids();
        let (primary, secondary) = (supervised[0], supervised[1]);
        assert_eq!(
            client.actor_blueprint(primary).as_deref(),
            Some("vehicle.dodge.charger_2020")
        );
        assert_eq!(
            client.actor_blueprint(secondary).as_deref(),
            Some("vehicle.ford.ambulance")
        );
        let camera = scenario.roster().camera().unwrap();
        let feed = client.feed(camera).unwrap();

        scenario.populate_traffic().await.unwrap();
        scenario.start().unwrap();

        feed.emit(23_000);
        assert!(stopper.is_stopped());

        // Primary's halt sequence precedes the secondary's
        let commands = client.commands();
        let halt_commands: Vec<&CommandRecord> = commands
            .iter()
            .filter(|record| {
                !matches!(record, CommandRecord::Autopilot { enabled: true, .. })
            })
            .collect();
        let expected: Vec<CommandRecord> = halt_sequence(primary)
            .into_iter()
            .chain(halt_sequence(secondary))
            .collect();
        assert_eq!(halt_commands, expected.iter().collect::<Vec<_>>());

        // Subsequent event above threshold: observed, no further commands
        feed.emit(30_000);
        assert_eq!(client.commands().len(), commands.len());
        assert_eq!(stopper.events_seen(), 2);

        scenario.teardown().await;
        assert_eq!(client.actor_count(), 0);
    }

    /// Measurements that never cross the threshold leave autopilot on.
    #[tokio::test]
    async fn below_threshold_run_never_stops() {
        let client = MockSimClient::new();
        let mut scenario = Scenario::new(client.clone(), duo_blueprint());

        let stopper = scenario.initialize().await.unwrap();
        let camera = scenario.roster().camera().unwrap();
        let feed = client.feed(camera).unwrap();

        scenario.start().unwrap();
        for count in [0, 1_000, 21_999, 22_000] {
            feed.emit(count);
        }

        assert!(!stopper.is_stopped());
        let ego = scenario.roster().supervised_ids()[0];
        assert!(client.autopilot_enabled(ego));
        assert_eq!(stopper.peak_pixel_count(), 22_000);
    }

    /// Of N traffic attempts, only successes are tracked and destroyed;
    /// occupied spots produce no roster entry and no error.
    #[tokio::test]
    async fn traffic_is_best_effort_and_fully_torn_down() {
        // 30 spawn points, a third pre-occupied
        let client = MockSimClient::with_config(MockConfig {
            spawn_point_count: 30,
            occupied_spawn_indices: (0..10).collect(),
            ..Default::default()
        });
        let mut blueprint = solo_blueprint();
        blueprint.vehicles[0].spawn_index = Some(15);
        blueprint.traffic.count = 40;
        let mut scenario = Scenario::new(client.clone(), blueprint);

        scenario.initialize().await.unwrap();
        let spawned = scenario.populate_traffic().await.unwrap();

        // 40 random attempts into 30 points cannot all succeed
        assert!(spawned < 40);
        assert_eq!(scenario.roster().traffic_ids().len(), spawned);
        // ego + camera + NPCs
        assert_eq!(client.actor_count(), spawned + 2);

        scenario.teardown().await;
        assert_eq!(client.actor_count(), 0);
        assert_eq!(client.destroyed().len(), spawned + 2);
    }

    /// Teardown destroys every actor exactly once, the camera's double
    /// destroy (individual + batch) included.
    #[tokio::test]
    async fn teardown_destroys_each_actor_exactly_once() {
        let client = MockSimClient::new();
        let mut scenario = Scenario::new(client.clone(), duo_blueprint());

        scenario.initialize().await.unwrap();
        let camera = scenario.roster().camera().unwrap();
        let mut expected = scenario.roster().all_actor_ids();

        scenario.teardown().await;

        let mut destroyed = client.destroyed();
        assert_eq!(
            destroyed.iter().filter(|&&id| id == camera).count(),
            1,
            "camera must be destroyed exactly once"
        );
        destroyed.sort_unstable();
        expected.sort_unstable();
        assert_eq!(destroyed, expected);
    }

    /// A spawn failure mid-initialization still leaves the earlier
    /// actors destroyable.
    #[tokio::test]
    async fn partial_initialization_is_torn_down() {
        let client = MockSimClient::with_config(MockConfig {
            fail_vehicles: vec!["vehicle.ford.ambulance".to_string()],
            ..Default::default()
        });
        let mut scenario = Scenario::new(client.clone(), duo_blueprint());

        // First vehicle spawns, second fails
        assert!(scenario.initialize().await.is_err());
        assert_eq!(client.actor_count(), 1);

        scenario.teardown().await;
        assert_eq!(client.actor_count(), 0);
    }

    /// The shipped variant configs load and match the scripted scenarios.
    #[test]
    fn shipped_configs_describe_the_two_variants() {
        let solo = ConfigLoader::load_from_str(
            include_str!("../../../configs/solo.toml"),
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(solo.vehicles.len(), 1);
        assert_eq!(solo.vehicles[0].spawn_index, Some(162));
        assert_eq!(solo.stop.pixel_threshold, 10_000);
        assert_eq!(solo.traffic.count, 40);
        assert_eq!(solo.run.duration_sec, 20.0);

        let duo = ConfigLoader::load_from_str(
            include_str!("../../../configs/duo.toml"),
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(duo.vehicles.len(), 2);
        assert_eq!(duo.vehicles[0].color.as_deref(), Some("0,0,240"));
        assert_eq!(duo.vehicles[1].spawn_index, Some(36));
        assert_eq!(duo.stop.pixel_threshold, 22_000);
        assert_eq!(duo.traffic.count, 0);
    }

    /// The callback path works exactly like direct emits: a concurrent
    /// feed thread drives the stop through the registered closure.
    #[tokio::test]
    async fn threaded_feed_playback_triggers_the_stop() {
        let client = MockSimClient::new();
        let mut blueprint = solo_blueprint();
        blueprint.traffic.count = 0;
        let mut scenario = Scenario::new(client.clone(), blueprint);

        let stopper = scenario.initialize().await.unwrap();
        let camera = scenario.roster().camera().unwrap();
        let feed = client.feed(camera).unwrap();

        scenario.start().unwrap();

        let counts: Vec<u64> = (0..40).map(|i| i * 500).collect(); // crosses 10000
        let playback = Arc::clone(&feed).play(counts, std::time::Duration::from_millis(1));
        playback.join().unwrap();

        assert!(stopper.is_stopped());
        assert_eq!(stopper.stop_record().unwrap().pixel_count, 10_500);

        scenario.teardown().await;
        assert_eq!(client.actor_count(), 0);
    }
}
