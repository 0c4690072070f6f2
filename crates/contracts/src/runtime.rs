//! ActorRoster - spawned actor bookkeeping.
//!
//! Every actor the scenario creates is tracked here so teardown can
//! destroy it, including after a partial initialization failure.

/// CARLA actor handle type
pub type ActorId = u32;

/// Roster of all actors spawned by one scenario run
///
/// Supervised vehicles keep their config order: the stop sequence is
/// applied primary-first, and the batch destroy walks the same order.
#[derive(Debug, Clone, Default)]
pub struct ActorRoster {
    /// Supervised vehicles, config order (config id, actor handle)
    supervised: Vec<(String, ActorId)>,

    /// The pixel-count camera, once spawned
    camera: Option<ActorId>,

    /// Best-effort NPC traffic
    traffic: Vec<ActorId>,
}

impl ActorRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a supervised vehicle
    pub fn register_vehicle(&mut self, id: impl Into<String>, actor_id: ActorId) {
        self.supervised.push((id.into(), actor_id));
    }

    /// Register the camera sensor
    pub fn register_camera(&mut self, actor_id: ActorId) {
        self.camera = Some(actor_id);
    }

    /// Register an NPC vehicle
    pub fn register_traffic(&mut self, actor_id: ActorId) {
        self.traffic.push(actor_id);
    }

    /// Supervised vehicle handles in config order
    pub fn supervised_ids(&self) -> Vec<ActorId> {
        self.supervised.iter().map(|(_, id)| *id).collect()
    }

    /// Supervised vehicles with their config ids
    pub fn supervised(&self) -> &[(String, ActorId)] {
        &self.supervised
    }

    /// Camera handle, if spawned
    pub fn camera(&self) -> Option<ActorId> {
        self.camera
    }

    /// NPC traffic handles
    pub fn traffic_ids(&self) -> &[ActorId] {
        &self.traffic
    }

    /// All tracked actor handles for the batch destroy
    ///
    /// The camera is included here even though teardown also destroys it
    /// individually first; destroy must be idempotent.
    pub fn all_actor_ids(&self) -> Vec<ActorId> {
        self.supervised
            .iter()
            .map(|(_, id)| *id)
            .chain(self.camera)
            .chain(self.traffic.iter().copied())
            .collect()
    }

    /// Total number of tracked actors
    pub fn len(&self) -> usize {
        self.supervised.len() + usize::from(self.camera.is_some()) + self.traffic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
