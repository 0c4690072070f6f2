//! Scenario error types

use contracts::ActorId;
use sim_client::SimClientError;
use thiserror::Error;

/// Scenario specific error
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Underlying client failure (connection, spawn, control)
    #[error(transparent)]
    Client(#[from] SimClientError),

    /// Blueprint has no supervised vehicles
    #[error("scenario has no vehicles configured")]
    NoVehicles,

    /// Lifecycle methods called before initialize
    #[error("scenario not initialized")]
    NotInitialized,

    /// Camera spawned but exposes no measurement feed
    #[error("no pixel feed available for camera actor {actor_id}")]
    FeedUnavailable { actor_id: ActorId },
}

/// Result alias
pub type Result<T> = std::result::Result<T, ScenarioError>;
