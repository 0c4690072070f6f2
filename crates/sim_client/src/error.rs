//! Sim Client error types

use contracts::{ActorId, ContractError};
use thiserror::Error;

/// Sim Client specific error
#[derive(Debug, Error)]
pub enum SimClientError {
    /// CARLA connection error
    #[error("failed to connect to CARLA: {message}")]
    ConnectionFailed { message: String },

    /// Blueprint lookup error
    #[error("blueprint '{blueprint}' not found")]
    BlueprintNotFound { blueprint: String },

    /// Strict spawn error (occupied spot, bad transform, ...)
    #[error("failed to spawn '{blueprint}': {message}")]
    SpawnFailed { blueprint: String, message: String },

    /// Camera attach error
    #[error("failed to attach camera '{blueprint}' to actor {parent_id}: {message}")]
    AttachFailed {
        blueprint: String,
        parent_id: ActorId,
        message: String,
    },

    /// Actor handle unknown to this session
    #[error("actor {actor_id} not found")]
    ActorNotFound { actor_id: ActorId },

    /// Destroy error
    #[error("failed to destroy actor {actor_id}: {message}")]
    DestroyFailed { actor_id: ActorId, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl SimClientError {
    /// Create connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Create blueprint lookup error
    pub fn blueprint_not_found(blueprint: impl Into<String>) -> Self {
        Self::BlueprintNotFound {
            blueprint: blueprint.into(),
        }
    }

    /// Create strict spawn error
    pub fn spawn(blueprint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SpawnFailed {
            blueprint: blueprint.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SimClientError>;
