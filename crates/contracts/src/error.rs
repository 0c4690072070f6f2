//! Layered error definitions
//!
//! Categorized by source: config / carla session / actor lifecycle

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== CARLA Session Errors =====
    /// CARLA connection error
    #[error("carla connection error: {message}")]
    CarlaConnection { message: String },

    /// Blueprint not found in the library
    #[error("carla blueprint not found: {blueprint}")]
    BlueprintNotFound { blueprint: String },

    /// CARLA spawn error
    #[error("carla spawn error for '{actor_id}': {message}")]
    CarlaSpawn { actor_id: String, message: String },

    /// CARLA actor not found
    #[error("carla actor not found: {actor_id}")]
    CarlaActorNotFound { actor_id: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create CARLA spawn error
    pub fn carla_spawn(actor_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CarlaSpawn {
            actor_id: actor_id.into(),
            message: message.into(),
        }
    }
}
