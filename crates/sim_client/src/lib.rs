//! # Sim Client
//!
//! Simulator session boundary.
//!
//! Responsibilities:
//! - Define the `SimClient` trait over the external simulator API
//! - Spawn vehicles (strict and best-effort) and the attached camera
//! - Vehicle control: autopilot, target velocity, control commands
//! - Actor destruction (idempotent single + best-effort batch)
//! - Provide the `PixelFeed` measurement source per camera
//! - Support Mock mode for tests and offline runs
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate)

pub mod client;
pub mod error;
pub mod mock_client;
pub mod mock_feed;

#[cfg(feature = "real-carla")]
pub mod carla_client;
#[cfg(feature = "real-carla")]
pub mod carla_feed;

pub use client::SimClient;
pub use contracts::{ActorId, PixelFeed, SpawnPoint, VehicleRequest};
pub use error::{Result, SimClientError};
pub use mock_client::{CommandRecord, MockConfig, MockSimClient};
pub use mock_feed::MockPixelFeed;

#[cfg(feature = "real-carla")]
pub use carla_client::RealCarlaClient;
#[cfg(feature = "real-carla")]
pub use carla_feed::CarlaPixelFeed;
