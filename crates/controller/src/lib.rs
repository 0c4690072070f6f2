//! # Controller
//!
//! Threshold-triggered vehicle stopper.
//!
//! Responsibilities:
//! - Observe the camera's pixel-count stream and stop the supervised
//!   vehicles exactly once when the threshold is crossed
//! - Orchestrate the scenario lifecycle: connect, spawn, traffic,
//!   autopilot window, unconditional teardown
//!
//! The measurement callback runs on the sensor's dispatch context,
//! concurrently with scenario setup; the armed/stopped flags carry all
//! shared state.

pub mod controller;
pub mod error;
pub mod report;
pub mod scenario;

pub use controller::{Observation, StopController, StopRecord};
pub use error::{Result, ScenarioError};
pub use report::RunReport;
pub use scenario::{Scenario, WaitOutcome};
