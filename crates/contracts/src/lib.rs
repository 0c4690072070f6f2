//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Uses CARLA simulation timestamp (seconds, f64) as primary clock
//! - `frame` is the sensor frame number, used for ordering/diagnostics

mod blueprint;
mod control;
mod error;
mod event;
mod feed;
mod runtime;

pub use blueprint::*;
pub use control::*;
pub use error::*;
pub use event::PixelCountEvent;
pub use feed::{PixelCallback, PixelFeed};
pub use runtime::*;
