//! Gazecast - Eye and Face Tracking OSC Forwarder
//!
//! Polls a head-mounted device's eye gaze and facial expression trackers
//! on a fixed tick and forwards the derived signals as OSC bundles over UDP:
//! - Eye mode: combined eyelid closure plus per-eye pitch/yaw in degrees
//! - Face mode: every expression weight, scaled and readdressed from
//!   user-editable mapping files
//! - Full mode: both of the above in one bundle

pub mod config;
pub mod error;
pub mod mapping;
pub mod output;
pub mod pipeline;
pub mod scheduler;
pub mod tracking;

pub use config::Config;
pub use error::{GazecastError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
