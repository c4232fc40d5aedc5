//! Tracking module
//!
//! Everything that faces the head-mounted device runtime:
//! - Gaze orientation decomposition
//! - The vendor expression taxonomy
//! - The device query interface and its backends (runtime bridge, simulated)
//! - Per-tick sample acquisition

pub mod acquirer;
pub mod bridge;
pub mod device;
pub mod expression;
pub mod orientation;
pub mod simulated;
pub mod subprocess;
