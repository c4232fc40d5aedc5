//! Acquisition device interface
//!
//! The head-mounted device runtime owns the session, trackers, and reference
//! space. The rest of the crate only sees this narrow query surface.

use crate::error::DeviceError;
use crate::tracking::expression::ExpressionVector;
use crate::tracking::orientation::Quaternion;

/// One eye's gaze pose
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GazeSample {
    /// Gaze orientation relative to the view reference space
    pub orientation: Quaternion,
    pub valid: bool,
}

impl GazeSample {
    pub fn valid(orientation: Quaternion) -> Self {
        Self {
            orientation,
            valid: true,
        }
    }
}

/// Left/right gaze pair for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GazePoses {
    pub left: GazeSample,
    pub right: GazeSample,
}

impl GazePoses {
    pub fn new(left: GazeSample, right: GazeSample) -> Self {
        Self { left, right }
    }

    /// The gaze family is usable only when both eyes are valid
    pub fn is_valid(&self) -> bool {
        self.left.valid && self.right.valid
    }
}

/// Expression weights for one tick; validity covers the whole vector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionSample {
    pub weights: ExpressionVector,
    pub valid: bool,
}

impl ExpressionSample {
    pub fn valid(weights: ExpressionVector) -> Self {
        Self {
            weights,
            valid: true,
        }
    }
}

/// Read-only view of a tracking device runtime.
///
/// `refresh` is called once at the start of every tick and may pull new data
/// from the runtime; the two queries then report the latest state.
pub trait TrackingDevice {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Pull whatever the runtime has published since the last tick
    fn refresh(&mut self) -> Result<(), DeviceError>;

    /// Latest left/right gaze poses
    fn eye_gazes(&self) -> GazePoses;

    /// Latest expression weights
    fn expression_weights(&self) -> ExpressionSample;
}
