//! Synthetic tracking device
//!
//! Produces smooth, repeatable motion without hardware: a slow gaze sweep,
//! a blink every few seconds, and a gentle jaw movement. Time advances by
//! one tick per refresh so the output depends only on the refresh count.

use std::f32::consts::TAU;
use std::time::Duration;

use crate::error::DeviceError;
use crate::tracking::device::{ExpressionSample, GazePoses, GazeSample, TrackingDevice};
use crate::tracking::expression::{ExpressionVector, EYES_CLOSED_L, EYES_CLOSED_R, JAW_DROP};
use crate::tracking::orientation::Quaternion;

const SWEEP_PERIOD_SECS: f32 = 4.0;
const SWEEP_YAW_RAD: f32 = 0.35;
const SWEEP_PITCH_RAD: f32 = 0.15;
const BLINK_INTERVAL_SECS: f32 = 3.0;
const BLINK_DURATION_SECS: f32 = 0.15;
const JAW_PERIOD_SECS: f32 = 2.5;

/// Deterministic stand-in for the device runtime
pub struct SimulatedDevice {
    tick: Duration,
    frame: u64,
}

impl SimulatedDevice {
    pub fn new(tick: Duration) -> Self {
        Self { tick, frame: 0 }
    }

    /// Simulated time in seconds
    fn elapsed(&self) -> f32 {
        (self.tick.as_secs_f64() * self.frame as f64) as f32
    }

    fn gaze_at(t: f32) -> Quaternion {
        let phase = TAU * t / SWEEP_PERIOD_SECS;
        let yaw = Quaternion::from_axis_angle([0.0, 1.0, 0.0], SWEEP_YAW_RAD * phase.sin());
        let pitch = Quaternion::from_axis_angle([1.0, 0.0, 0.0], SWEEP_PITCH_RAD * (2.0 * phase).sin());
        multiply(yaw, pitch)
    }

    fn blink_at(t: f32) -> f32 {
        let since = t % BLINK_INTERVAL_SECS;
        if since < BLINK_DURATION_SECS {
            (since / BLINK_DURATION_SECS * std::f32::consts::PI).sin()
        } else {
            0.0
        }
    }
}

/// Hamilton product a * b
fn multiply(a: Quaternion, b: Quaternion) -> Quaternion {
    Quaternion::new(
        a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
        a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
        a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
    )
}

impl TrackingDevice for SimulatedDevice {
    fn name(&self) -> &str {
        "simulated"
    }

    fn refresh(&mut self) -> Result<(), DeviceError> {
        self.frame += 1;
        Ok(())
    }

    fn eye_gazes(&self) -> GazePoses {
        let gaze = GazeSample::valid(Self::gaze_at(self.elapsed()));
        GazePoses::new(gaze, gaze)
    }

    fn expression_weights(&self) -> ExpressionSample {
        let t = self.elapsed();
        let blink = Self::blink_at(t);
        let jaw = 0.5 - 0.5 * (TAU * t / JAW_PERIOD_SECS).cos();

        ExpressionSample::valid(
            ExpressionVector::default()
                .with_weight(EYES_CLOSED_L, blink)
                .with_weight(EYES_CLOSED_R, blink)
                .with_weight(JAW_DROP, jaw * 0.3),
        )
    }
}
