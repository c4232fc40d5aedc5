//! Gaze orientation decomposition
//!
//! Eye gaze poses arrive as unit quaternions. Only two degrees of freedom
//! matter for where an eye is looking, so the decomposition keeps pitch and
//! yaw and discards roll.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// `|sy|` at or above this value takes the gimbal-locked branch
pub const GIMBAL_LOCK_THRESHOLD: f32 = 0.99999;

/// Rotation quaternion (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about a unit axis
    pub fn from_axis_angle(axis: [f32; 3], angle: f32) -> Self {
        let (s, c) = (angle / 2.0).sin_cos();
        Self::new(axis[0] * s, axis[1] * s, axis[2] * s, c)
    }

    /// The `sy` term shared by both decomposition branches
    pub fn sy(&self) -> f32 {
        2.0 * self.x * self.z + 2.0 * self.y * self.w
    }

    pub fn is_gimbal_locked(&self) -> bool {
        self.sy().abs() >= GIMBAL_LOCK_THRESHOLD
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f32; 4]> for Quaternion {
    fn from(q: [f32; 4]) -> Self {
        Self::new(q[0], q[1], q[2], q[3])
    }
}

/// Pitch and yaw pair. Radians out of [`decompose`], degrees after
/// [`PitchYaw::to_gaze_degrees`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PitchYaw {
    pub pitch: f32,
    pub yaw: f32,
}

impl PitchYaw {
    /// Negate and convert to degrees, the convention consumers expect
    pub fn to_gaze_degrees(self) -> Self {
        Self {
            pitch: -self.pitch / PI * 180.0,
            yaw: -self.yaw / PI * 180.0,
        }
    }
}

/// Decompose a unit quaternion into (pitch, yaw) radians, roll discarded.
///
/// Yaw is `asin(sy)` and therefore limited to [-π/2, π/2]. Pure function:
/// identical input gives bit-identical output.
pub fn decompose(q: Quaternion) -> PitchYaw {
    let sy = q.sy();

    let pitch = if sy.abs() < GIMBAL_LOCK_THRESHOLD {
        (-(2.0 * q.y * q.z - 2.0 * q.x * q.w)).atan2(2.0 * q.w * q.w + 2.0 * q.z * q.z - 1.0)
    } else {
        (2.0 * q.y * q.z + 2.0 * q.x * q.w).atan2(2.0 * q.w * q.w + 2.0 * q.y * q.y - 1.0)
    };

    // Slightly non-unit input can push sy past 1.0
    let yaw = sy.clamp(-1.0, 1.0).asin();

    PitchYaw { pitch, yaw }
}

/// Decompose and convert to consumer-facing degrees
pub fn gaze_degrees(q: Quaternion) -> PitchYaw {
    decompose(q).to_gaze_degrees()
}
