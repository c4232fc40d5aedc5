//! Derived signal computation
//!
//! Turns one tick's samples into addressed float values. A family whose
//! sample is invalid this tick contributes no signals at all; nothing from
//! an earlier tick is carried forward.

use crate::config::{Config, EyeConfig, TrackingMode};
use crate::error::{GazecastError, MappingError};
use crate::mapping::ChannelMapping;
use crate::tracking::acquirer::TickSample;
use crate::tracking::device::GazePoses;
use crate::tracking::expression::ExpressionVector;
use crate::tracking::orientation::gaze_degrees;

/// Payload of one signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalValue {
    /// Single float, e.g. eyelid closure or one expression channel
    Scalar(f32),
    /// Left pitch, left yaw, right pitch, right yaw (degrees)
    Quad([f32; 4]),
}

impl SignalValue {
    pub fn as_slice(&self) -> &[f32] {
        match self {
            Self::Scalar(v) => std::slice::from_ref(v),
            Self::Quad(v) => v,
        }
    }
}

/// One addressed value computed for the current tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedSignal<'a> {
    pub address: &'a str,
    pub value: SignalValue,
}

impl<'a> DerivedSignal<'a> {
    pub fn new(address: &'a str, value: SignalValue) -> Self {
        Self { address, value }
    }
}

/// Per-mode signal derivation, fixed for the process lifetime
#[derive(Debug, Clone)]
pub struct Pipeline {
    mode: TrackingMode,
    eye: EyeConfig,
    mapping: Option<ChannelMapping>,
}

impl Pipeline {
    /// `mapping` is required by the face and full modes and ignored otherwise
    pub fn new(
        mode: TrackingMode,
        eye: EyeConfig,
        mapping: Option<ChannelMapping>,
    ) -> Result<Self, MappingError> {
        let mapping = if mode.uses_expression_channels() {
            Some(mapping.ok_or_else(|| MappingError::Missing {
                mode: format!("{:?}", mode).to_lowercase(),
            })?)
        } else {
            None
        };

        Ok(Self { mode, eye, mapping })
    }

    /// Build the pipeline for `config`, loading the channel mapping files
    /// when the mode needs them
    pub fn from_config(config: &Config) -> Result<Self, GazecastError> {
        let mapping = if config.mode.uses_expression_channels() {
            let mapping =
                ChannelMapping::from_files(&config.face.rate_file, &config.face.address_file)?;
            tracing::info!(
                "Loaded {} expression channels from {} and {}",
                mapping.channels().len(),
                config.face.rate_file.display(),
                config.face.address_file.display()
            );
            Some(mapping)
        } else {
            None
        };

        Ok(Self::new(config.mode, config.eye.clone(), mapping)?)
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Signals for one tick, in emission order
    pub fn derive<'a>(&'a self, sample: &TickSample) -> Vec<DerivedSignal<'a>> {
        let mut signals = Vec::new();

        if self.mode.uses_eye_signals() {
            if let Some(expressions) = &sample.expressions {
                signals.push(self.eyes_closed(expressions));
            }
            if let Some(gaze) = &sample.gaze {
                signals.push(self.pitch_yaw(gaze));
            }
        }

        if let (Some(mapping), Some(expressions)) = (&self.mapping, &sample.expressions) {
            signals.extend(
                mapping
                    .map(expressions)
                    .into_iter()
                    .map(|(address, value)| DerivedSignal::new(address, SignalValue::Scalar(value))),
            );
        }

        signals
    }

    /// Signals for a tick where every family is valid; the largest bundle
    /// this pipeline can produce
    pub fn worst_case(&self) -> Vec<DerivedSignal<'_>> {
        self.derive(&TickSample {
            gaze: Some(GazePoses::default()),
            expressions: Some(ExpressionVector::default()),
        })
    }

    fn eyes_closed(&self, expressions: &ExpressionVector) -> DerivedSignal<'_> {
        let (left, right) = expressions.eyes_closed();
        DerivedSignal::new(
            &self.eye.closed_address,
            SignalValue::Scalar(self.eye.closed_amount.combine(left, right)),
        )
    }

    fn pitch_yaw(&self, gaze: &GazePoses) -> DerivedSignal<'_> {
        let left = gaze_degrees(gaze.left.orientation);
        let right = gaze_degrees(gaze.right.orientation);
        DerivedSignal::new(
            &self.eye.pitch_yaw_address,
            SignalValue::Quad([left.pitch, left.yaw, right.pitch, right.yaw]),
        )
    }
}
