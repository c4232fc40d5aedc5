//! Facial expression taxonomy and weight vectors
//!
//! The device runtime reports the vendor's default expression set: a fixed,
//! ordered list of 63 blend weights plus two region confidences. Indices in
//! this module are the vendor's indices.

use crate::error::DeviceError;

/// Number of expression weights in the default set
pub const EXPRESSION_COUNT: usize = 63;

/// Number of confidence values (lower face, upper face)
pub const CONFIDENCE_COUNT: usize = 2;

pub const CONFIDENCE_LOWER_FACE: usize = 0;
pub const CONFIDENCE_UPPER_FACE: usize = 1;

pub const EYES_CLOSED_L: usize = 12;
pub const EYES_CLOSED_R: usize = 13;

/// Expression names in vendor index order
pub const EXPRESSION_NAMES: [&str; EXPRESSION_COUNT] = [
    "BrowLowererL",
    "BrowLowererR",
    "CheekPuffL",
    "CheekPuffR",
    "CheekRaiserL",
    "CheekRaiserR",
    "CheekSuckL",
    "CheekSuckR",
    "ChinRaiserB",
    "ChinRaiserT",
    "DimplerL",
    "DimplerR",
    "EyesClosedL",
    "EyesClosedR",
    "EyesLookDownL",
    "EyesLookDownR",
    "EyesLookLeftL",
    "EyesLookLeftR",
    "EyesLookRightL",
    "EyesLookRightR",
    "EyesLookUpL",
    "EyesLookUpR",
    "InnerBrowRaiserL",
    "InnerBrowRaiserR",
    "JawDrop",
    "JawSidewaysLeft",
    "JawSidewaysRight",
    "JawThrust",
    "LidTightenerL",
    "LidTightenerR",
    "LipCornerDepressorL",
    "LipCornerDepressorR",
    "LipCornerPullerL",
    "LipCornerPullerR",
    "LipFunnelerLB",
    "LipFunnelerLT",
    "LipFunnelerRB",
    "LipFunnelerRT",
    "LipPressorL",
    "LipPressorR",
    "LipPuckerL",
    "LipPuckerR",
    "LipStretcherL",
    "LipStretcherR",
    "LipSuckLB",
    "LipSuckLT",
    "LipSuckRB",
    "LipSuckRT",
    "LipTightenerL",
    "LipTightenerR",
    "LipsToward",
    "LowerLipDepressorL",
    "LowerLipDepressorR",
    "MouthLeft",
    "MouthRight",
    "NoseWrinklerL",
    "NoseWrinklerR",
    "OuterBrowRaiserL",
    "OuterBrowRaiserR",
    "UpperLidRaiserL",
    "UpperLidRaiserR",
    "UpperLipRaiserL",
    "UpperLipRaiserR",
];

/// Index of the jaw drop weight
pub const JAW_DROP: usize = 24;

/// Default OSC address for an expression index
pub fn default_address(index: usize) -> String {
    format!("/tracking/face/{}", EXPRESSION_NAMES[index])
}

/// Look up an expression index by name (case-insensitive)
pub fn index_of(name: &str) -> Option<usize> {
    EXPRESSION_NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(name))
}

/// One tick's expression weights and confidences.
///
/// Always exactly [`EXPRESSION_COUNT`] weights; construction from untrusted
/// slices goes through [`ExpressionVector::from_slices`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionVector {
    weights: [f32; EXPRESSION_COUNT],
    confidences: [f32; CONFIDENCE_COUNT],
}

impl ExpressionVector {
    pub fn new(weights: [f32; EXPRESSION_COUNT], confidences: [f32; CONFIDENCE_COUNT]) -> Self {
        Self {
            weights,
            confidences,
        }
    }

    /// Build from runtime-provided slices, rejecting a wrong weight count.
    ///
    /// Missing confidences default to 0.0; they are informational only.
    pub fn from_slices(weights: &[f32], confidences: &[f32]) -> Result<Self, DeviceError> {
        let weights: [f32; EXPRESSION_COUNT] =
            weights.try_into().map_err(|_| DeviceError::WeightCount {
                expected: EXPRESSION_COUNT,
                found: weights.len(),
            })?;

        let mut conf = [0.0; CONFIDENCE_COUNT];
        for (dst, src) in conf.iter_mut().zip(confidences) {
            *dst = *src;
        }

        Ok(Self::new(weights, conf))
    }

    /// Set a single weight, builder style
    pub fn with_weight(mut self, index: usize, value: f32) -> Self {
        self.weights[index] = value;
        self
    }

    pub fn weights(&self) -> &[f32; EXPRESSION_COUNT] {
        &self.weights
    }

    pub fn weight(&self, index: usize) -> f32 {
        self.weights[index]
    }

    pub fn confidences(&self) -> &[f32; CONFIDENCE_COUNT] {
        &self.confidences
    }

    /// Left and right eyelid closure
    pub fn eyes_closed(&self) -> (f32, f32) {
        (self.weights[EYES_CLOSED_L], self.weights[EYES_CLOSED_R])
    }
}

impl Default for ExpressionVector {
    fn default() -> Self {
        Self::new([0.0; EXPRESSION_COUNT], [0.0; CONFIDENCE_COUNT])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let unique: HashSet<_> = EXPRESSION_NAMES.iter().collect();
        assert_eq!(unique.len(), EXPRESSION_COUNT);
    }

    #[test]
    fn test_well_known_indices() {
        assert_eq!(EXPRESSION_NAMES[EYES_CLOSED_L], "EyesClosedL");
        assert_eq!(EXPRESSION_NAMES[EYES_CLOSED_R], "EyesClosedR");
        assert_eq!(EXPRESSION_NAMES[JAW_DROP], "JawDrop");
        assert_eq!(index_of("eyesclosedr"), Some(EYES_CLOSED_R));
        assert_eq!(index_of("Tongue"), None);
    }

    #[test]
    fn test_default_address() {
        assert_eq!(default_address(0), "/tracking/face/BrowLowererL");
        assert_eq!(default_address(62), "/tracking/face/UpperLipRaiserR");
    }

    #[test]
    fn test_from_slices_rejects_short_vector() {
        let err = ExpressionVector::from_slices(&[0.5; 10], &[1.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::WeightCount {
                expected: EXPRESSION_COUNT,
                found: 10
            }
        ));
    }

    #[test]
    fn test_from_slices_copies_values() {
        let mut weights = vec![0.0; EXPRESSION_COUNT];
        weights[EYES_CLOSED_L] = 0.25;
        weights[EYES_CLOSED_R] = 0.75;

        let vector = ExpressionVector::from_slices(&weights, &[0.9]).unwrap();
        assert_eq!(vector.eyes_closed(), (0.25, 0.75));
        assert_eq!(vector.confidences(), &[0.9, 0.0]);
    }
}
