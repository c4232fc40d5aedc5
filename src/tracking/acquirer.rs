//! Per-tick sample acquisition

use crate::tracking::device::{GazePoses, TrackingDevice};
use crate::tracking::expression::ExpressionVector;

/// What one tick read from the device. `None` marks an invalid family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSample {
    pub gaze: Option<GazePoses>,
    pub expressions: Option<ExpressionVector>,
}

/// Owns the device for the process lifetime and samples it once per tick
pub struct SampleAcquirer {
    device: Box<dyn TrackingDevice>,
}

impl SampleAcquirer {
    pub fn new(device: Box<dyn TrackingDevice>) -> Self {
        Self { device }
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Refresh the device and read both families.
    ///
    /// A refresh failure is logged and the tick proceeds with whatever the
    /// device still reports; the families' own validity flags decide use.
    pub fn acquire(&mut self) -> TickSample {
        if let Err(e) = self.device.refresh() {
            tracing::warn!("Device refresh failed: {}", e);
        }

        let gaze = self.device.eye_gazes();
        let expressions = self.device.expression_weights();

        TickSample {
            gaze: gaze.is_valid().then_some(gaze),
            expressions: expressions.valid.then_some(expressions.weights),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceError;
    use crate::tracking::device::{ExpressionSample, GazeSample};
    use crate::tracking::orientation::Quaternion;

    struct FixedDevice {
        gaze: GazePoses,
        expressions: ExpressionSample,
        fail_refresh: bool,
    }

    impl TrackingDevice for FixedDevice {
        fn name(&self) -> &str {
            "fixed"
        }

        fn refresh(&mut self) -> Result<(), DeviceError> {
            if self.fail_refresh {
                return Err(DeviceError::BridgeReceiver("unplugged".to_string()));
            }
            Ok(())
        }

        fn eye_gazes(&self) -> GazePoses {
            self.gaze
        }

        fn expression_weights(&self) -> ExpressionSample {
            self.expressions.clone()
        }
    }

    fn valid_gaze() -> GazePoses {
        let eye = GazeSample::valid(Quaternion::IDENTITY);
        GazePoses::new(eye, eye)
    }

    #[test]
    fn test_valid_families_are_returned() {
        let mut acquirer = SampleAcquirer::new(Box::new(FixedDevice {
            gaze: valid_gaze(),
            expressions: ExpressionSample::valid(ExpressionVector::default()),
            fail_refresh: false,
        }));

        let sample = acquirer.acquire();
        assert_eq!(sample.gaze, Some(valid_gaze()));
        assert_eq!(sample.expressions, Some(ExpressionVector::default()));
        assert_eq!(acquirer.device_name(), "fixed");
    }

    #[test]
    fn test_invalid_families_are_none() {
        let mut acquirer = SampleAcquirer::new(Box::new(FixedDevice {
            gaze: GazePoses::new(GazeSample::valid(Quaternion::IDENTITY), GazeSample::default()),
            expressions: ExpressionSample::default(),
            fail_refresh: false,
        }));

        let sample = acquirer.acquire();
        assert!(sample.gaze.is_none());
        assert!(sample.expressions.is_none());
    }

    #[test]
    fn test_refresh_failure_does_not_abort() {
        let mut acquirer = SampleAcquirer::new(Box::new(FixedDevice {
            gaze: valid_gaze(),
            expressions: ExpressionSample::default(),
            fail_refresh: true,
        }));

        let sample = acquirer.acquire();
        assert!(sample.gaze.is_some());
        assert!(sample.expressions.is_none());
    }
}
