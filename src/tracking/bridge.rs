//! Device runtime bridge receiver
//!
//! The vendor runtime session (instance, session, eye and face trackers,
//! view reference space) lives in a small helper process. The helper
//! publishes one JSON frame per runtime update over local UDP:
//!
//! ```json
//! {
//!   "gaze": {
//!     "left":  { "orientation": [x, y, z, w], "valid": true },
//!     "right": { "orientation": [x, y, z, w], "valid": true }
//!   },
//!   "expressions": { "valid": true, "weights": [63 floats], "confidences": [2 floats] }
//! }
//! ```
//!
//! Either family may be omitted from a frame. Each refresh drains every
//! pending datagram and keeps the newest value per family.

use serde::Deserialize;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use crate::config::DeviceConfig;
use crate::error::{DeviceError, GazecastError};
use crate::tracking::device::{ExpressionSample, GazePoses, GazeSample, TrackingDevice};
use crate::tracking::expression::ExpressionVector;
use crate::tracking::subprocess::BridgeSubprocess;

/// Largest datagram the bridge will read
const MAX_FRAME_SIZE: usize = 65536;

/// A single JSON frame from the runtime helper
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeFrame {
    #[serde(default)]
    pub gaze: Option<BridgeGaze>,
    #[serde(default)]
    pub expressions: Option<BridgeExpressions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeGaze {
    pub left: BridgeEye,
    pub right: BridgeEye,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeEye {
    /// Quaternion (x, y, z, w)
    pub orientation: [f32; 4],
    pub valid: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeExpressions {
    pub valid: bool,
    pub weights: Vec<f32>,
    #[serde(default)]
    pub confidences: Vec<f32>,
}

impl From<&BridgeEye> for GazeSample {
    fn from(eye: &BridgeEye) -> Self {
        Self {
            orientation: eye.orientation.into(),
            valid: eye.valid,
        }
    }
}

/// UDP receiver for runtime helper frames
pub struct BridgeDevice {
    socket: UdpSocket,
    stale_after: Duration,
    gaze: Option<(GazePoses, Instant)>,
    expressions: Option<(ExpressionSample, Instant)>,
    last_refresh: Instant,
    recv_buf: Vec<u8>,
    subprocess: Option<BridgeSubprocess>,
}

impl BridgeDevice {
    /// Bind the bridge socket (does not launch the helper)
    pub fn bind(config: &DeviceConfig) -> Result<Self, GazecastError> {
        let addr = format!("{}:{}", config.listen_address, config.port);

        let socket = UdpSocket::bind(&addr).map_err(|e| {
            DeviceError::BridgeReceiver(format!("Failed to bind to {}: {}", addr, e))
        })?;

        socket.set_nonblocking(true).map_err(|e| {
            DeviceError::BridgeReceiver(format!("Failed to set non-blocking: {}", e))
        })?;

        tracing::info!("Bridge receiver listening on {}", addr);

        Ok(Self {
            socket,
            stale_after: Duration::from_millis(config.stale_after_ms),
            gaze: None,
            expressions: None,
            last_refresh: Instant::now(),
            recv_buf: vec![0u8; MAX_FRAME_SIZE],
            subprocess: None,
        })
    }

    /// Bind the socket and, if configured, launch the runtime helper
    pub fn open(config: &DeviceConfig) -> Result<Self, GazecastError> {
        let mut device = Self::bind(config)?;

        if config.auto_launch {
            let mut subprocess = BridgeSubprocess::new(config);
            subprocess.start()?;
            device.subprocess = Some(subprocess);
        }

        Ok(device)
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Fold one frame into the latest state
    fn apply(&mut self, frame: BridgeFrame, now: Instant) {
        if let Some(gaze) = &frame.gaze {
            let poses = GazePoses::new((&gaze.left).into(), (&gaze.right).into());
            self.gaze = Some((poses, now));
        }

        if let Some(expr) = frame.expressions {
            let sample = match ExpressionVector::from_slices(&expr.weights, &expr.confidences) {
                Ok(weights) => ExpressionSample {
                    weights,
                    valid: expr.valid,
                },
                Err(e) => {
                    tracing::warn!("Discarding bridge expressions: {}", e);
                    ExpressionSample::default()
                }
            };
            self.expressions = Some((sample, now));
        }
    }

    fn is_fresh(&self, updated: Instant) -> bool {
        self.last_refresh.saturating_duration_since(updated) <= self.stale_after
    }
}

impl TrackingDevice for BridgeDevice {
    fn name(&self) -> &str {
        "bridge"
    }

    fn refresh(&mut self) -> Result<(), DeviceError> {
        let now = Instant::now();
        self.last_refresh = now;

        if let Some(sp) = &mut self.subprocess {
            sp.supervise(now);
        }

        loop {
            match self.socket.recv(&mut self.recv_buf) {
                Ok(0) => {}
                Ok(size) => match serde_json::from_slice::<BridgeFrame>(&self.recv_buf[..size]) {
                    Ok(frame) => self.apply(frame, now),
                    Err(e) => tracing::warn!("Skipping malformed bridge frame: {}", e),
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                // Windows reports ICMP port-unreachable on the receive side
                Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {}
                Err(e) => {
                    return Err(DeviceError::BridgeReceiver(format!("Receive error: {}", e)));
                }
            }
        }

        Ok(())
    }

    fn eye_gazes(&self) -> GazePoses {
        match self.gaze {
            Some((poses, at)) if self.is_fresh(at) => poses,
            _ => GazePoses::default(),
        }
    }

    fn expression_weights(&self) -> ExpressionSample {
        match &self.expressions {
            Some((sample, at)) if self.is_fresh(*at) => sample.clone(),
            _ => ExpressionSample::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::expression::{EXPRESSION_COUNT, EYES_CLOSED_L};
    use crate::tracking::orientation::Quaternion;

    fn bind(stale_after_ms: u64) -> (BridgeDevice, UdpSocket) {
        let config = DeviceConfig {
            port: 0,
            stale_after_ms,
            ..DeviceConfig::default()
        };
        let device = BridgeDevice::bind(&config).unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.connect(device.local_addr().unwrap()).unwrap();
        (device, sender)
    }

    /// Refresh until the loopback datagrams have arrived
    fn refresh_settled(device: &mut BridgeDevice) {
        std::thread::sleep(Duration::from_millis(20));
        device.refresh().unwrap();
    }

    fn gaze_json(valid: bool) -> String {
        serde_json::json!({
            "gaze": {
                "left": { "orientation": [0.0, 0.0, 0.0, 1.0], "valid": valid },
                "right": { "orientation": [0.1, 0.0, 0.0, 0.995], "valid": valid }
            }
        })
        .to_string()
    }

    fn expressions_json(valid: bool, count: usize) -> String {
        let mut weights = vec![0.0f32; count];
        if count > EYES_CLOSED_L {
            weights[EYES_CLOSED_L] = 0.5;
        }
        serde_json::json!({
            "expressions": { "valid": valid, "weights": weights, "confidences": [0.9, 0.8] }
        })
        .to_string()
    }

    #[test]
    fn test_no_data_is_invalid() {
        let (mut device, _sender) = bind(500);
        device.refresh().unwrap();
        assert!(!device.eye_gazes().is_valid());
        assert!(!device.expression_weights().valid);
    }

    #[test]
    fn test_receives_gaze_and_expressions() {
        let (mut device, sender) = bind(500);
        sender.send(gaze_json(true).as_bytes()).unwrap();
        sender
            .send(expressions_json(true, EXPRESSION_COUNT).as_bytes())
            .unwrap();
        refresh_settled(&mut device);

        let gaze = device.eye_gazes();
        assert!(gaze.is_valid());
        assert_eq!(gaze.left.orientation, Quaternion::IDENTITY);
        assert_eq!(gaze.right.orientation.x, 0.1);

        let expr = device.expression_weights();
        assert!(expr.valid);
        assert_eq!(expr.weights.weight(EYES_CLOSED_L), 0.5);
        assert_eq!(expr.weights.confidences(), &[0.9, 0.8]);
    }

    #[test]
    fn test_families_are_independent() {
        let (mut device, sender) = bind(500);
        sender.send(gaze_json(true).as_bytes()).unwrap();
        sender
            .send(expressions_json(false, EXPRESSION_COUNT).as_bytes())
            .unwrap();
        refresh_settled(&mut device);

        assert!(device.eye_gazes().is_valid());
        assert!(!device.expression_weights().valid);
    }

    #[test]
    fn test_newest_frame_wins() {
        let (mut device, sender) = bind(500);
        sender.send(gaze_json(true).as_bytes()).unwrap();
        sender.send(gaze_json(false).as_bytes()).unwrap();
        refresh_settled(&mut device);

        assert!(!device.eye_gazes().is_valid());
    }

    #[test]
    fn test_malformed_frames_are_skipped() {
        let (mut device, sender) = bind(500);
        sender.send(b"not json").unwrap();
        sender.send(gaze_json(true).as_bytes()).unwrap();
        refresh_settled(&mut device);

        assert!(device.eye_gazes().is_valid());
    }

    #[test]
    fn test_wrong_weight_count_is_invalid() {
        let (mut device, sender) = bind(500);
        sender.send(expressions_json(true, 10).as_bytes()).unwrap();
        refresh_settled(&mut device);

        assert!(!device.expression_weights().valid);
    }

    #[test]
    fn test_stale_data_becomes_invalid() {
        let (mut device, sender) = bind(30);
        sender.send(gaze_json(true).as_bytes()).unwrap();
        refresh_settled(&mut device);
        assert!(device.eye_gazes().is_valid());

        std::thread::sleep(Duration::from_millis(60));
        device.refresh().unwrap();
        assert!(!device.eye_gazes().is_valid());
    }
}
