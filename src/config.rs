//! Configuration parsing and management for Gazecast

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, GazecastError};
use crate::output::packet::{BUNDLE_HEADER_LEN, DEFAULT_MAX_PACKET_SIZE, MAX_UDP_PAYLOAD};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which signal families are forwarded
    pub mode: TrackingMode,
    pub output: OutputConfig,
    pub eye: EyeConfig,
    pub face: FaceConfig,
    pub device: DeviceConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GazecastError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, GazecastError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, GazecastError> {
        let paths = [
            PathBuf::from("gazecast.toml"),
            PathBuf::from("config/gazecast.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), GazecastError> {
        if self.output.tick_ms == 0 {
            return Err(invalid("output.tick_ms", "Tick period must be greater than 0"));
        }

        if self.output.port == 0 {
            return Err(invalid("output.port", "Port must be greater than 0"));
        }

        if self.output.host.trim().is_empty() {
            return Err(invalid("output.host", "Destination host must not be empty"));
        }

        if self.output.max_packet_size < BUNDLE_HEADER_LEN {
            return Err(invalid(
                "output.max_packet_size",
                &format!("Limit must be at least {} bytes", BUNDLE_HEADER_LEN),
            ));
        }

        if self.output.max_packet_size > MAX_UDP_PAYLOAD {
            return Err(invalid(
                "output.max_packet_size",
                &format!("Limit must not exceed the {}-byte UDP payload", MAX_UDP_PAYLOAD),
            ));
        }

        for (field, address) in [
            ("eye.closed_address", &self.eye.closed_address),
            ("eye.pitch_yaw_address", &self.eye.pitch_yaw_address),
        ] {
            if !address.starts_with('/') {
                return Err(invalid(field, "OSC address must start with '/'"));
            }
        }

        if self.device.kind == DeviceKind::Bridge {
            if self.device.port == 0 {
                return Err(invalid("device.port", "Port must be greater than 0"));
            }

            if self.device.stale_after_ms == 0 {
                return Err(invalid(
                    "device.stale_after_ms",
                    "Staleness window must be greater than 0",
                ));
            }

            if self.device.auto_launch && self.device.bridge_command.is_empty() {
                return Err(invalid(
                    "device.bridge_command",
                    "auto_launch requires a bridge command",
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> GazecastError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Signal families forwarded each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// Eye closure and gaze pitch/yaw
    #[default]
    Eye,
    /// One channel per facial expression
    Face,
    /// Eye signals followed by every expression channel
    Full,
}

impl TrackingMode {
    /// Whether this mode needs the rate/address mapping files
    pub fn uses_expression_channels(self) -> bool {
        matches!(self, Self::Face | Self::Full)
    }

    /// Whether this mode emits the eye signals
    pub fn uses_eye_signals(self) -> bool {
        matches!(self, Self::Eye | Self::Full)
    }
}

impl FromStr for TrackingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eye" => Ok(Self::Eye),
            "face" => Ok(Self::Face),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown mode '{}' (expected eye, face or full)", other)),
        }
    }
}

/// Outbound OSC stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination host
    pub host: String,
    /// Destination UDP port
    pub port: u16,
    /// Tick period in milliseconds
    pub tick_ms: u64,
    /// Largest bundle that may be sent, in bytes
    pub max_packet_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            tick_ms: 33,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

/// How the two eyelid closure weights are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosedAmount {
    /// (left + right) / 2
    #[default]
    Average,
    /// left + right
    Sum,
}

impl ClosedAmount {
    pub fn combine(self, left: f32, right: f32) -> f32 {
        match self {
            Self::Average => (left + right) / 2.0,
            Self::Sum => left + right,
        }
    }
}

/// Eye signal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    pub closed_amount: ClosedAmount,
    /// Address of the single-float eyelid closure message
    pub closed_address: String,
    /// Address of the four-float left/right pitch/yaw message
    pub pitch_yaw_address: String,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            closed_amount: ClosedAmount::Average,
            closed_address: "/tracking/eye/EyesClosedAmount".to_string(),
            pitch_yaw_address: "/tracking/eye/LeftRightPitchYaw".to_string(),
        }
    }
}

/// Expression channel mapping files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// One scale factor per line, one line per expression
    pub rate_file: PathBuf,
    /// One OSC address per line, one line per expression
    pub address_file: PathBuf,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            rate_file: PathBuf::from("rate.txt"),
            address_file: PathBuf::from("address.txt"),
        }
    }
}

/// Acquisition device backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// JSON frames from the runtime helper over local UDP
    #[default]
    Bridge,
    /// Deterministic synthetic motion
    Simulated,
}

/// Acquisition device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub kind: DeviceKind,
    /// Listen address for bridge frames
    pub listen_address: String,
    /// UDP port to receive bridge frames on
    pub port: u16,
    /// A family not updated within this window is reported invalid
    pub stale_after_ms: u64,
    /// Launch the runtime helper as a child process
    pub auto_launch: bool,
    /// Helper program followed by its arguments
    pub bridge_command: Vec<String>,
    /// Relaunch the helper if it exits
    pub auto_restart: bool,
    /// Delay before relaunching an exited helper (seconds)
    pub restart_delay_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            kind: DeviceKind::Bridge,
            listen_address: "127.0.0.1".to_string(),
            port: 9100,
            stale_after_ms: 500,
            auto_launch: false,
            bridge_command: Vec::new(),
            auto_restart: true,
            restart_delay_secs: 3,
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("gazecast");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/gazecast");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/gazecast");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("gazecast");
        }
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.host, "127.0.0.1");
        assert_eq!(config.output.port, 9000);
        assert_eq!(config.output.tick_ms, 33);
        assert_eq!(config.output.max_packet_size, 6144);
        assert_eq!(config.mode, TrackingMode::Eye);
        assert_eq!(config.eye.closed_amount, ClosedAmount::Average);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            mode = "full"

            [output]
            host = "192.168.1.20"
            port = 9001
            tick_ms = 16

            [eye]
            closed_amount = "sum"

            [device]
            kind = "simulated"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.mode, TrackingMode::Full);
        assert_eq!(config.output.host, "192.168.1.20");
        assert_eq!(config.output.port, 9001);
        assert_eq!(config.output.tick_ms, 16);
        assert_eq!(config.eye.closed_amount, ClosedAmount::Sum);
        assert_eq!(config.device.kind, DeviceKind::Simulated);
        assert_eq!(config.face.rate_file, PathBuf::from("rate.txt"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gazecast.toml");
        std::fs::write(&path, "mode = \"face\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.mode, TrackingMode::Face);

        assert!(Config::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.output.tick_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.eye.pitch_yaw_address = "tracking/eye".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.max_packet_size = 8;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.device.auto_launch = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_packet_limit_fits_one_datagram() {
        let mut config = Config::default();
        config.output.max_packet_size = MAX_UDP_PAYLOAD;
        assert!(config.validate().is_ok());

        config.output.max_packet_size = MAX_UDP_PAYLOAD + 1;
        assert!(matches!(
            config.validate(),
            Err(GazecastError::Config(ConfigError::InvalidValue { ref field, .. }))
                if field == "output.max_packet_size"
        ));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("eye".parse::<TrackingMode>().unwrap(), TrackingMode::Eye);
        assert_eq!("FACE".parse::<TrackingMode>().unwrap(), TrackingMode::Face);
        assert!("mouth".parse::<TrackingMode>().is_err());
        assert!(TrackingMode::Full.uses_eye_signals());
        assert!(TrackingMode::Full.uses_expression_channels());
        assert!(!TrackingMode::Eye.uses_expression_channels());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = Config::from_str(include_str!("../gazecast.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.device.port, 9100);
    }

    #[test]
    fn test_closed_amount_combine() {
        assert_eq!(ClosedAmount::Average.combine(0.25, 0.75), 0.5);
        assert_eq!(ClosedAmount::Sum.combine(0.25, 0.5), 0.75);
    }
}
