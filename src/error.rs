//! Error types for Gazecast

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Gazecast
#[derive(Error, Debug)]
pub enum GazecastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Rate/address file errors. Any of these aborts startup.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Failed to read {path}: {message}")]
    ReadFile { path: PathBuf, message: String },

    #[error("{mode} mode requires an expression channel mapping")]
    Missing { mode: String },

    #[error("{path} has {found} lines, expected at least {expected}")]
    Truncated {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("{path} line {line}: invalid scale factor '{value}'")]
    InvalidRate {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("{path} line {line}: invalid OSC address '{value}'")]
    InvalidAddress {
        path: PathBuf,
        line: usize,
        value: String,
    },
}

/// Acquisition device errors
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Bridge receiver error: {0}")]
    BridgeReceiver(String),

    #[error("Bridge subprocess error: {0}")]
    BridgeSubprocess(String),

    #[error("Expected {expected} expression weights, got {found}")]
    WeightCount { expected: usize, found: usize },
}

/// Bundle construction errors
#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Bundle of {size} bytes exceeds the {limit}-byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("OSC encoding failed: {0}")]
    Encode(String),
}

/// Outbound socket errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to resolve destination {0}")]
    Resolve(String),

    #[error("Failed to open socket: {0}")]
    Socket(String),
}

/// Result type alias for Gazecast operations
pub type Result<T> = std::result::Result<T, GazecastError>;
