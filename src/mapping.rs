//! Expression channel mapping
//!
//! Maps every expression index to an OSC address and a scale factor. The
//! mapping is loaded once at startup from two line-oriented files:
//!
//! - rate file: one float per line, the scale for that index
//! - address file: one OSC address per line
//!
//! Both must cover the whole taxonomy. A short or malformed file aborts
//! startup; no partial mapping is ever built.

use std::path::{Path, PathBuf};

use crate::error::MappingError;
use crate::tracking::expression::{default_address, ExpressionVector, EXPRESSION_COUNT, EXPRESSION_NAMES};

pub const RATE_FILE_NAME: &str = "rate.txt";
pub const ADDRESS_FILE_NAME: &str = "address.txt";

/// Destination and scale for one expression index
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub address: String,
    pub scale: f32,
}

/// One entry per expression index, in index order
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMapping {
    channels: Vec<Channel>,
}

impl ChannelMapping {
    /// Default addresses, scale 1.0
    pub fn identity() -> Self {
        Self {
            channels: (0..EXPRESSION_COUNT)
                .map(|i| Channel {
                    address: default_address(i),
                    scale: 1.0,
                })
                .collect(),
        }
    }

    /// Load the rate and address files
    pub fn from_files(rate_path: &Path, address_path: &Path) -> Result<Self, MappingError> {
        let rates = read(rate_path)?;
        let addresses = read(address_path)?;

        let scales = parse_rates(&rates, rate_path)?;
        let addresses = parse_addresses(&addresses, address_path)?;

        Ok(Self {
            channels: addresses
                .into_iter()
                .zip(scales)
                .map(|(address, scale)| Channel { address, scale })
                .collect(),
        })
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Scaled value per channel, in index order. Confidence is not consulted.
    pub fn map(&self, weights: &ExpressionVector) -> Vec<(&str, f32)> {
        self.channels
            .iter()
            .zip(weights.weights())
            .map(|(channel, weight)| (channel.address.as_str(), weight * channel.scale))
            .collect()
    }

    /// Write template rate/address files (scale 1.0, default addresses)
    /// into `dir`, returning their paths.
    pub fn write_templates(dir: &Path) -> std::io::Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)?;

        let identity = Self::identity();
        let mut rates = String::new();
        let mut addresses = String::new();
        for channel in &identity.channels {
            rates.push_str("1.0\n");
            addresses.push_str(&channel.address);
            addresses.push('\n');
        }

        let rate_path = dir.join(RATE_FILE_NAME);
        let address_path = dir.join(ADDRESS_FILE_NAME);
        std::fs::write(&rate_path, rates)?;
        std::fs::write(&address_path, addresses)?;

        Ok((rate_path, address_path))
    }
}

fn read(path: &Path) -> Result<String, MappingError> {
    std::fs::read_to_string(path).map_err(|e| MappingError::ReadFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// First `EXPRESSION_COUNT` lines, or a truncation error
fn taxonomy_lines<'a>(text: &'a str, path: &Path) -> Result<Vec<&'a str>, MappingError> {
    let lines: Vec<&str> = text.lines().take(EXPRESSION_COUNT).collect();
    if lines.len() < EXPRESSION_COUNT {
        return Err(MappingError::Truncated {
            path: path.to_path_buf(),
            expected: EXPRESSION_COUNT,
            found: lines.len(),
        });
    }
    Ok(lines)
}

fn parse_rates(text: &str, path: &Path) -> Result<Vec<f32>, MappingError> {
    taxonomy_lines(text, path)?
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let value = line.trim();
            value
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| MappingError::InvalidRate {
                    path: path.to_path_buf(),
                    line: i + 1,
                    value: value.to_string(),
                })
        })
        .collect()
}

fn parse_addresses(text: &str, path: &Path) -> Result<Vec<String>, MappingError> {
    taxonomy_lines(text, path)?
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let value = line.trim();
            if value.starts_with('/') && !value.contains(char::is_whitespace) {
                Ok(value.to_string())
            } else {
                Err(MappingError::InvalidAddress {
                    path: path.to_path_buf(),
                    line: i + 1,
                    value: value.to_string(),
                })
            }
        })
        .collect()
}

/// Human-readable taxonomy listing: index, name, default address
pub fn describe_taxonomy() -> String {
    EXPRESSION_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{:>3}  {:<22} {}\n", i, name, default_address(i)))
        .collect()
}
