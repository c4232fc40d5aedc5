//! OSC bundle construction
//!
//! Every tick's signals go out as one immediate-timetag OSC bundle. Sizes
//! are computed up front so an oversized bundle is rejected before any
//! bytes are encoded or sent.

use rosc::{OscBundle, OscMessage, OscPacket, OscTime, OscType};

use crate::error::PacketError;
use crate::pipeline::DerivedSignal;

/// Default bundle limit in bytes
pub const DEFAULT_MAX_PACKET_SIZE: usize = 6144;

/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_UDP_PAYLOAD: usize = 65507;

/// "#bundle\0" plus the 8-byte timetag
pub const BUNDLE_HEADER_LEN: usize = 16;

/// OSC "immediately" timetag
const IMMEDIATE: OscTime = OscTime {
    seconds: 0,
    fractional: 1,
};

fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

/// Encoded size of one bundle element carrying `float_count` float
/// arguments, including its 4-byte size prefix
pub fn element_len(address: &str, float_count: usize) -> usize {
    4 + pad4(address.len() + 1) + pad4(float_count + 2) + 4 * float_count
}

/// Encoded size of a bundle holding `signals`
pub fn bundle_len(signals: &[DerivedSignal<'_>]) -> usize {
    BUNDLE_HEADER_LEN
        + signals
            .iter()
            .map(|s| element_len(s.address, s.value.as_slice().len()))
            .sum::<usize>()
}

/// Serializes derived signals into bounded OSC bundles
#[derive(Debug, Clone, Copy)]
pub struct PacketBuilder {
    max_size: usize,
}

impl PacketBuilder {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Size the bundle for `signals`, failing if it would exceed the limit
    pub fn check(&self, signals: &[DerivedSignal<'_>]) -> Result<usize, PacketError> {
        let size = bundle_len(signals);
        if size > self.max_size {
            return Err(PacketError::TooLarge {
                size,
                limit: self.max_size,
            });
        }
        Ok(size)
    }

    /// Encode one bundle with one message per signal, in order
    pub fn build(&self, signals: &[DerivedSignal<'_>]) -> Result<Vec<u8>, PacketError> {
        let expected = self.check(signals)?;

        let bundle = OscPacket::Bundle(OscBundle {
            timetag: IMMEDIATE,
            content: signals
                .iter()
                .map(|signal| {
                    OscPacket::Message(OscMessage {
                        addr: signal.address.to_string(),
                        args: signal
                            .value
                            .as_slice()
                            .iter()
                            .map(|v| OscType::Float(*v))
                            .collect(),
                    })
                })
                .collect(),
        });

        let bytes =
            rosc::encoder::encode(&bundle).map_err(|e| PacketError::Encode(e.to_string()))?;

        if bytes.len() > self.max_size {
            return Err(PacketError::TooLarge {
                size: bytes.len(),
                limit: self.max_size,
            });
        }
        debug_assert_eq!(bytes.len(), expected);

        Ok(bytes)
    }
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PACKET_SIZE)
    }
}
