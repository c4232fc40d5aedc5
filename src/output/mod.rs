//! Output module
//!
//! Bundle encoding and the UDP transport that carries it.

pub mod packet;
pub mod transport;
