//! Fire-and-forget UDP transport

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::error::TransportError;

/// Sends each bundle as a single datagram to a fixed destination
pub struct UdpTransport {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpTransport {
    /// Resolve the destination and open an ephemeral-port socket of the same
    /// address family
    pub fn open(host: &str, port: u16) -> Result<Self, TransportError> {
        let destination = (host, port)
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve(format!("{}:{}: {}", host, port, e)))?
            .next()
            .ok_or_else(|| TransportError::Resolve(format!("{}:{}: no addresses", host, port)))?;

        let local = if destination.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };

        let socket = UdpSocket::bind(local)
            .map_err(|e| TransportError::Socket(format!("bind {}: {}", local, e)))?;

        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::Socket(format!("set non-blocking: {}", e)))?;

        tracing::info!("OSC destination {}", destination);

        Ok(Self {
            socket,
            destination,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Send one datagram. No retry; the caller decides what a failure means.
    pub fn send(&self, payload: &[u8]) -> std::io::Result<usize> {
        self.socket.send_to(payload, self.destination)
    }
}
