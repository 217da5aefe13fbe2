//! # Transport Layer
//!
//! Raw datagram I/O underneath the protocol steps.
//!
//! The handshake and the request/response exchange only need to write one
//! datagram and read datagrams back, so they are written against the narrow
//! [`Datagram`] trait. [`udp::UdpTransport`] is the production implementation
//! over a connected tokio UDP socket; tests drive the same code with scripted
//! in-memory transports.

use std::future::Future;
use std::io;

pub mod udp;

pub use udp::UdpTransport;

/// A connected, message-oriented transport
pub trait Datagram {
    /// Write one datagram, returning the number of bytes written
    fn send(&self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Read one datagram into `buf`, returning the number of bytes read
    fn recv(&self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}
