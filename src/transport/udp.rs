//! UDP transport
//!
//! A tokio UDP socket bound to an ephemeral local port and connected to a
//! single device, so only datagrams from that device are received.

use std::io;
use std::net::SocketAddr;

use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, instrument};

use crate::error::{constants, Result};
use crate::transport::Datagram;

/// Connected UDP socket to one device. The socket closes on drop.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Resolve `address:port`, bind a local socket of the matching family and
    /// connect it to the device
    #[instrument(level = "debug")]
    pub async fn dial(address: &str, port: u16) -> Result<Self> {
        let peer = lookup_host((address, port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{}: {address}:{port}", constants::ERR_ADDRESS_UNRESOLVED),
                )
            })?;

        let local: SocketAddr = if peer.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;

        debug!(%peer, local = ?socket.local_addr().ok(), "Dialed device");
        Ok(Self { socket, peer })
    }

    /// Address of the device this transport talks to
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Datagram for UdpTransport {
    async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf).await
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf).await
    }
}
