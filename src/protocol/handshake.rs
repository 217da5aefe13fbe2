//! Hello handshake
//!
//! Before a device accepts a request it must be greeted with a fixed 32-byte
//! hello datagram. The device answers with a 32-byte header carrying its
//! device identifier and its current stamp; both are echoed in the next
//! request frame.
//!
//! The hello reply is the one frame in the protocol that is not covered by the
//! token checksum. A malformed length is the only thing detected here.

use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::core::frame::{HEADER_LEN, MAGIC};
use crate::error::{ProtocolError, Result};
use crate::transport::Datagram;
use crate::utils::timeout::with_deadline;

/// Length of the hello request and reply
pub const HELLO_LEN: usize = HEADER_LEN;

/// Hello request: magic, length 0x0020, then all `0xFF`
pub const HELLO_PACKET: [u8; HELLO_LEN] = hello_packet();

const fn hello_packet() -> [u8; HELLO_LEN] {
    let mut packet = [0xFFu8; HELLO_LEN];
    let magic = MAGIC.to_be_bytes();
    let length = (HELLO_LEN as u16).to_be_bytes();
    packet[0] = magic[0];
    packet[1] = magic[1];
    packet[2] = length[0];
    packet[3] = length[1];
    packet
}

/// Device identifier and stamp learned from a hello exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_id: u32,
    pub stamp: u32,
}

impl DeviceIdentity {
    /// Increment the stamp and return the value to place in the next frame
    pub fn advance(&mut self) -> u32 {
        self.stamp = self.stamp.wrapping_add(1);
        self.stamp
    }
}

/// Parse a hello reply
pub fn parse_hello_reply(reply: &[u8]) -> Result<DeviceIdentity> {
    if reply.len() != HELLO_LEN {
        return Err(ProtocolError::MalformedHello(reply.len()));
    }

    Ok(DeviceIdentity {
        device_id: u32::from_be_bytes([reply[8], reply[9], reply[10], reply[11]]),
        stamp: u32::from_be_bytes([reply[12], reply[13], reply[14], reply[15]]),
    })
}

/// Send the hello datagram and read back the device identity
#[instrument(skip(transport), level = "debug")]
pub async fn hello<D: Datagram>(transport: &D, deadline: Instant) -> Result<DeviceIdentity> {
    let written = with_deadline(transport.send(&HELLO_PACKET), deadline).await?;
    if written != HELLO_LEN {
        return Err(ProtocolError::ShortWrite {
            expected: HELLO_LEN,
            written,
        });
    }

    // One spare byte so an oversized reply is reported instead of truncated
    let mut reply = [0u8; HELLO_LEN + 1];
    let read = with_deadline(transport.recv(&mut reply), deadline).await?;

    let identity = parse_hello_reply(&reply[..read])?;
    debug!(
        device_id = identity.device_id,
        stamp = identity.stamp,
        "Hello reply received"
    );
    Ok(identity)
}
