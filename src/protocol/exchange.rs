//! Request/response exchange
//!
//! Turns an opaque payload into a request frame, writes it, reassembles the
//! response from one or more datagrams and opens it again.
//!
//! ```text
//! payload -> +0x00 -> pad -> encrypt -> frame -> write
//! read chunks until `length` bytes -> verify checksum -> decrypt -> unpad -> -0x00
//! ```

use bytes::BytesMut;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

use crate::core::frame::{self, FrameHeader, MAX_FRAME_LEN};
use crate::core::token::Token;
use crate::error::{ProtocolError, Result};
use crate::protocol::handshake::DeviceIdentity;
use crate::transport::Datagram;
use crate::utils::crypto::Cipher;
use crate::utils::metrics::Metrics;
use crate::utils::timeout::with_deadline;

/// Trailing byte the device-side parser expects after the payload
pub const SENTINEL: u8 = 0x00;

/// Default size of a single read while reassembling a response
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Build the wire frame for `payload`
pub fn build_request(
    cipher: &Cipher,
    token: &Token,
    identity: DeviceIdentity,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let mut plaintext = Vec::with_capacity(payload.len() + 1);
    plaintext.extend_from_slice(payload);
    if plaintext.last() != Some(&SENTINEL) {
        plaintext.push(SENTINEL);
    }

    let ciphertext = cipher.seal(&plaintext)?;
    frame::encode_frame(identity.device_id, identity.stamp, token, &ciphertext)
}

/// Verify, decrypt and unwrap a response frame
pub fn decode_response(cipher: &Cipher, token: &Token, response: &[u8]) -> Result<Vec<u8>> {
    let ciphertext = frame::decode_frame(response, token)?;
    let mut plaintext = cipher.open(ciphertext)?;

    if plaintext.last() == Some(&SENTINEL) {
        plaintext.pop();
    }
    if plaintext.is_empty() {
        return Err(ProtocolError::EmptyResponse);
    }

    Ok(plaintext)
}

/// Read datagrams until a whole frame has arrived.
///
/// The expected length is taken from the first chunk only. Every read gets a
/// buffer large enough for any frame, since a datagram longer than the buffer
/// is truncated by the socket. `chunk_size` only sizes the initial
/// reservation for the reassembled response.
pub async fn receive_frame<D: Datagram>(
    transport: &D,
    deadline: Instant,
    chunk_size: usize,
) -> Result<BytesMut> {
    let mut response = BytesMut::with_capacity(chunk_size.min(MAX_FRAME_LEN));
    let mut chunk = vec![0u8; MAX_FRAME_LEN];
    let mut expected_len: Option<usize> = None;

    loop {
        let read = with_deadline(transport.recv(&mut chunk), deadline).await?;

        let expected = match expected_len {
            Some(len) => len,
            None => {
                let len = frame::peek_length(&chunk[..read])?;
                expected_len = Some(len);
                len
            }
        };

        response.extend_from_slice(&chunk[..read]);
        trace!(read, received = response.len(), expected, "Response chunk");

        if response.len() >= expected {
            return Ok(response);
        }
    }
}

/// Time and buffer limits for one exchange
#[derive(Debug, Clone, Copy)]
pub struct ExchangeLimits {
    /// Absolute deadline shared by the write and every read
    pub deadline: Instant,
    /// Initial reservation for the reassembled response
    pub chunk_size: usize,
}

/// One full exchange over an already greeted transport.
///
/// `identity` must already carry the stamp for this request. The request is
/// counted in `metrics` as soon as it is on the wire and the response as soon
/// as a whole frame is read, whether or not it then decodes.
#[instrument(skip_all, fields(device_id = identity.device_id, stamp = identity.stamp), level = "debug")]
pub async fn round_trip<D: Datagram>(
    transport: &D,
    cipher: &Cipher,
    token: &Token,
    identity: DeviceIdentity,
    payload: &[u8],
    limits: ExchangeLimits,
    metrics: &Metrics,
) -> Result<Exchanged> {
    let request = build_request(cipher, token, identity, payload)?;

    let written = with_deadline(transport.send(&request), limits.deadline).await?;
    if written != request.len() {
        return Err(ProtocolError::ShortWrite {
            expected: request.len(),
            written,
        });
    }
    metrics.request_sent(written);

    let response = receive_frame(transport, limits.deadline, limits.chunk_size).await?;
    metrics.response_received(response.len());
    if let Ok(header) = FrameHeader::parse(&response) {
        debug!(
            length = header.length,
            received = response.len(),
            stamp = header.stamp,
            "Response frame received"
        );
    }

    let payload = decode_response(cipher, token, &response)?;
    Ok(Exchanged {
        request_len: request.len(),
        response_len: response.len(),
        payload,
    })
}

/// Outcome of a successful [`round_trip`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchanged {
    /// Bytes written on the wire
    pub request_len: usize,
    /// Bytes read from the wire
    pub response_len: usize,
    /// Decrypted response payload
    pub payload: Vec<u8>,
}
