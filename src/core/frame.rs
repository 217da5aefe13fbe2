//! MIIO wire frame
//!
//! ```text
//! 0      2        4          8           12      16            32
//! +------+--------+----------+-----------+-------+-------------+----------------+
//! |2131  | length | reserved | device id | stamp | checksum    | encrypted body |
//! +------+--------+----------+-----------+-------+-------------+----------------+
//! ```
//!
//! All integers are big-endian. `length` counts the header plus the body. The
//! checksum is the MD5 of the whole frame computed while the checksum slot
//! holds the raw token, so a valid checksum proves possession of the token
//! without sending it.

use bytes::{BufMut, BytesMut};
use md5::{Digest, Md5};

use crate::core::token::Token;
use crate::error::{ProtocolError, Result};

/// Magic number opening every frame
pub const MAGIC: u16 = 0x2131;

/// Fixed header length
pub const HEADER_LEN: usize = 32;

/// Offset of the checksum slot
pub const CHECKSUM_OFFSET: usize = 16;

/// Size of the checksum slot
pub const CHECKSUM_LEN: usize = 16;

/// Smallest frame carrying a body
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1;

/// Largest frame the u16 length field can describe
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Bytes needed before the length field can be read
pub const LENGTH_FIELD_END: usize = 4;

/// Parsed header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub magic: u16,
    pub length: u16,
    pub device_id: u32,
    pub stamp: u32,
    pub checksum: [u8; CHECKSUM_LEN],
}

impl FrameHeader {
    /// Parse the first 32 bytes of a frame. Checksum is not verified.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ProtocolError::MalformedFrame(bytes.len()));
        }

        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&bytes[CHECKSUM_OFFSET..HEADER_LEN]);

        Ok(Self {
            magic: u16::from_be_bytes([bytes[0], bytes[1]]),
            length: u16::from_be_bytes([bytes[2], bytes[3]]),
            device_id: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            stamp: u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            checksum,
        })
    }
}

/// Read the total length field from the start of a frame
pub fn peek_length(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < LENGTH_FIELD_END {
        return Err(ProtocolError::MalformedFrame(bytes.len()));
    }
    Ok(u16::from_be_bytes([bytes[2], bytes[3]]) as usize)
}

/// MD5 over `frame` as if the checksum slot held `token`
fn checksum_with_token(frame: &[u8], token: &Token) -> [u8; CHECKSUM_LEN] {
    Md5::new()
        .chain_update(&frame[..CHECKSUM_OFFSET])
        .chain_update(token.as_bytes())
        .chain_update(&frame[HEADER_LEN..])
        .finalize()
        .into()
}

/// Build a complete wire frame around an already encrypted body
pub fn encode_frame(device_id: u32, stamp: u32, token: &Token, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let total = HEADER_LEN + ciphertext.len();
    if total > MAX_FRAME_LEN {
        return Err(ProtocolError::OversizedPacket(total));
    }

    let mut buf = BytesMut::with_capacity(total);
    buf.put_u16(MAGIC);
    buf.put_u16(total as u16);
    buf.put_u32(0);
    buf.put_u32(device_id);
    buf.put_u32(stamp);
    buf.put_slice(token.as_bytes());
    buf.put_slice(ciphertext);

    let checksum = checksum_with_token(&buf, token);
    buf[CHECKSUM_OFFSET..HEADER_LEN].copy_from_slice(&checksum);

    Ok(buf.to_vec())
}

/// Verify a frame's checksum and return its encrypted body.
///
/// Nothing past the length check runs on a frame shorter than
/// [`MIN_FRAME_LEN`], and nothing is decrypted unless the checksum matches.
pub fn decode_frame<'a>(frame: &'a [u8], token: &Token) -> Result<&'a [u8]> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(ProtocolError::MalformedFrame(frame.len()));
    }

    let transmitted = &frame[CHECKSUM_OFFSET..HEADER_LEN];
    let expected = checksum_with_token(frame, token);

    if transmitted != expected.as_slice() {
        return Err(ProtocolError::ChecksumMismatch {
            expected: hex::encode(expected),
            actual: hex::encode(transmitted),
        });
    }

    let body = &frame[HEADER_LEN..];
    if body.is_empty() {
        return Err(ProtocolError::EmptyResponse);
    }

    Ok(body)
}
