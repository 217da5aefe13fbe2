//! Device token
//!
//! The 16-byte secret bound to a device. It is the only key material in the
//! protocol: it seeds the cipher and fills the checksum slot while frames are
//! hashed.

use std::fmt;
use std::str::FromStr;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{constants, ProtocolError, Result};

/// Raw token length in bytes
pub const TOKEN_LEN: usize = 16;

/// Length of the hex form of a token
pub const TOKEN_HEX_LEN: usize = TOKEN_LEN * 2;

/// A validated device token. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Token([u8; TOKEN_LEN]);

impl Token {
    /// Build a token from raw bytes
    pub fn from_bytes(bytes: [u8; TOKEN_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a token from its 32-character hex form
    pub fn from_hex(hex_token: &str) -> Result<Self> {
        if hex_token.len() != TOKEN_HEX_LEN {
            return Err(ProtocolError::InvalidToken(format!(
                "{}, got {}",
                constants::ERR_TOKEN_LENGTH,
                hex_token.len()
            )));
        }

        let mut bytes = [0u8; TOKEN_LEN];
        hex::decode_to_slice(hex_token, &mut bytes).map_err(|e| {
            ProtocolError::InvalidToken(format!("{}: {e}", constants::ERR_TOKEN_HEX))
        })?;

        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; TOKEN_LEN] {
        &self.0
    }
}

impl FromStr for Token {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

// Never print the secret
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}
