//! # Error Types
//!
//! Error handling for the MIIO client.
//!
//! Every failure a `send` can produce is a variant of [`ProtocolError`]. None of
//! them are recovered internally: the caller owns retry and backoff policy.
//!
//! ## Error Categories
//! - **Configuration**: malformed or wrong-length token, invalid settings
//! - **Transport**: dial/write/read failures, deadline expiry, partial writes
//! - **Protocol**: hello replies or response frames with the wrong size
//! - **Integrity**: checksum mismatch (wrong token, corrupted or forged datagram)
//! - **Crypto**: invalid padding after decryption
//! - **Empty response**: a response with nothing inside it
//!
//! [`ProtocolError::kind`] maps each variant onto these categories.
//!
//! ## Example Usage
//! ```rust
//! use miio_protocol::error::{ErrorKind, ProtocolError};
//! use miio_protocol::Token;
//!
//! let err = "not-a-token".parse::<Token>().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Configuration);
//! assert!(matches!(err, ProtocolError::InvalidToken(_)));
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants shared by several error paths.
pub mod constants {
    /// Token validation errors
    pub const ERR_TOKEN_LENGTH: &str = "token must be 32 hex characters";
    pub const ERR_TOKEN_HEX: &str = "token is not valid hex";

    /// Config loading errors
    pub const ERR_CONFIG_OPEN: &str = "Failed to open config file";
    pub const ERR_CONFIG_PARSE: &str = "Failed to parse TOML";
    pub const ERR_CONFIG_WRITE: &str = "Failed to write config file";

    /// Logging setup errors
    pub const ERR_LOGGING_FILTER: &str = "Invalid log filter";
    pub const ERR_LOGGING_INIT: &str = "Global tracing subscriber already installed";

    /// Address resolution errors
    pub const ERR_ADDRESS_UNRESOLVED: &str = "Address did not resolve to any socket address";
}

/// High-level category of a [`ProtocolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Fails client construction.
    Configuration,
    /// Socket dial, read or write failure, including deadline expiry.
    Transport,
    /// Non-conforming device or garbled datagram.
    Protocol,
    /// Checksum mismatch.
    Integrity,
    /// Padding or block alignment failure around the cipher.
    Crypto,
    /// Response body was empty.
    EmptyResponse,
}

// ProtocolError is the single error type for all client operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Short write: expected to write {expected} bytes but wrote {written}")]
    ShortWrite { expected: usize, written: usize },

    #[error("Client is not connected")]
    NotConnected,

    #[error("Malformed hello reply: expected 32 bytes but got {0}")]
    MalformedHello(usize),

    #[error("Malformed frame: expected at least 33 bytes but got {0}")]
    MalformedFrame(usize),

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Checksum mismatch: expected {expected} got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Invalid padding on input")]
    InvalidPadding,

    #[error("Payload cannot be empty")]
    EmptyPayload,

    #[error("Empty response body")]
    EmptyResponse,
}

impl ProtocolError {
    /// Category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidToken(_) | Self::ConfigError(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::Timeout | Self::ShortWrite { .. } | Self::NotConnected => {
                ErrorKind::Transport
            }
            Self::MalformedHello(_) | Self::MalformedFrame(_) | Self::OversizedPacket(_) => {
                ErrorKind::Protocol
            }
            Self::ChecksumMismatch { .. } => ErrorKind::Integrity,
            Self::InvalidPadding | Self::EmptyPayload => ErrorKind::Crypto,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
