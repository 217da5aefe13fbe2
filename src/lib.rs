//! # MIIO Protocol
//!
//! Async client for MIIO, the binary UDP control protocol spoken by networked
//! appliances. A single 16-byte device token both encrypts every request and
//! authenticates every frame.
//!
//! ## Layers
//!
//! - [`core`]: wire frame codec and the token type
//! - [`utils::crypto`]: AES-128-CBC with token-derived key and IV
//! - [`protocol`]: hello handshake and the request/response exchange
//! - [`transport`]: datagram capability and its UDP implementation
//! - [`service`]: [`MiioClient`] and the [`Transceiver`] capability
//! - [`config`], [`error`]: configuration and the error taxonomy
//!
//! ```text
//! payload -> pad + encrypt -> frame + checksum -> UDP
//! UDP (one or more reads) -> verify checksum -> decrypt + unpad -> payload
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use miio_protocol::{ClientConfig, MiioClient};
//!
//! # async fn run() -> miio_protocol::Result<()> {
//! let config = ClientConfig::new("0123456789abcdef0123456789abcdef")
//!     .with_address("192.168.1.50");
//! let client = MiioClient::new(config)?;
//!
//! let response = client
//!     .send(br#"{"id": 1, "method": "miIO.info", "params": []}"#)
//!     .await?;
//! println!("{}", String::from_utf8_lossy(&response));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::config::{ClientConfig, LoggingConfig, MiioConfig, SessionMode};
pub use crate::core::frame::{decode_frame, encode_frame, FrameHeader};
pub use crate::core::token::Token;
pub use crate::error::{ErrorKind, ProtocolError, Result};
pub use crate::protocol::handshake::DeviceIdentity;
pub use crate::service::{MiioClient, Transceiver};
