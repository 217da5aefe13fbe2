//! # Client Service
//!
//! [`MiioClient`] is the public entry point. Command layers should depend on
//! the [`Transceiver`] capability instead of the concrete client so they can be
//! tested against a fake that never touches a socket.

use async_trait::async_trait;

use crate::error::Result;

pub mod client;

pub use client::MiioClient;

/// Send an opaque payload to a device and get its opaque response back
#[async_trait]
pub trait Transceiver: Send + Sync {
    async fn send(&self, payload: &[u8]) -> Result<Vec<u8>>;
}
