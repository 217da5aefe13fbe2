//! # Protocol Steps
//!
//! The two exchanges a request is made of:
//!
//! - **Handshake**: fixed hello datagram, reply carries device id and stamp
//! - **Exchange**: encrypted request frame out, chunked response frame back
//!
//! Both are generic over [`crate::transport::Datagram`] and hold no state of
//! their own; the client decides when to run them and what to cache.

pub mod exchange;
pub mod handshake;

#[cfg(test)]
mod tests;
