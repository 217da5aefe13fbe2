//! # Core Protocol Components
//!
//! Wire frame layout and the device token.
//!
//! ## Components
//! - **Frame**: MIIO frame encoding, decoding and checksum verification
//! - **Token**: validated 16-byte device secret
//!
//! ## Wire Format
//! ```text
//! [Magic(2)] [Length(2)] [Reserved(4)] [DeviceId(4)] [Stamp(4)] [Checksum(16)] [Body(N)]
//! ```
//!
//! ## Security
//! - The checksum is keyed by the token and covers every byte of the frame
//! - Short frames are rejected before any hashing or decryption

pub mod frame;
pub mod token;
