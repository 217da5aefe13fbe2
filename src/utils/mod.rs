//! # Utility Modules
//!
//! Supporting utilities for cryptography, logging, metrics and deadlines.
//!
//! ## Components
//! - **Crypto**: AES-128-CBC cipher engine with token-derived key material
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe per-client counters
//! - **Timeout**: Absolute-deadline wrappers for socket futures
//!
//! ## Security
//! - Key and IV are zeroed when the cipher is dropped
//! - Every padding failure surfaces as a single error variant

pub mod crypto;
pub mod logging;
pub mod metrics;
pub mod timeout;

pub use crypto::Cipher;
pub use metrics::{Metrics, MetricsSnapshot};
