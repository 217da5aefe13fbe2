//! Deadline helpers
//!
//! A `send` gets one absolute deadline when it starts. Every socket operation
//! inside it is bounded by that same instant rather than by a fresh timeout,
//! so the handshake, the write and the whole chunked read share one budget.

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::error::{ProtocolError, Result};

/// Default send timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline `budget` from now
pub fn deadline_after(budget: Duration) -> Instant {
    Instant::now() + budget
}

/// Run `fut` until `deadline`; expiry becomes [`ProtocolError::Timeout`]
pub async fn with_deadline<F, T, E>(fut: F, deadline: Instant) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<ProtocolError>,
{
    match timeout_at(deadline, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(ProtocolError::Timeout),
    }
}
