//! Observability and Metrics
//!
//! Per-client counters for handshakes, exchanges and failures.
//!
//! Uses atomic counters so concurrent sends can record without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{ErrorKind, ProtocolError};

/// Metrics collector for one client
#[derive(Debug)]
pub struct Metrics {
    /// Total hello exchanges attempted
    pub handshakes_total: AtomicU64,
    /// Hello exchanges that returned an identity
    pub handshakes_success: AtomicU64,
    /// Hello exchanges that failed
    pub handshakes_failed: AtomicU64,
    /// Request frames written, including those whose exchange later failed
    pub requests_sent: AtomicU64,
    /// Whole response frames read, before verification
    pub responses_received: AtomicU64,
    /// Total bytes written
    pub bytes_sent: AtomicU64,
    /// Total bytes read
    pub bytes_received: AtomicU64,
    /// Transport errors (I/O, timeouts, short writes)
    pub transport_errors: AtomicU64,
    /// Protocol errors (malformed hello or frame)
    pub protocol_errors: AtomicU64,
    /// Checksum mismatches
    pub integrity_errors: AtomicU64,
    /// Padding failures
    pub crypto_errors: AtomicU64,
    /// Empty response bodies
    pub empty_responses: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            handshakes_total: AtomicU64::new(0),
            handshakes_success: AtomicU64::new(0),
            handshakes_failed: AtomicU64::new(0),
            requests_sent: AtomicU64::new(0),
            responses_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            integrity_errors: AtomicU64::new(0),
            crypto_errors: AtomicU64::new(0),
            empty_responses: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a hello attempt
    pub fn handshake_attempt(&self) {
        self.handshakes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handshake_success(&self) {
        self.handshakes_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handshake_failed(&self) {
        self.handshakes_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request frame written to the socket
    pub fn request_sent(&self, len: usize) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Record a whole response frame read from the socket
    pub fn response_received(&self, len: usize) {
        self.responses_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Count a failed send under its error kind
    pub fn record_error(&self, error: &ProtocolError) {
        let counter = match error.kind() {
            ErrorKind::Transport => &self.transport_errors,
            ErrorKind::Protocol => &self.protocol_errors,
            ErrorKind::Integrity => &self.integrity_errors,
            ErrorKind::Crypto => &self.crypto_errors,
            ErrorKind::EmptyResponse => &self.empty_responses,
            // Configuration errors never reach a live client
            ErrorKind::Configuration => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        debug!(kind = ?error.kind(), error = %error, "Send failed");
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            handshakes_total: self.handshakes_total.load(Ordering::Relaxed),
            handshakes_success: self.handshakes_success.load(Ordering::Relaxed),
            handshakes_failed: self.handshakes_failed.load(Ordering::Relaxed),
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            responses_received: self.responses_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            integrity_errors: self.integrity_errors.load(Ordering::Relaxed),
            crypto_errors: self.crypto_errors.load(Ordering::Relaxed),
            empty_responses: self.empty_responses.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            handshakes_total = snapshot.handshakes_total,
            handshakes_success = snapshot.handshakes_success,
            handshakes_failed = snapshot.handshakes_failed,
            requests_sent = snapshot.requests_sent,
            responses_received = snapshot.responses_received,
            bytes_sent = snapshot.bytes_sent,
            bytes_received = snapshot.bytes_received,
            transport_errors = snapshot.transport_errors,
            protocol_errors = snapshot.protocol_errors,
            integrity_errors = snapshot.integrity_errors,
            crypto_errors = snapshot.crypto_errors,
            empty_responses = snapshot.empty_responses,
            uptime_seconds = snapshot.uptime_seconds,
            "Client metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub handshakes_total: u64,
    pub handshakes_success: u64,
    pub handshakes_failed: u64,
    pub requests_sent: u64,
    pub responses_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub transport_errors: u64,
    pub protocol_errors: u64,
    pub integrity_errors: u64,
    pub crypto_errors: u64,
    pub empty_responses: u64,
    pub uptime_seconds: u64,
}
