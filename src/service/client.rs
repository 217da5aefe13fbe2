//! MIIO client
//!
//! Each `send` runs through the same steps:
//!
//! ```text
//! Idle -> Dialing -> Handshaking -> Sending -> Receiving -> Decoding -> Done
//! ```
//!
//! and any failure is returned as is. Nothing is retried.
//!
//! In [`SessionMode::PerCall`] every send dials its own socket, greets the
//! device and drops the socket on return, so concurrent sends share nothing.
//! In [`SessionMode::Persistent`] `connect` dials and greets once; sends then
//! take a single lock around the stamp increment and the whole write/read
//! pair, since one UDP socket cannot carry interleaved exchanges.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, instrument};

use crate::config::{ClientConfig, SessionMode};
use crate::core::token::Token;
use crate::error::{ProtocolError, Result};
use crate::protocol::exchange::{self, ExchangeLimits, Exchanged};
use crate::protocol::handshake::{self, DeviceIdentity};
use crate::service::Transceiver;
use crate::transport::UdpTransport;
use crate::utils::crypto::Cipher;
use crate::utils::metrics::Metrics;
use crate::utils::timeout::{deadline_after, with_deadline};

/// Socket and identity cached by a persistent client
#[derive(Debug)]
struct Session {
    transport: UdpTransport,
    identity: DeviceIdentity,
}

/// Client for one device
pub struct MiioClient {
    config: ClientConfig,
    token: Token,
    cipher: Cipher,
    session: Mutex<Option<Session>>,
    metrics: Arc<Metrics>,
}

impl MiioClient {
    /// Validate `config` and derive the session key material
    pub fn new(config: ClientConfig) -> Result<Self> {
        let token = config.parse_token()?;
        config.validate_strict()?;

        let cipher = Cipher::new(&token);
        debug!(
            address = %config.address,
            port = config.port,
            mode = ?config.session_mode,
            "Client created"
        );

        Ok(Self {
            config,
            token,
            cipher,
            session: Mutex::new(None),
            metrics: Arc::new(Metrics::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Counters for this client
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Whether a persistent session is open. Always `false` in per-call mode.
    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Dial the device and run the hello exchange once.
    ///
    /// A no-op in per-call mode or when already connected.
    #[instrument(skip(self), fields(address = %self.config.address, port = self.config.port))]
    pub async fn connect(&self) -> Result<()> {
        if self.config.session_mode == SessionMode::PerCall {
            return Ok(());
        }

        let mut session = self.session.lock().await;
        if session.is_some() {
            return Ok(());
        }

        let deadline = deadline_after(self.config.send_timeout);
        let (transport, identity) = self.open(deadline).await?;

        info!(device_id = identity.device_id, "Connected to device");
        *session = Some(Session {
            transport,
            identity,
        });
        Ok(())
    }

    /// Drop the persistent socket, if any
    pub async fn close(&self) -> Result<()> {
        if let Some(session) = self.session.lock().await.take() {
            info!(device_id = session.identity.device_id, "Closed device session");
        }
        Ok(())
    }

    /// Send `payload` and return the device's response payload
    #[instrument(skip(self, payload), fields(len = payload.len()), level = "debug")]
    pub async fn send(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let result = match self.config.session_mode {
            SessionMode::PerCall => self.send_per_call(payload).await,
            SessionMode::Persistent => self.send_persistent(payload).await,
        };

        match result {
            Ok(exchanged) => Ok(exchanged.payload),
            Err(e) => {
                self.metrics.record_error(&e);
                Err(e)
            }
        }
    }

    async fn send_per_call(&self, payload: &[u8]) -> Result<Exchanged> {
        let deadline = deadline_after(self.config.send_timeout);
        let (transport, mut identity) = self.open(deadline).await?;
        identity.advance();

        self.exchange(&transport, identity, payload, deadline).await
    }

    async fn send_persistent(&self, payload: &[u8]) -> Result<Exchanged> {
        let deadline = deadline_after(self.config.send_timeout);

        // Waiting behind another send spends this send's budget too
        let mut guard = timeout_at(deadline, self.session.lock())
            .await
            .map_err(|_| ProtocolError::Timeout)?;
        let session = guard.as_mut().ok_or(ProtocolError::NotConnected)?;
        session.identity.advance();

        self.exchange(&session.transport, session.identity, payload, deadline)
            .await
    }

    /// Dial and greet, bounded by `deadline`
    async fn open(&self, deadline: Instant) -> Result<(UdpTransport, DeviceIdentity)> {
        let transport = with_deadline(
            UdpTransport::dial(&self.config.address, self.config.port),
            deadline,
        )
        .await?;

        self.metrics.handshake_attempt();
        match handshake::hello(&transport, deadline).await {
            Ok(identity) => {
                self.metrics.handshake_success();
                Ok((transport, identity))
            }
            Err(e) => {
                self.metrics.handshake_failed();
                Err(e)
            }
        }
    }

    async fn exchange(
        &self,
        transport: &UdpTransport,
        identity: DeviceIdentity,
        payload: &[u8],
        deadline: Instant,
    ) -> Result<Exchanged> {
        let limits = ExchangeLimits {
            deadline,
            chunk_size: self.config.recv_chunk_size,
        };
        exchange::round_trip(
            transport,
            &self.cipher,
            &self.token,
            identity,
            payload,
            limits,
            &self.metrics,
        )
        .await
    }
}

#[async_trait]
impl Transceiver for MiioClient {
    async fn send(&self, payload: &[u8]) -> Result<Vec<u8>> {
        MiioClient::send(self, payload).await
    }
}

impl std::fmt::Debug for MiioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiioClient")
            .field("address", &self.config.address)
            .field("port", &self.config.port)
            .field("session_mode", &self.config.session_mode)
            .finish_non_exhaustive()
    }
}
