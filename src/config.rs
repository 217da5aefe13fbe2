//! # Configuration Management
//!
//! Centralized configuration for the MIIO client.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults and builder setters
//! - Environment overrides via `from_env()`
//!
//! ## Security Considerations
//! - The token is validated before a client is built and never logged
//! - Timeouts bound every socket operation of a send, so a silent device
//!   cannot hang a caller

use crate::core::token::{Token, TOKEN_HEX_LEN};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::exchange::DEFAULT_CHUNK_SIZE;
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Default device address, a private-network placeholder
pub const DEFAULT_ADDRESS: &str = "192.168.1.1";

/// Default MIIO UDP port
pub const DEFAULT_PORT: u16 = 54321;

/// Placeholder token written into the example configuration
pub const EXAMPLE_TOKEN: &str = "0123456789abcdef0123456789abcdef";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MiioConfig {
    /// Client-specific configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MiioConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_OPEN))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_PARSE)))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.client.apply_env()?;
        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    ///
    /// The token is a placeholder so the example validates as written.
    pub fn example_config() -> String {
        let example = Self::default_with_overrides(|config| {
            config.client.token = String::from(EXAMPLE_TOKEN);
        });
        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_WRITE))
        })?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.client.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        strict(self.validate())
    }
}

fn strict(errors: Vec<String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ProtocolError::ConfigError(format!(
            "Configuration validation failed:\n  - {}",
            errors.join("\n  - ")
        )))
    }
}

/// How a client manages its socket between sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Dial, greet and close for every send
    #[default]
    PerCall,
    /// Dial and greet once on `connect`, then reuse the socket and stamp
    Persistent,
}

impl std::str::FromStr for SessionMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_call" | "per-call" => Ok(Self::PerCall),
            "persistent" => Ok(Self::Persistent),
            other => Err(ProtocolError::ConfigError(format!(
                "Unknown session mode: '{other}' (expected 'per_call' or 'persistent')"
            ))),
        }
    }
}

/// Client-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Device host name or IP address
    pub address: String,

    /// Device UDP port
    pub port: u16,

    /// Deadline for a whole send, from dial to decoded response
    #[serde(with = "duration_serde")]
    pub send_timeout: Duration,

    /// Device token as 32 hex characters
    pub token: String,

    /// Socket lifecycle strategy
    pub session_mode: SessionMode,

    /// Initial buffer reservation for a reassembled response. Reads always
    /// accept a whole datagram regardless of this value.
    pub recv_chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: String::from(DEFAULT_ADDRESS),
            port: DEFAULT_PORT,
            send_timeout: timeout::DEFAULT_TIMEOUT,
            token: String::new(),
            session_mode: SessionMode::PerCall,
            recv_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    /// Default configuration for the given token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Set the destination address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the destination port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the send deadline
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Set the session strategy
    pub fn with_session_mode(mut self, session_mode: SessionMode) -> Self {
        self.session_mode = session_mode;
        self
    }

    /// Set the receive chunk size
    pub fn with_recv_chunk_size(mut self, recv_chunk_size: usize) -> Self {
        self.recv_chunk_size = recv_chunk_size;
        self
    }

    /// Parse the configured token
    pub fn parse_token(&self) -> Result<Token> {
        Token::from_hex(&self.token)
    }

    /// Override fields from `MIIO_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(address) = std::env::var("MIIO_IP") {
            self.address = address;
        }

        if let Ok(token) = std::env::var("MIIO_TOKEN") {
            self.token = token;
        }

        if let Ok(port) = std::env::var("MIIO_PORT") {
            self.port = port
                .parse::<u16>()
                .map_err(|e| ProtocolError::ConfigError(format!("Invalid MIIO_PORT '{port}': {e}")))?;
        }

        if let Ok(timeout) = std::env::var("MIIO_SEND_TIMEOUT_MS") {
            let millis = timeout.parse::<u64>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid MIIO_SEND_TIMEOUT_MS '{timeout}': {e}"))
            })?;
            self.send_timeout = Duration::from_millis(millis);
        }

        if let Ok(mode) = std::env::var("MIIO_SESSION_MODE") {
            self.session_mode = mode.parse()?;
        }

        Ok(())
    }

    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.trim().is_empty() {
            errors.push("Device address cannot be empty".to_string());
        }

        if self.port == 0 {
            errors.push("Device port must be greater than 0".to_string());
        }

        if self.send_timeout.as_millis() < 10 {
            errors.push("Send timeout too short (minimum: 10ms)".to_string());
        } else if self.send_timeout.as_secs() > 300 {
            errors.push("Send timeout too long (maximum: 300s)".to_string());
        }

        if self.token.is_empty() {
            errors.push("Token is required".to_string());
        } else if self.token.len() != TOKEN_HEX_LEN {
            errors.push(format!(
                "Token must be {TOKEN_HEX_LEN} hex characters, got {}",
                self.token.len()
            ));
        } else if !self.token.chars().all(|c| c.is_ascii_hexdigit()) {
            errors.push("Token must contain only hex characters".to_string());
        }

        if self.recv_chunk_size < 32 {
            errors.push("Receive chunk size too small (minimum: 32 bytes)".to_string());
        } else if self.recv_chunk_size > u16::MAX as usize {
            errors.push(format!(
                "Receive chunk size too large: {} (maximum: 65535)",
                self.recv_chunk_size
            ));
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        strict(self.validate())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to include event targets
    pub log_targets: bool,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("miio-protocol"),
            log_level: Level::INFO,
            log_targets: true,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
