use std::time::Duration;

use resbridge_transport::{Endpoint, DEFAULT_PORT};
use resbridge_wire::{WireConfig, DEFAULT_MAX_BLOCK_VALUE_COUNT};

use crate::error::{QueryError, Result};

/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "RESBRIDGE_PORT";
/// Environment variable overriding the server host.
pub const HOST_ENV: &str = "RESBRIDGE_HOST";

/// Connection target, timeout budgets and chunk bound for a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Loopback host, as an IP literal or `localhost`.
    pub host: String,
    pub port: u16,
    /// Budget for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Budget for the complete response header.
    pub header_timeout: Duration,
    /// Budget for each payload chunk.
    pub chunk_timeout: Duration,
    /// Longest single wait before cancellation is polled again.
    pub poll_interval: Duration,
    /// Values per chunk in both directions.
    pub max_block_value_count: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            header_timeout: Duration::from_secs(60),
            chunk_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            max_block_value_count: DEFAULT_MAX_BLOCK_VALUE_COUNT,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `RESBRIDGE_HOST` and `RESBRIDGE_PORT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV).filter(|p| !p.trim().is_empty()) {
            config.port = port.trim().parse().map_err(|_| {
                QueryError::InvalidConfig(format!("{PORT_ENV}={port:?} is not a port number"))
            })?;
        }
        Ok(config)
    }

    /// Check the configuration and resolve the endpoint.
    pub fn validate(&self) -> Result<Endpoint> {
        let endpoint = Endpoint::parse(&self.host, self.port)?;
        if self.port == 0 {
            return Err(QueryError::InvalidConfig("port must be non-zero".into()));
        }
        for (name, value) in [
            ("connect timeout", self.connect_timeout),
            ("header timeout", self.header_timeout),
            ("chunk timeout", self.chunk_timeout),
            ("poll interval", self.poll_interval),
        ] {
            if value.is_zero() {
                return Err(QueryError::InvalidConfig(format!("{name} must be non-zero")));
            }
        }
        if self.max_block_value_count == 0 {
            return Err(QueryError::InvalidConfig(
                "max block value count must be non-zero".into(),
            ));
        }
        Ok(endpoint)
    }

    /// Wire-level view of the timeouts and chunk bound.
    pub fn wire(&self) -> WireConfig {
        WireConfig {
            header_timeout: self.header_timeout,
            chunk_timeout: self.chunk_timeout,
            poll_interval: self.poll_interval,
            max_block_value_count: self.max_block_value_count,
        }
    }
}
