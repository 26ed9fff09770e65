use std::net::SocketAddr;
use std::time::Duration;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server refused the connection or could not be reached.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// No connection was established within the connect budget.
    #[error("connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: SocketAddr, timeout: Duration },

    /// The configured host is not a loopback address.
    #[error("refusing non-loopback host {0}: the protocol is unauthenticated and loopback-only")]
    NotLoopback(String),

    /// The configured host could not be parsed or resolved.
    #[error("invalid host '{0}'")]
    InvalidHost(String),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
