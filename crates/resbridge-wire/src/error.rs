use std::fmt;
use std::time::Duration;

/// Exchange step during which a wait ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Header,
    Catalog,
    Chunk,
    Delivery,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Request => "request write",
            Phase::Header => "response header",
            Phase::Catalog => "catalog body",
            Phase::Chunk => "payload chunk",
            Phase::Delivery => "upload delivery",
        };
        f.write_str(name)
    }
}

/// Errors raised while framing or moving protocol bytes.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A wait exceeded its budget.
    #[error("timed out waiting for {phase} after {after:?}")]
    Timeout { phase: Phase, after: Duration },

    /// The peer closed before the expected bytes arrived.
    #[error("connection closed after {received} of {expected} bytes")]
    ConnectionClosed { received: usize, expected: usize },

    /// The stream accepted zero bytes.
    #[error("zero-length write ({remaining} bytes outstanding)")]
    ZeroWrite { remaining: usize },

    /// An I/O error occurred on the socket.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket reported an error after a write.
    #[error("socket error: {0}")]
    Socket(String),

    /// The server dropped the connection with upload bytes still unsent.
    #[error("server rejected transfer ({unsent} bytes never consumed)")]
    Rejected { unsent: usize },

    /// The host asked to stop.
    #[error("cancelled by host")]
    Cancelled,

    /// A request token cannot be encoded.
    #[error("invalid request token {token:?}: {reason}")]
    InvalidToken { token: String, reason: &'static str },

    /// Incoming bytes do not match the expected layout.
    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, WireError>;
