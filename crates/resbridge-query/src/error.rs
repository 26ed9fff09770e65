use std::fmt;

use resbridge_transport::TransportError;
use resbridge_wire::WireError;
use serde::Serialize;

/// Coarse failure class reported to hosts and mapped to exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connect refused or timed out.
    Connection,
    /// Header or chunk wait exceeded its budget.
    Timeout,
    /// Short read or write, dropped connection, or socket error.
    Io,
    /// Declared shape inconsistent with the bytes on the wire.
    Shape,
    /// Upload bytes left unsent after the server stopped accepting.
    RejectedTransfer,
    /// The host asked to stop.
    Cancelled,
    /// Caller-supplied argument or configuration is unusable.
    InvalidArgument,
    /// The server answered with zero elements where data is required.
    NoData,
    /// Library misuse, such as reusing a finished connection.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Connection => "connection error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Io => "I/O error",
            ErrorKind::Shape => "shape error",
            ErrorKind::RejectedTransfer => "rejected transfer",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NoData => "no data",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while running a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Wire-level error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// A query argument was rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The response does not describe the expected array or records.
    #[error("shape mismatch for {command}: {detail}")]
    Shape {
        command: &'static str,
        detail: String,
    },

    /// Zero elements were declared for a command that requires data.
    #[error("{command} returned no data: {reason}")]
    NoData {
        command: &'static str,
        reason: &'static str,
    },

    /// An exchange was driven through an illegal transition.
    #[error("invalid exchange transition from {from} to {to}")]
    InvalidState { from: String, to: String },

    /// The background task running a blocking exchange failed.
    #[cfg(feature = "async")]
    #[error("background exchange failed: {0}")]
    Join(String),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Transport(err) => match err {
                TransportError::Connect { .. } | TransportError::ConnectTimeout { .. } => {
                    ErrorKind::Connection
                }
                TransportError::NotLoopback(_) | TransportError::InvalidHost(_) => {
                    ErrorKind::InvalidArgument
                }
                TransportError::Io(_) => ErrorKind::Io,
            },
            QueryError::Wire(err) => match err {
                WireError::Timeout { .. } => ErrorKind::Timeout,
                WireError::ConnectionClosed { .. }
                | WireError::ZeroWrite { .. }
                | WireError::Io(_)
                | WireError::Socket(_) => ErrorKind::Io,
                WireError::Rejected { .. } => ErrorKind::RejectedTransfer,
                WireError::Cancelled => ErrorKind::Cancelled,
                WireError::InvalidToken { .. } => ErrorKind::InvalidArgument,
                WireError::Malformed(_) => ErrorKind::Shape,
            },
            QueryError::InvalidArgument(_) | QueryError::InvalidConfig(_) => {
                ErrorKind::InvalidArgument
            }
            QueryError::Shape { .. } => ErrorKind::Shape,
            QueryError::NoData { .. } => ErrorKind::NoData,
            QueryError::InvalidState { .. } => ErrorKind::Internal,
            #[cfg(feature = "async")]
            QueryError::Join(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn shape(command: &'static str, detail: impl Into<String>) -> Self {
        QueryError::Shape {
            command,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
