use std::fmt;
use std::io;

use resbridge_query::{ErrorKind, QueryError};

// Process exit codes; timeouts and cancellation follow shell conventions.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const CONNECTION_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const CANCELLED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn kind_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Connection => CONNECTION_ERROR,
        ErrorKind::Timeout => TIMEOUT,
        ErrorKind::Io | ErrorKind::RejectedTransfer => FAILURE,
        ErrorKind::Shape | ErrorKind::NoData => DATA_INVALID,
        ErrorKind::Cancelled => CANCELLED,
        ErrorKind::InvalidArgument => USAGE,
        ErrorKind::Internal => INTERNAL,
    }
}

pub fn query_error(context: &str, err: QueryError) -> CliError {
    CliError::new(kind_code(err.kind()), format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use resbridge_wire::{Phase, WireError};

    use super::*;

    #[test]
    fn timeouts_exit_124() {
        let err = QueryError::Wire(WireError::Timeout {
            phase: Phase::Header,
            after: Duration::from_secs(60),
        });
        assert_eq!(query_error("GetCases", err).code, TIMEOUT);
    }

    #[test]
    fn cancellation_exits_130() {
        let err = QueryError::Wire(WireError::Cancelled);
        assert_eq!(query_error("GetGridProperty", err).code, CANCELLED);
    }

    #[test]
    fn missing_values_file_is_usage() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(io_error("values", err).code, USAGE);
    }
}
