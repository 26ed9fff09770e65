use std::io::{Read, Write};
use std::time::Duration;

/// Outcome of waiting for incoming bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// New bytes were buffered and can be read without blocking.
    Ready,
    /// Nothing arrived within the timeout.
    TimedOut,
    /// The peer closed its side of the connection.
    Closed,
}

/// Connection state as last observed on the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Connected,
    Unconnected,
}

/// A connected protocol stream.
///
/// `read` only ever returns bytes that are already buffered (see
/// [`Socket::bytes_available`]); callers wait for more with
/// [`Socket::wait_for_ready_read`]. Writes go straight to the stream.
pub trait Socket: Read + Write {
    /// Bytes buffered and readable without blocking.
    fn bytes_available(&self) -> usize;

    /// Block until more bytes arrive, the peer closes, or `timeout` elapses.
    fn wait_for_ready_read(&mut self, timeout: Duration) -> std::io::Result<Readiness>;

    /// Written bytes the peer has not consumed yet.
    fn bytes_to_write(&self) -> usize;

    /// Probe and return the connection state.
    fn state(&mut self) -> SocketState;

    /// Pending socket-level error, if any.
    fn error_string(&self) -> Option<String>;
}

impl<S: Socket + ?Sized> Socket for &mut S {
    fn bytes_available(&self) -> usize {
        (**self).bytes_available()
    }

    fn wait_for_ready_read(&mut self, timeout: Duration) -> std::io::Result<Readiness> {
        (**self).wait_for_ready_read(timeout)
    }

    fn bytes_to_write(&self) -> usize {
        (**self).bytes_to_write()
    }

    fn state(&mut self) -> SocketState {
        (**self).state()
    }

    fn error_string(&self) -> Option<String> {
        (**self).error_string()
    }
}
