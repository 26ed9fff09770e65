use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::traits::{Readiness, Socket, SocketState};

const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;
const READ_CHUNK_SIZE: usize = 64 * 1024;
const MIN_WAIT: Duration = Duration::from_millis(1);

/// A TCP connection to the server with an internal receive buffer.
///
/// Incoming bytes are pulled into the buffer by
/// [`Socket::wait_for_ready_read`]; [`Read`] drains the buffer and never
/// blocks. A read on an empty buffer returns `Ok(0)`.
pub struct TcpSocket {
    stream: TcpStream,
    buf: BytesMut,
    state: SocketState,
    peer: SocketAddr,
}

impl TcpSocket {
    /// Connect to `endpoint`, bounded by `timeout`.
    pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        let addr = endpoint.addr();
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|err| {
            match err.kind() {
                ErrorKind::TimedOut | ErrorKind::WouldBlock => {
                    TransportError::ConnectTimeout { addr, timeout }
                }
                _ => TransportError::Connect { addr, source: err },
            }
        })?;
        debug!(%addr, "connected to server");
        Self::from_stream(stream)
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            state: SocketState::Connected,
            peer,
        })
    }

    /// Set the timeout applied to each blocking write.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Address of the connected server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }

    fn mark_closed(&mut self) {
        if self.state == SocketState::Connected {
            debug!(peer = %self.peer, "connection closed by peer");
        }
        self.state = SocketState::Unconnected;
    }

    /// Pull whatever the kernel already holds into the buffer without blocking.
    fn drain_nonblocking(&mut self) -> std::io::Result<()> {
        self.stream.set_nonblocking(true)?;
        let result = loop {
            let start = self.buf.len();
            self.buf.resize(start + READ_CHUNK_SIZE, 0);
            match self.stream.read(&mut self.buf[start..]) {
                Ok(0) => {
                    self.buf.truncate(start);
                    self.mark_closed();
                    break Ok(());
                }
                Ok(n) => self.buf.truncate(start + n),
                Err(err) if err.kind() == ErrorKind::Interrupted => self.buf.truncate(start),
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    self.buf.truncate(start);
                    break Ok(());
                }
                Err(err) => {
                    self.buf.truncate(start);
                    self.mark_closed();
                    break Err(err);
                }
            }
        };
        self.stream.set_nonblocking(false)?;
        result
    }
}

impl Read for TcpSocket {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let n = out.len().min(self.buf.len());
        out[..n].copy_from_slice(&self.buf[..n]);
        self.buf.advance(n);
        Ok(n)
    }
}

impl Write for TcpSocket {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        match self.stream.write(data) {
            Ok(n) => Ok(n),
            Err(err) => {
                if matches!(
                    err.kind(),
                    ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
                ) {
                    self.mark_closed();
                }
                Err(err)
            }
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

impl Socket for TcpSocket {
    fn bytes_available(&self) -> usize {
        self.buf.len()
    }

    fn wait_for_ready_read(&mut self, timeout: Duration) -> std::io::Result<Readiness> {
        if self.state == SocketState::Unconnected {
            return Ok(Readiness::Closed);
        }
        self.stream.set_read_timeout(Some(timeout.max(MIN_WAIT)))?;

        loop {
            let start = self.buf.len();
            self.buf.resize(start + READ_CHUNK_SIZE, 0);
            let result = self.stream.read(&mut self.buf[start..]);
            match result {
                Ok(0) => {
                    self.buf.truncate(start);
                    self.mark_closed();
                    return Ok(Readiness::Closed);
                }
                Ok(n) => {
                    self.buf.truncate(start + n);
                    trace!(received = n, buffered = self.buf.len(), "socket ready");
                    return Ok(Readiness::Ready);
                }
                Err(err) => {
                    self.buf.truncate(start);
                    match err.kind() {
                        ErrorKind::Interrupted => continue,
                        ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                            return Ok(Readiness::TimedOut)
                        }
                        _ => {
                            self.mark_closed();
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    #[cfg(target_os = "linux")]
    fn bytes_to_write(&self) -> usize {
        use std::os::fd::AsRawFd;

        let mut pending: libc::c_int = 0;
        // SAFETY: `pending` is a valid writable c_int and the descriptor is an open
        // TCP socket owned by this struct. TIOCOUTQ (SIOCOUTQ) only writes one c_int.
        let rc = unsafe {
            libc::ioctl(
                self.stream.as_raw_fd(),
                libc::TIOCOUTQ,
                &mut pending as *mut libc::c_int,
            )
        };
        if rc == 0 {
            pending.max(0) as usize
        } else {
            0
        }
    }

    /// Unsent-byte accounting is unavailable off Linux; writes are treated as
    /// consumed once the kernel accepts them.
    #[cfg(not(target_os = "linux"))]
    fn bytes_to_write(&self) -> usize {
        0
    }

    fn state(&mut self) -> SocketState {
        if self.state == SocketState::Connected {
            let _ = self.drain_nonblocking();
        }
        self.state
    }

    fn error_string(&self) -> Option<String> {
        match self.stream.take_error() {
            Ok(Some(err)) => Some(err.to_string()),
            Ok(None) => None,
            Err(err) => Some(err.to_string()),
        }
    }
}

impl std::fmt::Debug for TcpSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpSocket")
            .field("peer", &self.peer)
            .field("buffered", &self.buf.len())
            .field("state", &self.state)
            .finish()
    }
}
