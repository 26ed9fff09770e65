use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use resbridge_transport::{Socket, SocketState};
use tracing::{debug, trace, warn};

use crate::cancel::Cancellation;
use crate::codec::{ElementKind, WireConfig};
use crate::error::{Phase, Result, WireError};
use crate::reader::wait_for_bytes;
use crate::writer::{flush, write_error};

const DELIVERY_POLL: Duration = Duration::from_millis(5);

/// Payload buffer and the direction it moves in.
#[derive(Debug)]
pub enum Block<'a> {
    /// Upload these bytes.
    Send(&'a [u8]),
    /// Fill this buffer from the socket.
    Receive(&'a mut [u8]),
}

impl Block<'_> {
    pub fn len(&self) -> usize {
        match self {
            Block::Send(src) => src.len(),
            Block::Receive(dst) => dst.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn direction(&self) -> Direction {
        match self {
            Block::Send(_) => Direction::Send,
            Block::Receive(_) => Direction::Receive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
}

/// Accounting for one completed transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub bytes: usize,
    pub chunks: usize,
    pub last_chunk: usize,
}

impl TransferStats {
    fn record(&mut self, n: usize) {
        self.bytes += n;
        self.chunks += 1;
        self.last_chunk = n;
    }
}

/// Move a whole payload in chunks of at most
/// `max_block_value_count × element.size()` bytes.
///
/// Cancellation is polled after every chunk. The call succeeds only when
/// exactly `block.len()` bytes moved.
pub fn transfer<S, C>(
    socket: &mut S,
    block: Block<'_>,
    element: ElementKind,
    config: &WireConfig,
    cancel: &C,
) -> Result<TransferStats>
where
    S: Socket + ?Sized,
    C: Cancellation + ?Sized,
{
    let bound = config.chunk_bytes(element);
    let direction = block.direction();
    let total = block.len();
    let stats = match block {
        Block::Send(src) => send_chunks(socket, src, bound, config, cancel)?,
        Block::Receive(dst) => receive_chunks(socket, dst, bound, config, cancel)?,
    };
    debug!(
        ?direction,
        bytes = stats.bytes,
        chunks = stats.chunks,
        last_chunk = stats.last_chunk,
        "block transfer complete"
    );
    debug_assert_eq!(stats.bytes, total);
    Ok(stats)
}

fn receive_chunks<S, C>(
    socket: &mut S,
    dst: &mut [u8],
    bound: usize,
    config: &WireConfig,
    cancel: &C,
) -> Result<TransferStats>
where
    S: Socket + ?Sized,
    C: Cancellation + ?Sized,
{
    let total = dst.len();
    let mut stats = TransferStats::default();
    while stats.bytes < total {
        if socket.bytes_available() > 0 {
            let want = (total - stats.bytes).min(bound);
            let n = match socket.read(&mut dst[stats.bytes..stats.bytes + want]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };
            stats.record(n);
            trace!(chunk = n, received = stats.bytes, total, "payload chunk received");
        } else {
            wait_for_bytes(
                socket,
                1,
                config.chunk_timeout,
                config.poll_interval,
                Phase::Chunk,
                cancel,
            )
            .map_err(|err| match err {
                WireError::ConnectionClosed { .. } => WireError::ConnectionClosed {
                    received: stats.bytes,
                    expected: total,
                },
                other => other,
            })?;
        }
        cancel.checkpoint()?;
    }
    Ok(stats)
}

fn send_chunks<S, C>(
    socket: &mut S,
    src: &[u8],
    bound: usize,
    config: &WireConfig,
    cancel: &C,
) -> Result<TransferStats>
where
    S: Socket + ?Sized,
    C: Cancellation + ?Sized,
{
    let total = src.len();
    let mut stats = TransferStats::default();
    while stats.bytes < total {
        let want = (total - stats.bytes).min(bound);
        match socket.write(&src[stats.bytes..stats.bytes + want]) {
            Ok(0) => {
                return Err(WireError::ZeroWrite {
                    remaining: total - stats.bytes,
                })
            }
            Ok(n) => {
                stats.record(n);
                trace!(chunk = n, sent = stats.bytes, total, "payload chunk sent");
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(write_error(err, Phase::Chunk, config)),
        }
        if let Some(message) = socket.error_string() {
            return Err(WireError::Socket(message));
        }
        cancel.checkpoint()?;
    }
    flush(socket, Phase::Chunk, config)?;
    Ok(stats)
}

/// Wait until the server has consumed every uploaded byte.
///
/// Unsent bytes on a connection the server already dropped mean the server
/// refused the upload.
pub fn confirm_delivery<S, C>(socket: &mut S, timeout: Duration, cancel: &C) -> Result<()>
where
    S: Socket + ?Sized,
    C: Cancellation + ?Sized,
{
    let deadline = Instant::now() + timeout;
    loop {
        let unsent = socket.bytes_to_write();
        if unsent == 0 {
            return Ok(());
        }
        if socket.state() != SocketState::Connected {
            warn!(unsent, "server closed the connection before consuming the upload");
            return Err(WireError::Rejected { unsent });
        }
        cancel.checkpoint()?;
        let now = Instant::now();
        if now >= deadline {
            return Err(WireError::Timeout {
                phase: Phase::Delivery,
                after: timeout,
            });
        }
        std::thread::sleep((deadline - now).min(DELIVERY_POLL));
    }
}
