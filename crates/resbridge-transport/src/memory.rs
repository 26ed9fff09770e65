//! In-memory [`Socket`] with a scripted peer.
//!
//! Used to exercise the protocol layers deterministically: the inbound side
//! is a queue of events consumed one per readiness wait, and the outbound side
//! records every write so tests can inspect chunk sizes.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::{Buf, BytesMut};

use crate::traits::{Readiness, Socket, SocketState};

/// One scripted peer event, consumed per `wait_for_ready_read` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The peer sends these bytes.
    Data(Vec<u8>),
    /// The peer stays silent for the whole wait.
    Silence,
    /// The peer closes the connection.
    Close,
}

/// Scripted in-memory socket.
#[derive(Debug)]
pub struct MemorySocket {
    inbound: VecDeque<Inbound>,
    buffered: BytesMut,
    written: Vec<u8>,
    write_sizes: Vec<usize>,
    write_limit: Option<usize>,
    accept_limit: Option<usize>,
    unsent: usize,
    state: SocketState,
    error: Option<String>,
    waits: usize,
}

impl Default for MemorySocket {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySocket {
    pub fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            buffered: BytesMut::new(),
            written: Vec::new(),
            write_sizes: Vec::new(),
            write_limit: None,
            accept_limit: None,
            unsent: 0,
            state: SocketState::Connected,
            error: None,
            waits: 0,
        }
    }

    /// Queue bytes the peer will send on the next readiness wait.
    pub fn push_data(&mut self, data: impl Into<Vec<u8>>) -> &mut Self {
        self.inbound.push_back(Inbound::Data(data.into()));
        self
    }

    /// Queue a silent wait.
    pub fn push_silence(&mut self) -> &mut Self {
        self.inbound.push_back(Inbound::Silence);
        self
    }

    /// Queue a peer close.
    pub fn push_close(&mut self) -> &mut Self {
        self.inbound.push_back(Inbound::Close);
        self
    }

    /// Make bytes readable immediately, without a readiness wait.
    pub fn preload(&mut self, data: &[u8]) -> &mut Self {
        self.buffered.extend_from_slice(data);
        self
    }

    /// Accept at most `limit` bytes per write call.
    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// The peer stops consuming after `limit` bytes: further writes are queued
    /// as unsent and the connection drops.
    pub fn refusing_after(mut self, limit: usize) -> Self {
        self.accept_limit = Some(limit);
        self
    }

    /// Report a pending socket error after the next write.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Every byte written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Size of each accepted write call, in order.
    pub fn write_sizes(&self) -> &[usize] {
        &self.write_sizes
    }

    /// Number of readiness waits performed.
    pub fn waits(&self) -> usize {
        self.waits
    }
}

impl Read for MemorySocket {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let n = out.len().min(self.buffered.len());
        out[..n].copy_from_slice(&self.buffered[..n]);
        self.buffered.advance(n);
        Ok(n)
    }
}

impl Write for MemorySocket {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        if self.state == SocketState::Unconnected && self.accept_limit.is_none() {
            return Err(std::io::Error::from(ErrorKind::BrokenPipe));
        }

        let n = self.write_limit.map_or(data.len(), |limit| data.len().min(limit));
        match self.accept_limit {
            Some(limit) => {
                let room = limit.saturating_sub(self.written.len());
                let consumed = n.min(room);
                self.written.extend_from_slice(&data[..consumed]);
                self.unsent += n - consumed;
                if self.unsent > 0 {
                    self.state = SocketState::Unconnected;
                }
            }
            None => self.written.extend_from_slice(&data[..n]),
        }
        self.write_sizes.push(n);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Socket for MemorySocket {
    fn bytes_available(&self) -> usize {
        self.buffered.len()
    }

    fn wait_for_ready_read(&mut self, timeout: Duration) -> std::io::Result<Readiness> {
        self.waits += 1;
        if self.state == SocketState::Unconnected {
            return Ok(Readiness::Closed);
        }
        match self.inbound.pop_front() {
            Some(Inbound::Data(data)) => {
                self.buffered.extend_from_slice(&data);
                Ok(Readiness::Ready)
            }
            Some(Inbound::Close) => {
                self.state = SocketState::Unconnected;
                Ok(Readiness::Closed)
            }
            Some(Inbound::Silence) | None => {
                std::thread::sleep(timeout);
                Ok(Readiness::TimedOut)
            }
        }
    }

    fn bytes_to_write(&self) -> usize {
        self.unsent
    }

    fn state(&mut self) -> SocketState {
        self.state
    }

    fn error_string(&self) -> Option<String> {
        if self.written.is_empty() {
            None
        } else {
            self.error.clone()
        }
    }
}
