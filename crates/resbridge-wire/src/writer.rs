use std::io::ErrorKind;

use bytes::BytesMut;
use resbridge_transport::Socket;
use tracing::debug;

use crate::codec::{put_header, Request, WireConfig, REQUEST_PREFIX_SIZE};
use crate::error::{Phase, Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Frame and send one request.
///
/// Nothing is written when a token cannot be encoded.
pub fn send_request<S>(socket: &mut S, request: &Request, config: &WireConfig) -> Result<()>
where
    S: Socket + ?Sized,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
    request.encode(&mut buf)?;
    write_all(socket, &buf, Phase::Request, config)?;
    debug!(
        command = request.command(),
        text_len = buf.len() - REQUEST_PREFIX_SIZE,
        "request sent"
    );
    Ok(())
}

/// Write a client-side header tuple ahead of an upload.
pub fn write_header<S>(socket: &mut S, fields: &[u64], config: &WireConfig) -> Result<()>
where
    S: Socket + ?Sized,
{
    let mut buf = BytesMut::with_capacity(fields.len() * 8);
    put_header(&mut buf, fields);
    write_all(socket, &buf, Phase::Request, config)?;
    debug!(?fields, "upload header sent");
    Ok(())
}

fn write_all<S>(socket: &mut S, data: &[u8], phase: Phase, config: &WireConfig) -> Result<()>
where
    S: Socket + ?Sized,
{
    let mut offset = 0usize;
    while offset < data.len() {
        match socket.write(&data[offset..]) {
            Ok(0) => {
                return Err(WireError::ZeroWrite {
                    remaining: data.len() - offset,
                })
            }
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(write_error(err, phase, config)),
        }
    }

    flush(socket, phase, config)?;
    match socket.error_string() {
        Some(message) => Err(WireError::Socket(message)),
        None => Ok(()),
    }
}

pub(crate) fn flush<S>(socket: &mut S, phase: Phase, config: &WireConfig) -> Result<()>
where
    S: Socket + ?Sized,
{
    loop {
        match socket.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(write_error(err, phase, config)),
        }
    }
}

/// A blocked write past the socket's write timeout is a timeout; anything
/// else is an I/O failure.
pub(crate) fn write_error(err: std::io::Error, phase: Phase, config: &WireConfig) -> WireError {
    match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => WireError::Timeout {
            phase,
            after: config.chunk_timeout,
        },
        _ => WireError::Io(err),
    }
}
