use std::io::Read;
use std::time::{Duration, Instant};

use resbridge_transport::{Readiness, Socket};
use tracing::{debug, trace};

use crate::cancel::Cancellation;
use crate::codec::{
    decode_header, decode_scalar, decode_utf16be, CatalogLayout, FieldKind, Record, Value,
    WireConfig, FIELD_SIZE, NULL_STRING_LEN,
};
use crate::error::{Phase, Result, WireError};

/// Upper bound on a catalog body; anything larger is a corrupt header.
const MAX_CATALOG_BYTES: u64 = 256 * 1024 * 1024;
const MAX_CATALOG_ITEMS: u64 = 16 * 1024 * 1024;
const MIN_POLL: Duration = Duration::from_millis(1);

/// Block until at least `needed` bytes are buffered.
///
/// Each readiness wait is capped at the poll interval so cancellation is
/// checked between retries; the overall wait is capped at `budget`.
pub(crate) fn wait_for_bytes<S, C>(
    socket: &mut S,
    needed: usize,
    budget: Duration,
    poll: Duration,
    phase: Phase,
    cancel: &C,
) -> Result<()>
where
    S: Socket + ?Sized,
    C: Cancellation + ?Sized,
{
    let deadline = Instant::now() + budget;
    while socket.bytes_available() < needed {
        cancel.checkpoint()?;
        let now = Instant::now();
        if now >= deadline {
            return Err(WireError::Timeout {
                phase,
                after: budget,
            });
        }
        let wait = (deadline - now).min(poll.max(MIN_POLL));
        match socket.wait_for_ready_read(wait)? {
            Readiness::Closed if socket.bytes_available() < needed => {
                return Err(WireError::ConnectionClosed {
                    received: socket.bytes_available(),
                    expected: needed,
                })
            }
            readiness => trace!(?readiness, buffered = socket.bytes_available(), needed, "waited"),
        }
    }
    Ok(())
}

/// Read a fixed tuple of `field_count` big-endian `u64` header fields.
///
/// No field is consumed until the whole tuple is buffered.
pub fn read_header<S, C>(
    socket: &mut S,
    field_count: usize,
    config: &WireConfig,
    cancel: &C,
) -> Result<Vec<u64>>
where
    S: Socket + ?Sized,
    C: Cancellation + ?Sized,
{
    let needed = field_count * FIELD_SIZE;
    wait_for_bytes(
        socket,
        needed,
        config.header_timeout,
        config.poll_interval,
        Phase::Header,
        cancel,
    )?;

    let mut raw = vec![0u8; needed];
    socket.read_exact(&mut raw)?;
    let header = decode_header(&raw);
    debug!(?header, "response header received");
    Ok(header)
}

/// Read a two-phase catalog response.
///
/// The leading `byteCount` only bounds the initial wait: records are then
/// decoded field by field, each field waiting for its own bytes within the
/// header budget.
pub fn read_catalog<S, C>(
    socket: &mut S,
    layout: &CatalogLayout,
    config: &WireConfig,
    cancel: &C,
) -> Result<Vec<Record>>
where
    S: Socket + ?Sized,
    C: Cancellation + ?Sized,
{
    let byte_count = read_header(socket, 1, config, cancel)?[0];
    if byte_count > MAX_CATALOG_BYTES {
        return Err(WireError::Malformed(format!(
            "catalog byte count {byte_count} exceeds {MAX_CATALOG_BYTES}"
        )));
    }

    let mut cursor = Cursor {
        socket,
        config,
        cancel,
        started: Instant::now(),
    };
    cursor.wait(byte_count as usize)?;

    let count = if layout.counted {
        let count = cursor.u64()?;
        if count > MAX_CATALOG_ITEMS {
            return Err(WireError::Malformed(format!(
                "catalog item count {count} exceeds {MAX_CATALOG_ITEMS}"
            )));
        }
        count as usize
    } else {
        1
    };

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let mut fields = Vec::with_capacity(layout.record.len());
        for kind in layout.record {
            fields.push(cursor.value(*kind)?);
        }
        records.push(Record(fields));
    }
    debug!(byte_count, records = records.len(), "catalog received");
    Ok(records)
}

struct Cursor<'a, S: ?Sized, C: ?Sized> {
    socket: &'a mut S,
    config: &'a WireConfig,
    cancel: &'a C,
    started: Instant,
}

impl<S, C> Cursor<'_, S, C>
where
    S: Socket + ?Sized,
    C: Cancellation + ?Sized,
{
    fn wait(&mut self, needed: usize) -> Result<()> {
        let total = self.config.header_timeout;
        let budget = total.saturating_sub(self.started.elapsed());
        wait_for_bytes(
            &mut *self.socket,
            needed,
            budget,
            self.config.poll_interval,
            Phase::Catalog,
            self.cancel,
        )
        .map_err(|err| match err {
            WireError::ConnectionClosed { received, expected } => WireError::Malformed(format!(
                "catalog record truncated ({received} of {expected} bytes)"
            )),
            WireError::Timeout { phase, .. } => WireError::Timeout {
                phase,
                after: total,
            },
            other => other,
        })
    }

    fn take(&mut self, len: usize) -> Result<Vec<u8>> {
        self.wait(len)?;
        let mut raw = vec![0u8; len];
        self.socket.read_exact(&mut raw)?;
        Ok(raw)
    }

    fn u64(&mut self) -> Result<u64> {
        match decode_scalar(FieldKind::U64, &self.take(8)?)? {
            Value::U64(v) => Ok(v),
            other => Err(WireError::Malformed(format!("expected u64, got {other:?}"))),
        }
    }

    fn value(&mut self, kind: FieldKind) -> Result<Value> {
        let Some(size) = kind.fixed_size() else {
            return self.text().map(Value::Text);
        };
        decode_scalar(kind, &self.take(size)?)
    }

    fn text(&mut self) -> Result<String> {
        let raw = self.take(4)?;
        let len = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        if len == NULL_STRING_LEN {
            return Ok(String::new());
        }
        if u64::from(len) > MAX_CATALOG_BYTES {
            return Err(WireError::Malformed(format!("string length {len} too large")));
        }
        decode_utf16be(&self.take(len as usize)?)
    }
}
