use std::time::Duration;

use bytes::{BufMut, BytesMut};

use crate::error::{Result, WireError};

/// Request length prefix: one big-endian `i64`.
pub const REQUEST_PREFIX_SIZE: usize = 8;

/// Width of one header field (big-endian `u64`).
pub const FIELD_SIZE: usize = 8;

/// Length marker of a null catalog string.
pub const NULL_STRING_LEN: u32 = u32::MAX;

/// Values per chunk when nothing else is configured.
pub const DEFAULT_MAX_BLOCK_VALUE_COUNT: usize = 20_000;

/// A text command with its space-separated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    command: String,
    args: Vec<String>,
}

impl Request {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The request text as the server sees it.
    pub fn text(&self) -> String {
        let mut text = self.command.clone();
        for arg in &self.args {
            text.push(' ');
            text.push_str(arg);
        }
        text
    }

    /// Encode the request into its wire form.
    ///
    /// Wire format:
    /// ```text
    /// ┌────────────────────┬──────────────────────────────┐
    /// │ Length (8B i64 BE) │ Latin-1 text (Length bytes)  │
    /// │                    │ "Command arg1 arg2 ..."       │
    /// └────────────────────┴──────────────────────────────┘
    /// ```
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        check_token(&self.command)?;
        for arg in &self.args {
            check_token(arg)?;
        }

        let text = self.text();
        let len = text.chars().count();
        dst.reserve(REQUEST_PREFIX_SIZE + len);
        dst.put_i64(len as i64);
        // Every char was checked to fit in one Latin-1 byte.
        dst.extend(text.chars().map(|c| c as u32 as u8));
        Ok(())
    }
}

fn check_token(token: &str) -> Result<()> {
    let reason = if token.is_empty() {
        "empty"
    } else if token.chars().any(char::is_whitespace) {
        "contains whitespace"
    } else if token.chars().any(|c| c as u32 > 0xFF) {
        "not representable in Latin-1"
    } else {
        return Ok(());
    };
    Err(WireError::InvalidToken {
        token: token.to_string(),
        reason,
    })
}

/// Fixed-width payload element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    F64,
    I32,
}

impl ElementKind {
    pub const fn size(self) -> usize {
        match self {
            ElementKind::F64 => 8,
            ElementKind::I32 => 4,
        }
    }
}

/// Decode little-endian `f64` payload bytes. Trailing partial elements are ignored.
pub fn f64s_from_le(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|raw| f64::from_le_bytes([raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7]]))
        .collect()
}

/// Decode little-endian `i32` payload bytes. Trailing partial elements are ignored.
pub fn i32s_from_le(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|raw| i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
        .collect()
}

/// Encode `f64` values as little-endian payload bytes.
pub fn f64s_to_le(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Encode `i32` values as little-endian payload bytes.
pub fn i32s_to_le(values: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Append a header tuple.
pub fn put_header(dst: &mut BytesMut, fields: &[u64]) {
    dst.reserve(fields.len() * FIELD_SIZE);
    for field in fields {
        dst.put_u64(*field);
    }
}

/// Decode a header tuple. `raw.len()` must be a multiple of [`FIELD_SIZE`].
pub fn decode_header(raw: &[u8]) -> Vec<u64> {
    raw.chunks_exact(FIELD_SIZE)
        .map(|f| u64::from_be_bytes([f[0], f[1], f[2], f[3], f[4], f[5], f[6], f[7]]))
        .collect()
}

/// Kind of one field in a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    I32,
    I64,
    U64,
    F64,
}

impl FieldKind {
    /// Encoded width, `None` for variable-length text.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            FieldKind::Text => None,
            FieldKind::I32 => Some(4),
            FieldKind::I64 | FieldKind::U64 | FieldKind::F64 => Some(8),
        }
    }
}

/// One decoded catalog field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    I32(i32),
    I64(i64),
    U64(u64),
    F64(f64),
}

/// Decode a fixed-width field from exactly `kind.fixed_size()` bytes.
pub fn decode_scalar(kind: FieldKind, raw: &[u8]) -> Result<Value> {
    let Some(expected) = kind.fixed_size() else {
        return Err(text_as_scalar());
    };
    if raw.len() != expected {
        return Err(WireError::Malformed(format!(
            "{kind:?} field needs {expected} bytes, got {}",
            raw.len()
        )));
    }
    let mut word = [0u8; 8];
    word[..expected].copy_from_slice(raw);
    let value = match kind {
        FieldKind::I32 => Value::I32(i32::from_be_bytes([word[0], word[1], word[2], word[3]])),
        FieldKind::I64 => Value::I64(i64::from_be_bytes(word)),
        FieldKind::U64 => Value::U64(u64::from_be_bytes(word)),
        FieldKind::F64 => Value::F64(f64::from_be_bytes(word)),
        FieldKind::Text => return Err(text_as_scalar()),
    };
    Ok(value)
}

fn text_as_scalar() -> WireError {
    WireError::Malformed("text field decoded as a scalar".to_string())
}

/// Decode a UTF-16BE string body. Unpaired surrogates become U+FFFD.
pub fn decode_utf16be(raw: &[u8]) -> Result<String> {
    if raw.len() % 2 != 0 {
        return Err(WireError::Malformed(format!(
            "odd UTF-16 byte length {}",
            raw.len()
        )));
    }
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|u| u16::from_be_bytes([u[0], u[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

/// Append a length-prefixed UTF-16BE string.
pub fn put_text(dst: &mut BytesMut, text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    dst.put_u32((units.len() * 2) as u32);
    for unit in units {
        dst.put_u16(unit);
    }
}

/// Append one catalog field in its wire form.
pub fn put_value(dst: &mut BytesMut, value: &Value) {
    match value {
        Value::Text(text) => put_text(dst, text),
        Value::I32(v) => dst.put_i32(*v),
        Value::I64(v) => dst.put_i64(*v),
        Value::U64(v) => dst.put_u64(*v),
        Value::F64(v) => dst.put_f64(*v),
    }
}

/// A decoded catalog record, fields in declared order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(pub Vec<Value>);

impl Record {
    pub fn fields(&self) -> &[Value] {
        &self.0
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        match self.0.get(index)? {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn i32(&self, index: usize) -> Option<i32> {
        match self.0.get(index)? {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn i64(&self, index: usize) -> Option<i64> {
        match self.0.get(index)? {
            Value::I64(v) => Some(*v),
            Value::I32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn u64(&self, index: usize) -> Option<u64> {
        match self.0.get(index)? {
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn f64(&self, index: usize) -> Option<f64> {
        match self.0.get(index)? {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }
}

/// Layout of a catalog response.
///
/// Counted catalogs send `byteCount`, `itemCount`, then `itemCount` records;
/// uncounted ones send `byteCount` and exactly one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogLayout {
    pub counted: bool,
    pub record: &'static [FieldKind],
}

/// Timeouts and chunk bound shared by every wire operation.
#[derive(Debug, Clone)]
pub struct WireConfig {
    /// Budget for the whole response header to arrive.
    pub header_timeout: Duration,
    /// Budget for each payload chunk.
    pub chunk_timeout: Duration,
    /// Longest single readiness wait before cancellation is polled again.
    pub poll_interval: Duration,
    /// Values per chunk, shared by both directions.
    pub max_block_value_count: usize,
}

impl WireConfig {
    /// Byte bound of one chunk of `element`s.
    pub fn chunk_bytes(&self, element: ElementKind) -> usize {
        self.max_block_value_count.max(1) * element.size()
    }
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            header_timeout: Duration::from_secs(60),
            chunk_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            max_block_value_count: DEFAULT_MAX_BLOCK_VALUE_COUNT,
        }
    }
}
