//! Wire layer of the resbridge protocol.
//!
//! One connection carries exactly one exchange:
//!
//! ```text
//! client                                   server
//!   │ i64 BE length │ Latin-1 "Cmd arg arg" │ ──▶
//!   │                                        │ ◀── u64 BE header tuple
//!   │                                        │ ◀── payload (raw LE elements)
//! ```
//!
//! - [`writer`] frames the text request and, for uploads, the header the
//!   client writes itself.
//! - [`reader`] waits for and decodes fixed header tuples and catalog records.
//! - [`block`] moves the payload in bounded chunks in either direction,
//!   checking cancellation once per chunk.

pub mod block;
pub mod cancel;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use block::{confirm_delivery, transfer, Block, Direction, TransferStats};
pub use cancel::{CancelFn, Cancellation, NeverCancel};
pub use codec::{
    f64s_from_le, f64s_to_le, i32s_from_le, i32s_to_le, put_header, put_text, put_value,
    CatalogLayout, ElementKind, FieldKind, Record, Request, Value, WireConfig,
    DEFAULT_MAX_BLOCK_VALUE_COUNT, FIELD_SIZE, NULL_STRING_LEN, REQUEST_PREFIX_SIZE,
};
pub use error::{Phase, Result, WireError};
pub use reader::{read_catalog, read_header};
pub use writer::{send_request, write_header};
