use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use resbridge_query::{ErrorKind, TransferOutcome};

use crate::types::RbResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> RbResult {
    set_error_message(message);
    RbResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_kind(kind: ErrorKind) -> RbResult {
    match kind {
        ErrorKind::Connection => RbResult::ConnectionError,
        ErrorKind::Timeout => RbResult::Timeout,
        ErrorKind::Io => RbResult::IoError,
        ErrorKind::Shape => RbResult::ShapeError,
        ErrorKind::RejectedTransfer => RbResult::RejectedTransfer,
        ErrorKind::Cancelled => RbResult::Cancelled,
        ErrorKind::InvalidArgument => RbResult::InvalidArgument,
        ErrorKind::NoData => RbResult::NoData,
        ErrorKind::Internal => RbResult::Internal,
    }
}

/// Result code for an outcome; failures also set the last-error string.
pub(crate) fn map_outcome(outcome: &TransferOutcome) -> RbResult {
    if outcome.success {
        return RbResult::Ok;
    }
    set_error_message(outcome.messages.join("\n"));
    outcome.kind.map_or(RbResult::Internal, map_kind)
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}
