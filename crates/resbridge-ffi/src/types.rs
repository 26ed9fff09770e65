use std::ffi::c_void;
use std::os::raw::c_char;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RbResult {
    Ok = 0,
    InvalidArgument = 1,
    ConnectionError = 2,
    Timeout = 3,
    IoError = 4,
    ShapeError = 5,
    RejectedTransfer = 6,
    Cancelled = 7,
    NoData = 8,
    Internal = 99,
}

#[allow(dead_code)]
pub const RB_OK: RbResult = RbResult::Ok;
#[allow(dead_code)]
pub const RB_ERR_INVALID_ARGUMENT: RbResult = RbResult::InvalidArgument;
#[allow(dead_code)]
pub const RB_ERR_CONNECTION: RbResult = RbResult::ConnectionError;
#[allow(dead_code)]
pub const RB_ERR_TIMEOUT: RbResult = RbResult::Timeout;
#[allow(dead_code)]
pub const RB_ERR_IO: RbResult = RbResult::IoError;
#[allow(dead_code)]
pub const RB_ERR_SHAPE: RbResult = RbResult::ShapeError;
#[allow(dead_code)]
pub const RB_ERR_REJECTED_TRANSFER: RbResult = RbResult::RejectedTransfer;
#[allow(dead_code)]
pub const RB_ERR_CANCELLED: RbResult = RbResult::Cancelled;
#[allow(dead_code)]
pub const RB_ERR_NO_DATA: RbResult = RbResult::NoData;
#[allow(dead_code)]
pub const RB_ERR_INTERNAL: RbResult = RbResult::Internal;

/// Client settings. Zero fields fall back to the library defaults.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RbConfig {
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub header_timeout_ms: u64,
    pub chunk_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub max_block_value_count: usize,
}

/// Returns non-zero once the host wants the exchange stopped.
pub type RbCancelFn = unsafe extern "C" fn(user_data: *mut c_void) -> i32;

/// Receives one NUL-terminated diagnostic line, valid only during the call.
pub type RbReportFn = unsafe extern "C" fn(user_data: *mut c_void, message: *const c_char);

/// Host callbacks. Either callback may be null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RbHost {
    pub user_data: *mut c_void,
    pub is_cancelled: Option<RbCancelFn>,
    pub report: Option<RbReportFn>,
}

impl Default for RbHost {
    fn default() -> Self {
        Self {
            user_data: std::ptr::null_mut(),
            is_cancelled: None,
            report: None,
        }
    }
}

/// Column-major `f64` array owned by this library until `rb_matrix_free`.
#[repr(C)]
#[derive(Debug)]
pub struct RbMatrix {
    pub data: *mut f64,
    pub len: usize,
    pub dims: *mut usize,
    pub ndims: usize,
}

impl Default for RbMatrix {
    fn default() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
            dims: std::ptr::null_mut(),
            ndims: 0,
        }
    }
}
