//! resbridge-ffi: C-ABI exports for embedding resbridge queries in a numeric host.
//!
//! Every call runs one blocking exchange. The host supplies a cancellation
//! predicate and a diagnostics sink through [`RbHost`]; results come back as
//! library-owned [`RbMatrix`] buffers released with [`rb_matrix_free`].

mod args;
mod error;
mod host;
mod matrix;
mod property;
mod types;

use std::panic::AssertUnwindSafe;

pub use matrix::rb_matrix_free;
pub use property::{
    rb_get_active_cell_property, rb_get_grid_property, rb_set_active_cell_property,
};
pub use types::{
    RbCancelFn, RbConfig, RbHost, RbMatrix, RbReportFn, RbResult, RB_ERR_CANCELLED,
    RB_ERR_CONNECTION, RB_ERR_INTERNAL, RB_ERR_INVALID_ARGUMENT, RB_ERR_IO, RB_ERR_NO_DATA,
    RB_ERR_REJECTED_TRANSFER, RB_ERR_SHAPE, RB_ERR_TIMEOUT, RB_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[no_mangle]
pub extern "C" fn rb_init() -> RbResult {
    ffi_boundary(RbResult::Internal, || {
        error::clear_error_state();
        RbResult::Ok
    })
}

#[no_mangle]
pub extern "C" fn rb_cleanup() {
    ffi_boundary((), || {
        error::clear_error_state();
    });
}

#[no_mangle]
pub extern "C" fn rb_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

/// Fill `out` with the default client settings.
///
/// # Safety
/// `out` must be null or point to a writable `RbConfig`.
#[no_mangle]
pub unsafe extern "C" fn rb_config_default(out: *mut RbConfig) -> RbResult {
    ffi_boundary(RbResult::Internal, || {
        error::clear_error_state();
        if out.is_null() {
            return error::set_invalid_argument("out cannot be null");
        }
        let defaults = resbridge_query::ClientConfig::default();
        let millis = |d: std::time::Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        let config = RbConfig {
            port: defaults.port,
            connect_timeout_ms: millis(defaults.connect_timeout),
            header_timeout_ms: millis(defaults.header_timeout),
            chunk_timeout_ms: millis(defaults.chunk_timeout),
            poll_interval_ms: millis(defaults.poll_interval),
            max_block_value_count: defaults.max_block_value_count,
        };
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { *out = config };
        RbResult::Ok
    })
}
