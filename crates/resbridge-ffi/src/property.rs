use std::os::raw::c_char;

use resbridge_query::{Array, CaseId, Client, ClientConfig, Result, TransferOutcome};

use crate::args;
use crate::error;
use crate::host::HostCallbacks;
use crate::matrix::write_matrix_out;
use crate::types::{RbConfig, RbHost, RbMatrix, RbResult};

/// Run one matrix-returning query and translate its outcome.
fn matrix_query(
    command: &'static str,
    config: ClientConfig,
    mut host: HostCallbacks,
    out: *mut RbMatrix,
    query: impl FnOnce(&Client, &HostCallbacks) -> Result<Array<f64>>,
) -> RbResult {
    let result = Client::new(config).and_then(|client| query(&client, &host));
    let (array, outcome) = TransferOutcome::capture(command, result.map(Some), &mut host);
    let code = error::map_outcome(&outcome);
    match write_matrix_out(out, array) {
        RbResult::Ok => code,
        other => other,
    }
}

/// Fetch `[activeCells, timesteps]` values of `property`.
///
/// When the exchange fails `out` is left empty and `rb_last_error` describes
/// the cause.
///
/// # Safety
/// `config` and `host` must be null or readable. `property` must be a valid C
/// string; `porosity` null or a valid C string. If `num_steps > 0`, `steps`
/// must be readable for that many values. `out` must be a writable
/// `RbMatrix` whose buffers are null or owned by this library.
#[no_mangle]
pub unsafe extern "C" fn rb_get_active_cell_property(
    config: *const RbConfig,
    host: *const RbHost,
    case_id: i64,
    property: *const c_char,
    porosity: *const c_char,
    steps: *const u32,
    num_steps: usize,
    out: *mut RbMatrix,
) -> RbResult {
    crate::ffi_boundary(RbResult::Internal, || {
        error::clear_error_state();
        if out.is_null() {
            return error::set_invalid_argument("out cannot be null");
        }
        // SAFETY: Forwarded caller guarantees; each helper validates null.
        let parsed = unsafe {
            (
                args::config_arg(config),
                args::required_str_arg(property, "property"),
                args::porosity_arg(porosity),
                args::steps_arg(steps, num_steps),
            )
        };
        let (Some(config), Some(property), Some(porosity), Some(steps)) = parsed else {
            return RbResult::InvalidArgument;
        };
        // SAFETY: Forwarded caller guarantee.
        let host = unsafe { HostCallbacks::from_ptr(host) };

        matrix_query("GetActiveCellProperty", config, host, out, |client, cancel| {
            client.active_cell_property(CaseId(case_id), property, porosity, steps, cancel)
        })
    })
}

/// Fetch `[I, J, K, timesteps]` values of `property` on grid `grid`.
///
/// # Safety
/// Same contract as [`rb_get_active_cell_property`].
#[no_mangle]
pub unsafe extern "C" fn rb_get_grid_property(
    config: *const RbConfig,
    host: *const RbHost,
    case_id: i64,
    grid: u32,
    property: *const c_char,
    porosity: *const c_char,
    steps: *const u32,
    num_steps: usize,
    out: *mut RbMatrix,
) -> RbResult {
    crate::ffi_boundary(RbResult::Internal, || {
        error::clear_error_state();
        if out.is_null() {
            return error::set_invalid_argument("out cannot be null");
        }
        // SAFETY: Forwarded caller guarantees; each helper validates null.
        let parsed = unsafe {
            (
                args::config_arg(config),
                args::required_str_arg(property, "property"),
                args::porosity_arg(porosity),
                args::steps_arg(steps, num_steps),
            )
        };
        let (Some(config), Some(property), Some(porosity), Some(steps)) = parsed else {
            return RbResult::InvalidArgument;
        };
        // SAFETY: Forwarded caller guarantee.
        let host = unsafe { HostCallbacks::from_ptr(host) };

        matrix_query("GetGridProperty", config, host, out, |client, cancel| {
            client.grid_property(CaseId(case_id), grid, property, porosity, steps, cancel)
        })
    })
}

/// Upload `[activeCells, timesteps]` values as `property`.
///
/// `values` holds the product of `dims` doubles in column-major order.
///
/// # Safety
/// `config`, `host`, `property`, `porosity` and `steps` as for
/// [`rb_get_active_cell_property`]. `dims` must be readable for `ndims`
/// values and `values` for their product.
#[no_mangle]
pub unsafe extern "C" fn rb_set_active_cell_property(
    config: *const RbConfig,
    host: *const RbHost,
    case_id: i64,
    property: *const c_char,
    porosity: *const c_char,
    steps: *const u32,
    num_steps: usize,
    values: *const f64,
    dims: *const usize,
    ndims: usize,
) -> RbResult {
    crate::ffi_boundary(RbResult::Internal, || {
        error::clear_error_state();
        // SAFETY: Forwarded caller guarantees; each helper validates null.
        let parsed = unsafe {
            (
                args::config_arg(config),
                args::required_str_arg(property, "property"),
                args::porosity_arg(porosity),
                args::steps_arg(steps, num_steps),
                args::slice_arg(dims, ndims, "dims"),
            )
        };
        let (Some(config), Some(property), Some(porosity), Some(steps), Some(dims)) = parsed
        else {
            return RbResult::InvalidArgument;
        };
        let Some(count) = dims.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d)) else {
            return error::set_invalid_argument("dims overflow");
        };
        // SAFETY: Caller guarantees `values` is readable for the product of `dims`.
        let Some(values) = (unsafe { args::slice_arg(values, count, "values") }) else {
            return RbResult::InvalidArgument;
        };
        // SAFETY: Forwarded caller guarantee.
        let mut host = unsafe { HostCallbacks::from_ptr(host) };

        let command = "SetActiveCellProperty";
        let result = Array::new(command, dims.to_vec(), values.to_vec()).and_then(|array| {
            let client = Client::new(config)?;
            client
                .set_active_cell_property(CaseId(case_id), property, porosity, steps, &array, &host)
                .map(|_| ())
        });
        let (_, outcome) = TransferOutcome::capture(command, result, &mut host);
        error::map_outcome(&outcome)
    })
}
