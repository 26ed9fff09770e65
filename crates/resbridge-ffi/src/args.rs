use std::ffi::CStr;
use std::os::raw::c_char;
use std::time::Duration;

use resbridge_query::{ClientConfig, PorosityModel, TimeSteps};

use crate::error;
use crate::types::RbConfig;

/// Convert a required C string argument into UTF-8 `&str`.
///
/// # Safety
/// `value` must be null or point to a valid NUL-terminated C string.
pub(crate) unsafe fn required_str_arg<'a>(value: *const c_char, name: &str) -> Option<&'a str> {
    if value.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null"));
        return None;
    }

    let as_cstr = {
        // SAFETY: The caller guarantees `value` points to a valid NUL-terminated C string.
        unsafe { CStr::from_ptr(value) }
    };

    match as_cstr.to_str() {
        Ok(v) => Some(v),
        Err(_) => {
            let _ = error::set_invalid_argument(format!("{name} must be valid UTF-8"));
            None
        }
    }
}

/// Porosity model name; null selects the matrix model.
///
/// # Safety
/// `value` must be null or point to a valid NUL-terminated C string.
pub(crate) unsafe fn porosity_arg(value: *const c_char) -> Option<PorosityModel> {
    if value.is_null() {
        return Some(PorosityModel::Matrix);
    }
    // SAFETY: Forwarded caller guarantee.
    let text = unsafe { required_str_arg(value, "porosity") }?;
    match text.parse() {
        Ok(model) => Some(model),
        Err(err) => {
            let _ = error::set_invalid_argument(err.to_string());
            None
        }
    }
}

/// One-based time steps; an empty list selects every step.
///
/// # Safety
/// If `num_steps > 0`, `steps` must be non-null and readable for that many elements.
pub(crate) unsafe fn steps_arg(steps: *const u32, num_steps: usize) -> Option<TimeSteps> {
    if num_steps == 0 {
        return Some(TimeSteps::All);
    }
    if steps.is_null() {
        let _ = error::set_invalid_argument("steps cannot be null when num_steps > 0");
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    let selected = unsafe { std::slice::from_raw_parts(steps, num_steps) };
    Some(TimeSteps::Selected(selected.to_vec()))
}

/// Convert an optional pointer + length into a slice.
///
/// # Safety
/// If `len > 0`, `data` must be non-null and readable for `len` elements.
pub(crate) unsafe fn slice_arg<'a, T>(data: *const T, len: usize, name: &str) -> Option<&'a [T]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null when its length > 0"));
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Client configuration; null selects the defaults and the environment.
///
/// # Safety
/// `config` must be null or point to a readable `RbConfig`.
pub(crate) unsafe fn config_arg(config: *const RbConfig) -> Option<ClientConfig> {
    let mut resolved = match ClientConfig::from_env() {
        Ok(resolved) => resolved,
        Err(err) => {
            let _ = error::set_invalid_argument(err.to_string());
            return None;
        }
    };
    if config.is_null() {
        return Some(resolved);
    }

    // SAFETY: Pointer validity is guaranteed by the caller.
    let raw = unsafe { *config };
    let ms = |value: u64, fallback: Duration| {
        if value == 0 {
            fallback
        } else {
            Duration::from_millis(value)
        }
    };
    if raw.port != 0 {
        resolved.port = raw.port;
    }
    resolved.connect_timeout = ms(raw.connect_timeout_ms, resolved.connect_timeout);
    resolved.header_timeout = ms(raw.header_timeout_ms, resolved.header_timeout);
    resolved.chunk_timeout = ms(raw.chunk_timeout_ms, resolved.chunk_timeout);
    resolved.poll_interval = ms(raw.poll_interval_ms, resolved.poll_interval);
    if raw.max_block_value_count != 0 {
        resolved.max_block_value_count = raw.max_block_value_count;
    }
    Some(resolved)
}
