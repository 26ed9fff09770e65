use std::ffi::CString;

use resbridge_query::{Cancellation, Diagnostics};

use crate::types::RbHost;

/// Host callbacks seen as a cancellation signal and a diagnostics sink.
pub(crate) struct HostCallbacks(RbHost);

impl HostCallbacks {
    /// # Safety
    /// `host` must be null or point to a readable `RbHost` whose callbacks
    /// stay valid for the duration of the exchange.
    pub(crate) unsafe fn from_ptr(host: *const RbHost) -> Self {
        if host.is_null() {
            Self(RbHost::default())
        } else {
            // SAFETY: Pointer validity is guaranteed by the caller.
            Self(unsafe { *host })
        }
    }
}

impl Cancellation for HostCallbacks {
    fn is_cancelled(&self) -> bool {
        match self.0.is_cancelled {
            // SAFETY: The host guarantees the callback accepts its own user data.
            Some(callback) => unsafe { callback(self.0.user_data) != 0 },
            None => false,
        }
    }
}

impl Diagnostics for HostCallbacks {
    fn report(&mut self, message: &str) {
        let Some(callback) = self.0.report else {
            return;
        };
        let text = CString::new(message.replace('\0', "?")).unwrap_or_default();
        // SAFETY: `text` outlives the call and the host guarantees the callback
        // accepts its own user data.
        unsafe { callback(self.0.user_data, text.as_ptr()) };
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::ffi::{c_void, CStr};
    use std::os::raw::c_char;

    use super::*;

    unsafe extern "C" fn count_down(user_data: *mut c_void) -> i32 {
        // SAFETY: Tests pass a `Cell<u32>`.
        let remaining = unsafe { &*(user_data as *const Cell<u32>) };
        let left = remaining.get();
        remaining.set(left.saturating_sub(1));
        i32::from(left == 0)
    }

    unsafe extern "C" fn collect(user_data: *mut c_void, message: *const c_char) {
        // SAFETY: Tests pass a `Vec<String>` and a valid C string.
        let lines = unsafe { &mut *(user_data as *mut Vec<String>) };
        let text = unsafe { CStr::from_ptr(message) };
        lines.push(text.to_string_lossy().into_owned());
    }

    #[test]
    fn null_host_never_cancels() {
        // SAFETY: Null is accepted.
        let mut host = unsafe { HostCallbacks::from_ptr(std::ptr::null()) };
        assert!(!host.is_cancelled());
        host.report("dropped silently");
    }

    #[test]
    fn cancel_callback_is_polled() {
        let remaining = Cell::new(1u32);
        let raw = RbHost {
            user_data: &remaining as *const Cell<u32> as *mut c_void,
            is_cancelled: Some(count_down),
            report: None,
        };
        // SAFETY: `raw` and `remaining` outlive `host`.
        let host = unsafe { HostCallbacks::from_ptr(&raw) };
        assert!(!host.is_cancelled());
        assert!(host.is_cancelled());
    }

    #[test]
    fn reports_reach_the_host() {
        let mut lines: Vec<String> = Vec::new();
        let raw = RbHost {
            user_data: &mut lines as *mut Vec<String> as *mut c_void,
            is_cancelled: None,
            report: Some(collect),
        };
        // SAFETY: `raw` and `lines` outlive `host`.
        let mut host = unsafe { HostCallbacks::from_ptr(&raw) };
        host.report("GetCases: timeout");
        drop(host);
        assert_eq!(lines, vec!["GetCases: timeout".to_string()]);
    }
}
