use std::ptr;

use resbridge_query::Array;

use crate::error;
use crate::types::{RbMatrix, RbResult};

fn release(matrix: &mut RbMatrix) {
    if !matrix.data.is_null() {
        let slice_ptr = ptr::slice_from_raw_parts_mut(matrix.data, matrix.len);
        // SAFETY: `data` was allocated as `Box<[f64]>` by `write_matrix_out`.
        unsafe { drop(Box::from_raw(slice_ptr)) };
    }
    if !matrix.dims.is_null() {
        let slice_ptr = ptr::slice_from_raw_parts_mut(matrix.dims, matrix.ndims);
        // SAFETY: `dims` was allocated as `Box<[usize]>` by `write_matrix_out`.
        unsafe { drop(Box::from_raw(slice_ptr)) };
    }
    *matrix = RbMatrix::default();
}

fn leak<T>(values: Vec<T>) -> (*mut T, usize) {
    let boxed = values.into_boxed_slice();
    let len = boxed.len();
    if len == 0 {
        (ptr::null_mut(), 0)
    } else {
        (Box::into_raw(boxed) as *mut T, len)
    }
}

/// Move `array` into `out`, freeing whatever `out` held. `None` leaves it empty.
pub(crate) fn write_matrix_out(out: *mut RbMatrix, array: Option<Array<f64>>) -> RbResult {
    if out.is_null() {
        return error::set_invalid_argument("out cannot be null");
    }

    let matrix = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *out }
    };
    release(matrix);

    if let Some(array) = array {
        let dims = array.dims().to_vec();
        let (data, len) = leak(array.into_data());
        let (dims, ndims) = leak(dims);
        *matrix = RbMatrix {
            data,
            len,
            dims,
            ndims,
        };
    }
    RbResult::Ok
}

/// Free memory held by an [`RbMatrix`] populated by a query function.
///
/// # Safety
/// `matrix` must be null or a valid pointer to an `RbMatrix` whose buffers,
/// if any, were allocated by this library.
#[no_mangle]
pub unsafe extern "C" fn rb_matrix_free(matrix: *mut RbMatrix) {
    crate::ffi_boundary((), || {
        if matrix.is_null() {
            return;
        }
        // SAFETY: Pointer validity is guaranteed by the caller.
        release(unsafe { &mut *matrix });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_out_carries_dims_and_data() {
        let array = Array::new("t", vec![2, 3], (0..6).map(f64::from).collect()).unwrap();
        let mut out = RbMatrix::default();
        assert_eq!(write_matrix_out(&mut out, Some(array)), RbResult::Ok);
        assert_eq!(out.len, 6);
        assert_eq!(out.ndims, 2);

        // SAFETY: Buffers were just populated with the stated lengths.
        let (data, dims) = unsafe {
            (
                std::slice::from_raw_parts(out.data, out.len),
                std::slice::from_raw_parts(out.dims, out.ndims),
            )
        };
        assert_eq!(dims, &[2, 3]);
        assert_eq!(data[5], 5.0);

        // SAFETY: `out` was populated by `write_matrix_out`.
        unsafe { rb_matrix_free(&mut out) };
        assert!(out.data.is_null());
        assert_eq!(out.ndims, 0);
    }

    #[test]
    fn reuse_frees_previous_contents() {
        let mut out = RbMatrix::default();
        let first = Array::new("t", vec![1, 1], vec![1.0]).unwrap();
        write_matrix_out(&mut out, Some(first));
        write_matrix_out(&mut out, None);
        assert!(out.data.is_null());
        assert!(out.dims.is_null());
    }

    #[test]
    fn null_out_is_rejected() {
        assert_eq!(
            write_matrix_out(ptr::null_mut(), None),
            RbResult::InvalidArgument
        );
    }
}
