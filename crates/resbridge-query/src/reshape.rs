//! Turn raw responses into host-shaped arrays.
//!
//! Every function checks that the header agrees with itself and with the
//! payload before wrapping the decoded values; nothing is reordered.

use resbridge_wire::{f64s_from_le, i32s_from_le};

use crate::array::Array;
use crate::error::{QueryError, Result};
use crate::executor::Response;
use crate::records::GridDimensions;

const F64: usize = 8;
const I32: usize = 4;

fn field(response: &Response, index: usize) -> Result<usize> {
    let value = *response.header.get(index).ok_or_else(|| {
        QueryError::shape(response.command, format!("header has no field {index}"))
    })?;
    usize::try_from(value).map_err(|_| {
        QueryError::shape(
            response.command,
            format!("header value {value} exceeds address space"),
        )
    })
}

fn per_column(response: &Response, columns: usize, element: usize) -> Result<usize> {
    let bytes = response.payload().len();
    if columns == 0 {
        if bytes != 0 {
            return Err(QueryError::shape(
                response.command,
                format!("{bytes} payload bytes for zero columns"),
            ));
        }
        return Ok(0);
    }
    let column_bytes = columns.checked_mul(element).ok_or_else(|| {
        QueryError::shape(response.command, format!("{columns} columns overflow"))
    })?;
    if bytes % column_bytes != 0 {
        return Err(QueryError::shape(
            response.command,
            format!("{bytes} bytes cannot be split into {columns} columns"),
        ));
    }
    Ok(bytes / column_bytes)
}

/// `[cells, timesteps]` from a `[timestepCount, byteCount]` header.
pub fn values_by_step(response: &Response) -> Result<Array<f64>> {
    let steps = field(response, 0)?;
    let cells = per_column(response, steps, F64)?;
    Array::new(
        response.command,
        vec![cells, steps],
        f64s_from_le(response.payload()),
    )
}

/// `[I, J, K, timesteps]` from an `[I, J, K, timestepCount, bytesPerStep]` header.
pub fn grid_values(response: &Response) -> Result<Array<f64>> {
    let (i, j, k) = (field(response, 0)?, field(response, 1)?, field(response, 2)?);
    let steps = field(response, 3)?;
    let per_step = field(response, 4)?;
    let cells = checked_cells(response, i, j, k)?;
    if steps > 0 && cells * F64 != per_step {
        return Err(QueryError::shape(
            response.command,
            format!("grid {i}x{j}x{k} needs {} bytes per step, header says {per_step}", cells * F64),
        ));
    }
    Array::new(
        response.command,
        vec![i, j, k, steps],
        f64s_from_le(response.payload()),
    )
}

/// `[cells, per_cell...]` from a `[activeCellCount, byteCount]` header.
pub fn active_geometry(response: &Response, per_cell: &[usize]) -> Result<Array<f64>> {
    let cells = field(response, 0)?;
    let mut dims = vec![cells];
    dims.extend_from_slice(per_cell);
    expect_bytes(response, &dims, F64)?;
    Array::new(response.command, dims, f64s_from_le(response.payload()))
}

/// `[I, J, K, per_cell...]` from a `[cellCount, I, J, K, byteCount]` header.
pub fn grid_geometry(response: &Response, per_cell: &[usize]) -> Result<Array<f64>> {
    let count = field(response, 0)?;
    let (i, j, k) = (field(response, 1)?, field(response, 2)?, field(response, 3)?);
    let cells = checked_cells(response, i, j, k)?;
    if cells != count {
        return Err(QueryError::shape(
            response.command,
            format!("cell count {count} disagrees with grid {i}x{j}x{k}"),
        ));
    }
    let mut dims = vec![i, j, k];
    dims.extend_from_slice(per_cell);
    expect_bytes(response, &dims, F64)?;
    Array::new(response.command, dims, f64s_from_le(response.payload()))
}

/// `[rows, columns]` from a `[columnCount, bytesPerColumn]` header.
pub fn table(response: &Response) -> Result<Array<i32>> {
    let columns = field(response, 0)?;
    let rows = per_column(response, columns, I32)?;
    Array::new(
        response.command,
        vec![rows, columns],
        i32s_from_le(response.payload()),
    )
}

/// `[boxes, 6]` of `(i1, i2, j1, j2, k1, k2)` bounds.
pub fn coarsening_boxes(response: &Response) -> Result<Array<i32>> {
    let values = i32s_from_le(response.payload());
    if values.len() % 6 != 0 {
        return Err(QueryError::shape(
            response.command,
            format!("{} values do not form whole coarsening boxes", values.len()),
        ));
    }
    // The server writes one box after another, so the raw order is row-major.
    let boxes = values.len() / 6;
    let mut data = vec![0; values.len()];
    for (b, bounds) in values.chunks_exact(6).enumerate() {
        for (c, value) in bounds.iter().enumerate() {
            data[c * boxes + b] = *value;
        }
    }
    Array::new(response.command, vec![boxes, 6], data)
}

pub fn grid_dimensions(response: &Response) -> Result<GridDimensions> {
    match response.header.as_slice() {
        &[i, j, k] => Ok(GridDimensions { i, j, k }),
        other => Err(QueryError::shape(
            response.command,
            format!("expected 3 dimensions, got {}", other.len()),
        )),
    }
}

fn checked_cells(response: &Response, i: usize, j: usize, k: usize) -> Result<usize> {
    i.checked_mul(j)
        .and_then(|ij| ij.checked_mul(k))
        .filter(|cells| cells.checked_mul(F64).is_some())
        .ok_or_else(|| QueryError::shape(response.command, format!("grid {i}x{j}x{k} overflows")))
}

fn expect_bytes(response: &Response, dims: &[usize], element: usize) -> Result<()> {
    let expected = dims
        .iter()
        .try_fold(element, |acc, d| acc.checked_mul(*d))
        .ok_or_else(|| QueryError::shape(response.command, format!("{dims:?} overflows")))?;
    let declared = response.payload().len();
    if expected != declared {
        return Err(QueryError::shape(
            response.command,
            format!("{dims:?} needs {expected} bytes, received {declared}"),
        ));
    }
    Ok(())
}
