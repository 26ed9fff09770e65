use serde::Serialize;

use crate::error::{QueryError, Result};

/// A dense n-dimensional array in column-major order.
///
/// The first index varies fastest, which is exactly the order the server
/// writes values in, so reshaping never moves data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Array<T> {
    dims: Vec<usize>,
    data: Vec<T>,
}

impl<T> Array<T> {
    /// Wrap `data`, which must hold exactly the product of `dims` elements.
    pub fn new(command: &'static str, dims: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected = dims
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(*d))
            .ok_or_else(|| QueryError::shape(command, format!("dimensions {dims:?} overflow")))?;
        if expected != data.len() {
            return Err(QueryError::shape(
                command,
                format!(
                    "{} elements cannot form a {dims:?} array ({expected} expected)",
                    data.len()
                ),
            ));
        }
        Ok(Self { dims, data })
    }

    /// An array with zero elements along the first axis.
    pub fn empty(dims: Vec<usize>) -> Self {
        let mut dims = dims;
        if let Some(first) = dims.first_mut() {
            *first = 0;
        }
        Self {
            dims,
            data: Vec::new(),
        }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at a full multi-index.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0usize;
        let mut stride = 1usize;
        for (i, d) in index.iter().zip(&self.dims) {
            if i >= d {
                return None;
            }
            offset += i * stride;
            stride *= d;
        }
        self.data.get(offset)
    }

    /// Contiguous slice along the last axis, such as one time step.
    pub fn column(&self, last: usize) -> Option<&[T]> {
        let (&count, rest) = self.dims.split_last()?;
        if last >= count {
            return None;
        }
        let len: usize = rest.iter().product();
        self.data.get(last * len..(last + 1) * len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_index_varies_fastest() {
        let array = Array::new("t", vec![2, 3], vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(array.get(&[1, 0]), Some(&1));
        assert_eq!(array.get(&[0, 1]), Some(&2));
        assert_eq!(array.get(&[1, 2]), Some(&5));
        assert_eq!(array.get(&[2, 0]), None);
        assert_eq!(array.column(1), Some(&[2, 3][..]));
    }

    #[test]
    fn element_count_must_match_dims() {
        let err = Array::new("GetCellCenters", vec![2, 2, 3], vec![0.0; 11]).unwrap_err();
        assert!(err.to_string().contains("GetCellCenters"));
    }

    #[test]
    fn empty_keeps_trailing_dims() {
        let array: Array<f64> = Array::empty(vec![7, 3]);
        assert_eq!(array.dims(), &[0, 3]);
        assert!(array.is_empty());
    }
}
