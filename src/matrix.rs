//! Matrix value domain.
//!
//! [`Matrix`] is the capability surface shared by the storage formats:
//! [`DenseMatrix`] (N-dimensional, row-major) and [`SparseMatrix`]
//! (two-dimensional, compressed column). [`MatrixValue`] is the closed set of
//! formats a runtime value can hold.
//!
//! Indices are zero-based. `subset` with an [`Index`] reads a sub-matrix (or a
//! single element for a scalar index); `subset_replace` writes one and returns
//! the updated copy, growing the matrix if the index reaches past its size.

pub mod dense;
pub mod index;
pub mod sparse;

pub use dense::DenseMatrix;
pub use index::{Index, IndexDimension, Range};
pub use sparse::SparseMatrix;

use std::fmt;

use crate::error::EvalError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFormat {
    Dense,
    Sparse,
}

impl StorageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageFormat::Dense => "dense",
            StorageFormat::Sparse => "sparse",
        }
    }
}

pub trait Matrix: Clone {
    fn storage(&self) -> StorageFormat;

    /// Common element type, if every element has the same one.
    fn datatype(&self) -> Option<&'static str>;

    fn size(&self) -> Vec<usize>;

    fn get(&self, index: &[usize]) -> Result<Value, EvalError>;

    /// Write one element, growing the matrix with `default` if needed.
    fn set(&mut self, index: &[usize], value: Value, default: Option<&Value>) -> Result<(), EvalError>;

    /// Read the elements selected by `index`. A scalar index yields the
    /// element itself, any other index a matrix of the same format.
    fn subset(&self, index: &Index) -> Result<Value, EvalError>;

    /// Copy of this matrix with the selection replaced. Scalars are broadcast.
    fn subset_replace(
        &self,
        index: &Index,
        replacement: &Value,
        default: Option<&Value>,
    ) -> Result<Self, EvalError>;

    fn resize(&mut self, size: &[usize], default: Option<&Value>) -> Result<(), EvalError>;

    /// Reinterpret the elements (row-major) with a new size of equal count.
    fn reshape(&mut self, size: &[usize]) -> Result<(), EvalError>;

    fn map(
        &self,
        f: &mut dyn FnMut(&Value, &[usize]) -> Result<Value, EvalError>,
    ) -> Result<Self, EvalError>;

    fn for_each(&self, f: &mut dyn FnMut(&Value, &[usize]));

    /// Nested array representation.
    fn to_array(&self) -> Value;

    fn value_of(&self) -> Value {
        self.to_array()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatrixValue {
    Dense(DenseMatrix),
    Sparse(SparseMatrix),
}

impl MatrixValue {
    pub fn to_dense(&self) -> DenseMatrix {
        match self {
            MatrixValue::Dense(m) => m.clone(),
            MatrixValue::Sparse(m) => m.to_dense(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, MatrixValue::Sparse(_))
    }
}

macro_rules! delegate {
    ($self:ident, $m:ident => $e:expr) => {
        match $self {
            MatrixValue::Dense($m) => $e,
            MatrixValue::Sparse($m) => $e,
        }
    };
}

impl Matrix for MatrixValue {
    fn storage(&self) -> StorageFormat {
        delegate!(self, m => m.storage())
    }

    fn datatype(&self) -> Option<&'static str> {
        delegate!(self, m => m.datatype())
    }

    fn size(&self) -> Vec<usize> {
        delegate!(self, m => m.size())
    }

    fn get(&self, index: &[usize]) -> Result<Value, EvalError> {
        delegate!(self, m => m.get(index))
    }

    fn set(&mut self, index: &[usize], value: Value, default: Option<&Value>) -> Result<(), EvalError> {
        delegate!(self, m => m.set(index, value, default))
    }

    fn subset(&self, index: &Index) -> Result<Value, EvalError> {
        delegate!(self, m => m.subset(index))
    }

    fn subset_replace(
        &self,
        index: &Index,
        replacement: &Value,
        default: Option<&Value>,
    ) -> Result<Self, EvalError> {
        match self {
            MatrixValue::Dense(m) => m.subset_replace(index, replacement, default).map(MatrixValue::Dense),
            MatrixValue::Sparse(m) => m.subset_replace(index, replacement, default).map(MatrixValue::Sparse),
        }
    }

    fn resize(&mut self, size: &[usize], default: Option<&Value>) -> Result<(), EvalError> {
        delegate!(self, m => m.resize(size, default))
    }

    fn reshape(&mut self, size: &[usize]) -> Result<(), EvalError> {
        delegate!(self, m => m.reshape(size))
    }

    fn map(
        &self,
        f: &mut dyn FnMut(&Value, &[usize]) -> Result<Value, EvalError>,
    ) -> Result<Self, EvalError> {
        match self {
            MatrixValue::Dense(m) => m.map(f).map(MatrixValue::Dense),
            MatrixValue::Sparse(m) => m.map(f).map(MatrixValue::Sparse),
        }
    }

    fn for_each(&self, f: &mut dyn FnMut(&Value, &[usize])) {
        delegate!(self, m => m.for_each(f))
    }

    fn to_array(&self) -> Value {
        delegate!(self, m => m.to_array())
    }
}

impl fmt::Display for MatrixValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_array())
    }
}

/// Source of the values written by `subset_replace`.
pub(crate) enum Replacement {
    Broadcast(Value),
    /// Row-major values, one per selected position
    Values(Vec<Value>),
}

impl Replacement {
    pub(crate) fn value_at(&self, i: usize) -> Value {
        match self {
            Replacement::Broadcast(v) => v.clone(),
            Replacement::Values(values) => values.get(i).cloned().unwrap_or(Value::Number(0.0)),
        }
    }
}

fn squeeze(size: &[usize]) -> Vec<usize> {
    size.iter().copied().filter(|&n| n != 1).collect()
}

/// Check that `replacement` fits the shape selected by `index_size`, ignoring
/// singleton dimensions.
pub(crate) fn replacement_for(
    replacement: &Value,
    index_size: &[usize],
) -> Result<Replacement, EvalError> {
    match replacement {
        Value::Array(_) | Value::Matrix(_) => {
            let dense = match replacement {
                Value::Matrix(m) => m.to_dense(),
                _ => DenseMatrix::from_value(replacement)?,
            };
            let actual = dense.size();
            if squeeze(&actual) != squeeze(index_size) {
                return Err(EvalError::dimension_mismatch(actual, index_size.to_vec()));
            }
            Ok(Replacement::Values(dense.into_data()))
        }
        scalar => Ok(Replacement::Broadcast(scalar.clone())),
    }
}

/// Positions selected by `index` after checking its dimensionality against
/// `size`.
pub(crate) fn index_positions(index: &Index, size: &[usize]) -> Result<Vec<Vec<usize>>, EvalError> {
    if index.len() != size.len() {
        return Err(EvalError::dimension_mismatch(index.len(), size.len()));
    }
    index.positions()
}

/// Matrix product. Vectors act as a row on the left and a column on the
/// right; two vectors give their dot product as a scalar. Elements are
/// combined with `mul` and accumulated with `add`.
pub fn multiply(
    a: &DenseMatrix,
    b: &DenseMatrix,
    mul: &dyn Fn(&Value, &Value) -> Result<Value, EvalError>,
    add: &dyn Fn(&Value, &Value) -> Result<Value, EvalError>,
) -> Result<Value, EvalError> {
    let (sa, sb) = (a.size(), b.size());
    let (rows, inner) = match sa.as_slice() {
        [r, c] => (*r, *c),
        [c] => (1, *c),
        _ => return Err(EvalError::dimension_mismatch(sa.clone(), vec![0, 0])),
    };
    let cols = match sb.as_slice() {
        [r, c] if *r == inner => *c,
        [r] if *r == inner => 1,
        _ => return Err(EvalError::dimension_mismatch(sb.clone(), vec![inner])),
    };

    let left = a.data();
    let right = b.data();
    let mut data = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let mut acc: Option<Value> = None;
            for k in 0..inner {
                let product = mul(&left[i * inner + k], &right[k * cols + j])?;
                acc = Some(match acc {
                    Some(sum) => add(&sum, &product)?,
                    None => product,
                });
            }
            data.push(acc.unwrap_or(Value::Number(0.0)));
        }
    }

    let size = match (sa.len(), sb.len()) {
        (1, 1) => return Ok(data.into_iter().next().unwrap_or(Value::Number(0.0))),
        (1, _) => vec![cols],
        (_, 1) => vec![rows],
        _ => vec![rows, cols],
    };
    DenseMatrix::from_parts(data, size).map(|m| Value::Matrix(MatrixValue::Dense(m)))
}
