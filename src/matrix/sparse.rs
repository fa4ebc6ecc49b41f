use crate::error::EvalError;
use crate::matrix::dense::common_datatype;
use crate::matrix::index::for_each_position;
use crate::matrix::{DenseMatrix, Index, Matrix, MatrixValue, StorageFormat, index_positions, replacement_for};
use crate::value::Value;

/// Two-dimensional matrix in compressed sparse column form.
///
/// Column `j` owns the entries `ptr[j]..ptr[j + 1]` of `values` and `index`,
/// where `index` holds the row of each entry in ascending order. Zeros are
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    values: Vec<Value>,
    index: Vec<usize>,
    ptr: Vec<usize>,
    size: [usize; 2],
}

impl SparseMatrix {
    pub fn empty(rows: usize, cols: usize) -> Self {
        SparseMatrix {
            values: Vec::new(),
            index: Vec::new(),
            ptr: vec![0; cols + 1],
            size: [rows, cols],
        }
    }

    /// Build from `(row, col, value)` entries. Zero values are skipped and
    /// later entries overwrite earlier ones at the same position.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, Value)>,
    ) -> Result<Self, EvalError> {
        let mut matrix = SparseMatrix::empty(rows, cols);
        for (row, col, value) in entries {
            if row >= rows {
                return Err(EvalError::index_out_of_range(row, rows));
            }
            if col >= cols {
                return Err(EvalError::index_out_of_range(col, cols));
            }
            matrix.store(row, col, value);
        }
        Ok(matrix)
    }

    /// Vectors become a single column.
    pub fn from_dense(dense: &DenseMatrix) -> Result<Self, EvalError> {
        let (rows, cols) = match dense.size().as_slice() {
            [n] => (*n, 1),
            [r, c] => (*r, *c),
            other => {
                return Err(EvalError::Dimension(format!(
                    "Sparse matrices must be one or two dimensional (size: {other:?})"
                )));
            }
        };
        let data = dense.data();
        let mut matrix = SparseMatrix::empty(rows, cols);
        for j in 0..cols {
            for i in 0..rows {
                let value = &data[i * cols + j];
                if !value.is_zero() {
                    matrix.values.push(value.clone());
                    matrix.index.push(i);
                }
            }
            matrix.ptr[j + 1] = matrix.values.len();
        }
        Ok(matrix)
    }

    pub fn from_value(value: &Value) -> Result<Self, EvalError> {
        match value {
            Value::Matrix(MatrixValue::Sparse(m)) => Ok(m.clone()),
            other => SparseMatrix::from_dense(&DenseMatrix::from_value(other)?),
        }
    }

    pub fn to_dense(&self) -> DenseMatrix {
        let [rows, cols] = self.size;
        let mut data = vec![Value::Number(0.0); rows * cols];
        for j in 0..cols {
            for k in self.ptr[j]..self.ptr[j + 1] {
                data[self.index[k] * cols + j] = self.values[k].clone();
            }
        }
        DenseMatrix::from_parts(data, vec![rows, cols])
            .unwrap_or_else(|_| unreachable!("dense buffer sized from rows * cols"))
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Ratio of stored entries to total positions.
    pub fn density(&self) -> f64 {
        let total = self.size[0] * self.size[1];
        if total == 0 {
            0.0
        } else {
            self.nnz() as f64 / total as f64
        }
    }

    fn locate(&self, row: usize, col: usize) -> Result<usize, usize> {
        let (lo, hi) = (self.ptr[col], self.ptr[col + 1]);
        self.index[lo..hi].binary_search(&row).map(|k| lo + k).map_err(|k| lo + k)
    }

    fn store(&mut self, row: usize, col: usize, value: Value) {
        match (self.locate(row, col), value.is_zero()) {
            (Ok(k), true) => {
                self.values.remove(k);
                self.index.remove(k);
                for p in &mut self.ptr[col + 1..] {
                    *p -= 1;
                }
            }
            (Ok(k), false) => self.values[k] = value,
            (Err(_), true) => {}
            (Err(k), false) => {
                self.values.insert(k, value);
                self.index.insert(k, row);
                for p in &mut self.ptr[col + 1..] {
                    *p += 1;
                }
            }
        }
    }

    fn check_2d(&self, index: &[usize]) -> Result<(usize, usize), EvalError> {
        match index {
            [row, col] => Ok((*row, *col)),
            other => Err(EvalError::dimension_mismatch(other.len(), 2)),
        }
    }

    fn entries(&self) -> impl Iterator<Item = (usize, usize, &Value)> {
        (0..self.size[1]).flat_map(move |j| {
            (self.ptr[j]..self.ptr[j + 1]).map(move |k| (self.index[k], j, &self.values[k]))
        })
    }
}

impl Matrix for SparseMatrix {
    fn storage(&self) -> StorageFormat {
        StorageFormat::Sparse
    }

    fn datatype(&self) -> Option<&'static str> {
        common_datatype(&self.values)
    }

    fn size(&self) -> Vec<usize> {
        self.size.to_vec()
    }

    fn get(&self, index: &[usize]) -> Result<Value, EvalError> {
        let (row, col) = self.check_2d(index)?;
        if row >= self.size[0] {
            return Err(EvalError::index_out_of_range(row, self.size[0]));
        }
        if col >= self.size[1] {
            return Err(EvalError::index_out_of_range(col, self.size[1]));
        }
        Ok(match self.locate(row, col) {
            Ok(k) => self.values[k].clone(),
            Err(_) => Value::Number(0.0),
        })
    }

    fn set(&mut self, index: &[usize], value: Value, default: Option<&Value>) -> Result<(), EvalError> {
        let (row, col) = self.check_2d(index)?;
        if row >= self.size[0] || col >= self.size[1] {
            let grown = [self.size[0].max(row + 1), self.size[1].max(col + 1)];
            self.resize(&grown, default)?;
        }
        self.store(row, col, value);
        Ok(())
    }

    fn subset(&self, index: &Index) -> Result<Value, EvalError> {
        let positions = index_positions(index, &self.size)?;
        for (dim, selected) in positions.iter().enumerate() {
            if let Some(&bad) = selected.iter().find(|&&p| p >= self.size[dim]) {
                return Err(EvalError::index_out_of_range(bad, self.size[dim]));
            }
        }
        if index.is_scalar() {
            return self.get(&[positions[0][0], positions[1][0]]);
        }

        let mut result = SparseMatrix::empty(positions[0].len(), positions[1].len());
        let mut failure = None;
        for (i, &row) in positions[0].iter().enumerate() {
            for (j, &col) in positions[1].iter().enumerate() {
                match self.get(&[row, col]) {
                    Ok(v) => result.store(i, j, v),
                    Err(e) => {
                        failure.get_or_insert(e);
                    }
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(Value::Matrix(MatrixValue::Sparse(result))),
        }
    }

    fn subset_replace(
        &self,
        index: &Index,
        replacement: &Value,
        default: Option<&Value>,
    ) -> Result<Self, EvalError> {
        let positions = index_positions(index, &self.size)?;
        let source = replacement_for(replacement, &index.size())?;

        let mut updated = self.clone();
        let mut i = 0;
        let mut failure = None;
        for_each_position(&positions, &mut |at| {
            if let Err(e) = updated.set(at, source.value_at(i), default) {
                failure.get_or_insert(e);
            }
            i += 1;
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(updated),
        }
    }

    fn resize(&mut self, size: &[usize], default: Option<&Value>) -> Result<(), EvalError> {
        let (rows, cols) = match size {
            [r, c] => (*r, *c),
            other => return Err(EvalError::dimension_mismatch(other.len(), 2)),
        };
        let fill = default.filter(|v| !v.is_zero()).cloned();
        let [old_rows, old_cols] = self.size;

        let mut entries: Vec<(usize, usize, Value)> = self
            .entries()
            .filter(|(r, c, _)| *r < rows && *c < cols)
            .map(|(r, c, v)| (r, c, v.clone()))
            .collect();
        if let Some(fill) = fill {
            for j in 0..cols {
                for i in 0..rows {
                    if i >= old_rows || j >= old_cols {
                        entries.push((i, j, fill.clone()));
                    }
                }
            }
        }
        *self = SparseMatrix::from_triplets(rows, cols, entries)?;
        Ok(())
    }

    fn reshape(&mut self, size: &[usize]) -> Result<(), EvalError> {
        let (rows, cols) = match size {
            [r, c] => (*r, *c),
            other => return Err(EvalError::dimension_mismatch(other.len(), 2)),
        };
        let [old_rows, old_cols] = self.size;
        if rows * cols != old_rows * old_cols {
            return Err(EvalError::Dimension(format!(
                "Cannot reshape {:?} into {:?}: element counts differ",
                self.size, size
            )));
        }
        let entries: Vec<(usize, usize, Value)> = self
            .entries()
            .map(|(r, c, v)| {
                let linear = r * old_cols + c;
                (linear / cols, linear % cols, v.clone())
            })
            .collect();
        *self = SparseMatrix::from_triplets(rows, cols, entries)?;
        Ok(())
    }

    fn map(
        &self,
        f: &mut dyn FnMut(&Value, &[usize]) -> Result<Value, EvalError>,
    ) -> Result<Self, EvalError> {
        let [rows, cols] = self.size;
        let mut mapped = SparseMatrix::empty(rows, cols);
        for j in 0..cols {
            for i in 0..rows {
                let current = self.get(&[i, j])?;
                mapped.store(i, j, f(&current, &[i, j])?);
            }
        }
        Ok(mapped)
    }

    fn for_each(&self, f: &mut dyn FnMut(&Value, &[usize])) {
        let [rows, cols] = self.size;
        let zero = Value::Number(0.0);
        for i in 0..rows {
            for j in 0..cols {
                match self.locate(i, j) {
                    Ok(k) => f(&self.values[k], &[i, j]),
                    Err(_) => f(&zero, &[i, j]),
                }
            }
        }
    }

    fn to_array(&self) -> Value {
        self.to_dense().to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    fn diagonal() -> SparseMatrix {
        SparseMatrix::from_triplets(3, 3, vec![(0, 0, n(1.0)), (1, 1, n(2.0)), (2, 2, n(3.0))]).unwrap()
    }

    fn assert_invariants(m: &SparseMatrix) {
        assert_eq!(m.ptr.len(), m.size[1] + 1);
        assert_eq!(m.ptr[m.size[1]], m.values.len());
        assert_eq!(m.index.len(), m.values.len());
        for j in 0..m.size[1] {
            let rows = &m.index[m.ptr[j]..m.ptr[j + 1]];
            assert!(rows.windows(2).all(|w| w[0] < w[1]));
        }
        assert!(m.values.iter().all(|v| !v.is_zero()));
    }

    #[test]
    fn test_zeros_are_not_stored() {
        let m = SparseMatrix::from_triplets(2, 2, vec![(0, 1, n(0.0)), (1, 0, n(4.0))]).unwrap();
        assert_eq!(m.nnz(), 1);
        assert_eq!(m.density(), 0.25);
        assert_invariants(&m);
    }

    #[test]
    fn test_set_to_zero_removes_entry() {
        let mut m = diagonal();
        m.set(&[1, 1], n(0.0), None).unwrap();
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.get(&[1, 1]).unwrap(), n(0.0));
        assert_invariants(&m);
    }

    #[test]
    fn test_set_out_of_bounds_grows() {
        let mut m = diagonal();
        m.set(&[4, 0], n(7.0), None).unwrap();
        assert_eq!(m.size(), vec![5, 3]);
        assert_eq!(m.get(&[4, 0]).unwrap(), n(7.0));
        assert_invariants(&m);
    }

    #[test]
    fn test_dense_round_trip() {
        let m = diagonal();
        let back = SparseMatrix::from_dense(&m.to_dense()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_reshape_row_major() {
        let mut m = SparseMatrix::from_triplets(2, 2, vec![(0, 1, n(5.0)), (1, 0, n(6.0))]).unwrap();
        m.reshape(&[1, 4]).unwrap();
        assert_eq!(m.get(&[0, 1]).unwrap(), n(5.0));
        assert_eq!(m.get(&[0, 2]).unwrap(), n(6.0));
        assert_invariants(&m);
    }

    #[test]
    fn test_vector_becomes_column() {
        let v = Value::Array(vec![n(1.0), n(0.0), n(2.0)]);
        let m = SparseMatrix::from_value(&v).unwrap();
        assert_eq!(m.size(), vec![3, 1]);
        assert_eq!(m.nnz(), 2);
    }
}
