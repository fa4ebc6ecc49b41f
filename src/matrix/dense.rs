use crate::error::EvalError;
use crate::matrix::index::for_each_position;
use crate::matrix::{Index, Matrix, StorageFormat, index_positions, replacement_for};
use crate::value::Value;

/// N-dimensional matrix stored as a flat row-major vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    data: Vec<Value>,
    size: Vec<usize>,
}

fn strides(size: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; size.len()];
    for d in (0..size.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * size[d + 1];
    }
    strides
}

impl DenseMatrix {
    pub fn from_parts(data: Vec<Value>, size: Vec<usize>) -> Result<Self, EvalError> {
        let expected: usize = size.iter().product();
        if data.len() != expected {
            return Err(EvalError::dimension_mismatch(data.len(), expected));
        }
        Ok(DenseMatrix { data, size })
    }

    /// Matrix of the given size filled with `value`.
    pub fn filled(size: Vec<usize>, value: Value) -> Self {
        let count = size.iter().product();
        DenseMatrix {
            data: vec![value; count],
            size,
        }
    }

    /// Build from a (possibly nested) array value. Nested arrays must be
    /// rectangular.
    pub fn from_value(value: &Value) -> Result<Self, EvalError> {
        match value {
            Value::Array(items) => {
                let mut size = Vec::new();
                measure(items, &mut size);
                let mut data = Vec::new();
                flatten_checked(items, &size, 0, &mut data)?;
                Ok(DenseMatrix { data, size })
            }
            Value::Matrix(m) => Ok(m.to_dense()),
            scalar => Ok(DenseMatrix {
                data: vec![scalar.clone()],
                size: vec![1],
            }),
        }
    }

    pub fn data(&self) -> &[Value] {
        &self.data
    }

    pub fn into_data(self) -> Vec<Value> {
        self.data
    }

    fn offset(&self, index: &[usize]) -> Result<usize, EvalError> {
        if index.len() != self.size.len() {
            return Err(EvalError::dimension_mismatch(index.len(), self.size.len()));
        }
        let mut offset = 0;
        for ((&i, &n), stride) in index.iter().zip(&self.size).zip(strides(&self.size)) {
            if i >= n {
                return Err(EvalError::index_out_of_range(i, n));
            }
            offset += i * stride;
        }
        Ok(offset)
    }

    fn position_of(&self, mut offset: usize) -> Vec<usize> {
        let mut position = vec![0; self.size.len()];
        for (d, stride) in strides(&self.size).into_iter().enumerate() {
            if stride > 0 {
                position[d] = offset / stride;
                offset %= stride;
            }
        }
        position
    }

    /// Swap the two axes of a 2-D matrix; vectors are returned unchanged.
    pub fn transpose(&self) -> Result<Self, EvalError> {
        match self.size.as_slice() {
            [_] => Ok(self.clone()),
            [rows, cols] => {
                let (rows, cols) = (*rows, *cols);
                let mut data = Vec::with_capacity(self.data.len());
                for j in 0..cols {
                    for i in 0..rows {
                        data.push(self.data[i * cols + j].clone());
                    }
                }
                Ok(DenseMatrix {
                    data,
                    size: vec![cols, rows],
                })
            }
            other => Err(EvalError::Dimension(format!(
                "Matrix must be a vector or two dimensional (size: {other:?})"
            ))),
        }
    }
}

fn measure(items: &[Value], size: &mut Vec<usize>) {
    size.push(items.len());
    if let Some(Value::Array(inner)) = items.first() {
        measure(inner, size);
    }
}

fn flatten_checked(
    items: &[Value],
    size: &[usize],
    depth: usize,
    out: &mut Vec<Value>,
) -> Result<(), EvalError> {
    if items.len() != size[depth] {
        return Err(EvalError::dimension_mismatch(items.len(), size[depth]));
    }
    let last = depth + 1 == size.len();
    for item in items {
        match (item, last) {
            (Value::Array(inner), false) => flatten_checked(inner, size, depth + 1, out)?,
            (Value::Array(inner), true) => {
                return Err(EvalError::dimension_mismatch(inner.len(), 0));
            }
            (_, false) => return Err(EvalError::dimension_mismatch(0, size[depth + 1])),
            (scalar, true) => out.push(scalar.clone()),
        }
    }
    Ok(())
}

fn nest(data: &[Value], size: &[usize]) -> Value {
    match size {
        [] => data.first().cloned().unwrap_or(Value::Undefined),
        [_] => Value::Array(data.to_vec()),
        [n, rest @ ..] => {
            let chunk: usize = rest.iter().product();
            Value::Array(
                (0..*n)
                    .map(|i| nest(&data[i * chunk..(i + 1) * chunk], rest))
                    .collect(),
            )
        }
    }
}

pub(crate) fn common_datatype<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<&'static str> {
    let mut datatype = None;
    for value in values {
        let tag = match value {
            Value::Number(_) => "number",
            Value::BigNumber(_) => "BigNumber",
            _ => return None,
        };
        match datatype {
            None => datatype = Some(tag),
            Some(existing) if existing != tag => return None,
            _ => {}
        }
    }
    datatype
}

impl Matrix for DenseMatrix {
    fn storage(&self) -> StorageFormat {
        StorageFormat::Dense
    }

    fn datatype(&self) -> Option<&'static str> {
        common_datatype(&self.data)
    }

    fn size(&self) -> Vec<usize> {
        self.size.clone()
    }

    fn get(&self, index: &[usize]) -> Result<Value, EvalError> {
        let offset = self.offset(index)?;
        Ok(self.data[offset].clone())
    }

    fn set(&mut self, index: &[usize], value: Value, default: Option<&Value>) -> Result<(), EvalError> {
        if index.len() != self.size.len() {
            return Err(EvalError::dimension_mismatch(index.len(), self.size.len()));
        }
        if index.iter().zip(&self.size).any(|(i, n)| i >= n) {
            let grown: Vec<usize> = index
                .iter()
                .zip(&self.size)
                .map(|(&i, &n)| n.max(i + 1))
                .collect();
            self.resize(&grown, default)?;
        }
        let offset = self.offset(index)?;
        self.data[offset] = value;
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
            let at: Vec<usize> = positions.iter().map(|p| p[0]).collect();
            return self.get(&at);
        }

        let mut data = Vec::new();
        let mut failure = None;
        for_each_position(&positions, &mut |at| match self.get(at) {
            Ok(v) => data.push(v),
            Err(e) => {
                failure.get_or_insert(e);
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
        let size: Vec<usize> = positions.iter().map(Vec::len).collect();
        Ok(Value::Matrix(crate::matrix::MatrixValue::Dense(DenseMatrix::from_parts(data, size)?)))
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
        let grown: Vec<usize> = positions
            .iter()
            .zip(&self.size)
            .map(|(selected, &n)| selected.iter().map(|p| p + 1).max().unwrap_or(0).max(n))
            .collect();
        if grown != self.size {
            updated.resize(&grown, default)?;
        }

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
        let fill = default.cloned().unwrap_or(Value::Number(0.0));
        let mut resized = DenseMatrix::filled(size.to_vec(), fill);
        for (offset, value) in self.data.iter().enumerate() {
            let old = self.position_of(offset);
            let mut target = Vec::with_capacity(size.len());
            let mut fits = true;
            for d in 0..size.len().max(old.len()) {
                let coordinate = old.get(d).copied().unwrap_or(0);
                match size.get(d) {
                    Some(&n) if coordinate < n => target.push(coordinate),
                    None if coordinate == 0 => {}
                    _ => {
                        fits = false;
                        break;
                    }
                }
            }
            if fits {
                let at = resized.offset(&target)?;
                resized.data[at] = value.clone();
            }
        }
        *self = resized;
        Ok(())
    }

    fn reshape(&mut self, size: &[usize]) -> Result<(), EvalError> {
        let count: usize = size.iter().product();
        if count != self.data.len() {
            return Err(EvalError::Dimension(format!(
                "Cannot reshape {:?} into {:?}: element counts differ",
                self.size, size
            )));
        }
        self.size = size.to_vec();
        Ok(())
    }

    fn map(
        &self,
        f: &mut dyn FnMut(&Value, &[usize]) -> Result<Value, EvalError>,
    ) -> Result<Self, EvalError> {
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(offset, value)| f(value, &self.position_of(offset)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DenseMatrix {
            data,
            size: self.size.clone(),
        })
    }

    fn for_each(&self, f: &mut dyn FnMut(&Value, &[usize])) {
        for (offset, value) in self.data.iter().enumerate() {
            f(value, &self.position_of(offset));
        }
    }

    fn to_array(&self) -> Value {
        nest(&self.data, &self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{IndexDimension, Range};

    fn grid() -> DenseMatrix {
        let rows = Value::Array(vec![
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]),
            Value::Array(vec![Value::Number(3.0), Value::Number(4.0)]),
        ]);
        DenseMatrix::from_value(&rows).unwrap()
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let ragged = Value::Array(vec![
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]),
            Value::Array(vec![Value::Number(3.0)]),
        ]);
        assert!(DenseMatrix::from_value(&ragged).is_err());
    }

    #[test]
    fn test_subset_scalar_and_row() {
        let m = grid();
        let index = Index::new(vec![IndexDimension::Scalar(1), IndexDimension::Scalar(0)]);
        assert_eq!(m.subset(&index).unwrap(), Value::Number(3.0));

        let row = Index::new(vec![
            IndexDimension::Scalar(0),
            IndexDimension::Range(Range::new(0.0, 2.0, 1.0).unwrap()),
        ]);
        let Value::Matrix(sub) = m.subset(&row).unwrap() else {
            panic!("expected matrix");
        };
        assert_eq!(sub.size(), vec![1, 2]);
    }

    #[test]
    fn test_set_grows_with_default() {
        let mut m = grid();
        m.set(&[2, 2], Value::Number(9.0), None).unwrap();
        assert_eq!(m.size(), vec![3, 3]);
        assert_eq!(m.get(&[2, 1]).unwrap(), Value::Number(0.0));
        assert_eq!(m.get(&[0, 1]).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_reshape_keeps_row_major_order() {
        let mut m = grid();
        m.reshape(&[4]).unwrap();
        assert_eq!(m.get(&[2]).unwrap(), Value::Number(3.0));
        assert!(m.reshape(&[3]).is_err());
    }

    #[test]
    fn test_transpose() {
        let t = grid().transpose().unwrap();
        assert_eq!(t.get(&[0, 1]).unwrap(), Value::Number(3.0));
    }
}
