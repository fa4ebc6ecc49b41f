use std::fmt;

use crate::error::EvalError;
use crate::value::Value;

/// Half-open numeric range `start:end` (end excluded) with a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Range {
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self, EvalError> {
        if step == 0.0 || !step.is_finite() {
            return Err(EvalError::Type(format!("Invalid range step {step}")));
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(EvalError::Type("Range bounds must be finite numbers".into()));
        }
        Ok(Range { start, end, step })
    }

    /// Number of values in the range.
    pub fn size(&self) -> usize {
        let count = ((self.end - self.start) / self.step).ceil();
        if count > 0.0 { count as usize } else { 0 }
    }

    pub fn values(&self) -> Vec<f64> {
        (0..self.size())
            .map(|i| self.start + self.step * i as f64)
            .collect()
    }

    pub fn to_array(&self) -> Value {
        Value::Array(self.values().into_iter().map(Value::Number).collect())
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.step == 1.0 {
            write!(f, "{}:{}", self.start, self.end)
        } else {
            write!(f, "{}:{}:{}", self.start, self.step, self.end)
        }
    }
}

/// One dimension of an [`Index`].
#[derive(Debug, Clone, PartialEq)]
pub enum IndexDimension {
    Scalar(usize),
    Range(Range),
    /// Explicit list of positions
    Set(Vec<usize>),
    /// Object property name
    Property(String),
}

impl IndexDimension {
    pub fn is_scalar(&self) -> bool {
        matches!(self, IndexDimension::Scalar(_) | IndexDimension::Property(_))
    }

    /// Positions selected by this dimension, in order.
    pub fn positions(&self) -> Result<Vec<usize>, EvalError> {
        match self {
            IndexDimension::Scalar(i) => Ok(vec![*i]),
            IndexDimension::Range(range) => range.values().into_iter().map(to_position).collect(),
            IndexDimension::Set(set) => Ok(set.clone()),
            IndexDimension::Property(name) => Err(EvalError::Type(format!(
                "Cannot use property \"{name}\" as a numeric index"
            ))),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            IndexDimension::Scalar(_) | IndexDimension::Property(_) => 1,
            IndexDimension::Range(range) => range.size(),
            IndexDimension::Set(set) => set.len(),
        }
    }
}

fn to_position(value: f64) -> Result<usize, EvalError> {
    if value.fract() != 0.0 || !value.is_finite() {
        return Err(EvalError::Type(format!(
            "Index must be an integer (value: {value})"
        )));
    }
    if value < 0.0 {
        return Err(EvalError::Dimension(format!("Index out of range ({value} < 0)")));
    }
    Ok(value as usize)
}

/// Zero-based multi-dimensional index.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    dimensions: Vec<IndexDimension>,
}

impl Index {
    pub fn new(dimensions: Vec<IndexDimension>) -> Self {
        Index { dimensions }
    }

    /// Build an index from evaluated dimension values: numbers, ranges,
    /// arrays of numbers or a property name.
    pub fn from_values(values: Vec<Value>) -> Result<Self, EvalError> {
        let dimensions = values
            .into_iter()
            .map(|value| match value {
                Value::Number(n) => to_position(n).map(IndexDimension::Scalar),
                Value::BigNumber(d) => {
                    to_position(crate::value::decimal_to_f64(&d)).map(IndexDimension::Scalar)
                }
                Value::Range(range) => {
                    for v in range.values() {
                        to_position(v)?;
                    }
                    Ok(IndexDimension::Range(range))
                }
                Value::Array(_) | Value::Matrix(_) => {
                    let flat = value.flatten();
                    let positions = flat
                        .iter()
                        .map(|item| match item {
                            Value::Number(n) => to_position(*n),
                            other => Err(EvalError::Type(format!(
                                "Index positions must be numbers, got {}",
                                other.type_name()
                            ))),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(IndexDimension::Set(positions))
                }
                Value::String(name) => Ok(IndexDimension::Property(name)),
                other => Err(EvalError::Type(format!(
                    "Unsupported index dimension of type {}",
                    other.type_name()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Index { dimensions })
    }

    pub fn dimensions(&self) -> &[IndexDimension] {
        &self.dimensions
    }

    pub fn dimension(&self, i: usize) -> Option<&IndexDimension> {
        self.dimensions.get(i)
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// True when every dimension selects exactly one position.
    pub fn is_scalar(&self) -> bool {
        self.dimensions.iter().all(IndexDimension::is_scalar)
    }

    pub fn size(&self) -> Vec<usize> {
        self.dimensions.iter().map(IndexDimension::size).collect()
    }

    pub fn is_object_property(&self) -> bool {
        self.object_property().is_some()
    }

    pub fn object_property(&self) -> Option<&str> {
        match self.dimensions.as_slice() {
            [IndexDimension::Property(name)] => Some(name),
            _ => None,
        }
    }

    /// Selected positions per dimension.
    pub fn positions(&self) -> Result<Vec<Vec<usize>>, EvalError> {
        self.dimensions.iter().map(IndexDimension::positions).collect()
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .dimensions
            .iter()
            .map(|dim| match dim {
                IndexDimension::Scalar(i) => i.to_string(),
                IndexDimension::Range(range) => range.to_string(),
                IndexDimension::Set(set) => format!("{set:?}"),
                IndexDimension::Property(name) => format!("{name:?}"),
            })
            .collect();
        write!(f, "[{}]", dims.join(", "))
    }
}

/// Visit every combination of positions, last dimension fastest.
pub(crate) fn for_each_position(positions: &[Vec<usize>], f: &mut dyn FnMut(&[usize])) {
    if positions.iter().any(Vec::is_empty) {
        return;
    }
    let mut cursor = vec![0usize; positions.len()];
    let mut current: Vec<usize> = positions.iter().map(|p| p[0]).collect();
    loop {
        f(&current);
        let mut dim = positions.len();
        loop {
            if dim == 0 {
                return;
            }
            dim -= 1;
            cursor[dim] += 1;
            if cursor[dim] < positions[dim].len() {
                current[dim] = positions[dim][cursor[dim]];
                break;
            }
            cursor[dim] = 0;
            current[dim] = positions[dim][0];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_excludes_end() {
        let range = Range::new(1.0, 4.0, 1.0).unwrap();
        assert_eq!(range.values(), vec![1.0, 2.0, 3.0]);
        let range = Range::new(4.0, 0.0, -2.0).unwrap();
        assert_eq!(range.values(), vec![4.0, 2.0]);
        assert_eq!(Range::new(3.0, 1.0, 1.0).unwrap().size(), 0);
    }

    #[test]
    fn test_zero_step_rejected() {
        assert!(Range::new(0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_positions_cartesian_order() {
        let mut seen = Vec::new();
        for_each_position(&[vec![0, 1], vec![5, 6]], &mut |p| seen.push(p.to_vec()));
        assert_eq!(seen, vec![vec![0, 5], vec![0, 6], vec![1, 5], vec![1, 6]]);
    }

    #[test]
    fn test_fractional_index_rejected() {
        let err = Index::from_values(vec![Value::Number(1.5)]).unwrap_err();
        assert!(matches!(err, EvalError::Type(_)));
    }
}
