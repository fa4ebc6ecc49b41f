//! Physical units resolved for symbols that are not otherwise defined.
//!
//! A symbol such as `cm` evaluates to a valueless unit; multiplying a number
//! by it (`5 cm`) gives a valued unit, and `to` converts between units of the
//! same dimension.

use std::fmt;

use crate::error::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Angle,
    Length,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Angle => "angle",
            Dimension::Length => "length",
        }
    }
}

#[derive(Debug, PartialEq)]
struct UnitDef {
    name: &'static str,
    dimension: Dimension,
    /// Size of one unit in the base unit of its dimension (rad, m)
    factor: f64,
}

static UNITS: &[UnitDef] = &[
    UnitDef { name: "rad", dimension: Dimension::Angle, factor: 1.0 },
    UnitDef { name: "deg", dimension: Dimension::Angle, factor: std::f64::consts::PI / 180.0 },
    UnitDef { name: "grad", dimension: Dimension::Angle, factor: std::f64::consts::PI / 200.0 },
    UnitDef { name: "m", dimension: Dimension::Length, factor: 1.0 },
    UnitDef { name: "cm", dimension: Dimension::Length, factor: 0.01 },
    UnitDef { name: "mm", dimension: Dimension::Length, factor: 0.001 },
    UnitDef { name: "km", dimension: Dimension::Length, factor: 1000.0 },
    UnitDef { name: "in", dimension: Dimension::Length, factor: 0.0254 },
    UnitDef { name: "ft", dimension: Dimension::Length, factor: 0.3048 },
];

/// A unit with an optional value expressed in that unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    def: &'static UnitDef,
    value: Option<f64>,
}

impl Unit {
    /// Valueless unit with the given name.
    pub fn lookup(name: &str) -> Option<Unit> {
        UNITS
            .iter()
            .find(|def| def.name == name)
            .map(|def| Unit { def, value: None })
    }

    pub fn is_unit(name: &str) -> bool {
        UNITS.iter().any(|def| def.name == name)
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn dimension(&self) -> Dimension {
        self.def.dimension
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    #[must_use]
    pub fn with_value(&self, value: f64) -> Unit {
        Unit {
            def: self.def,
            value: Some(value),
        }
    }

    /// Value in the base unit of the dimension.
    pub fn base_value(&self) -> f64 {
        self.value.unwrap_or(1.0) * self.def.factor
    }

    pub fn to(&self, target: &Unit) -> Result<Unit, EvalError> {
        if target.value.is_some() {
            return Err(EvalError::Type(
                "Cannot convert to a unit that has a value".into(),
            ));
        }
        self.check_dimension(target)?;
        Ok(target.with_value(self.base_value() / target.def.factor))
    }

    /// Same-dimension sum, expressed in the unit of `self`.
    pub fn add(&self, other: &Unit, sign: f64) -> Result<Unit, EvalError> {
        self.check_dimension(other)?;
        let sum = self.base_value() + sign * other.base_value();
        Ok(self.with_value(sum / self.def.factor))
    }

    #[must_use]
    pub fn scale(&self, factor: f64) -> Unit {
        self.with_value(self.value.unwrap_or(1.0) * factor)
    }

    fn check_dimension(&self, other: &Unit) -> Result<(), EvalError> {
        if self.def.dimension != other.def.dimension {
            return Err(EvalError::Type(format!(
                "Units do not match ({} != {})",
                self.def.dimension.as_str(),
                other.def.dimension.as_str()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{} {}", crate::output::format_number(v), self.def.name),
            None => f.write_str(self.def.name),
        }
    }
}
