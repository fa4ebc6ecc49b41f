//! Text formatting of runtime values.
//!
//! This is the formatter behind `Display for Value`. Numbers print the way a
//! calculator shows them: rounded to a fixed number of significant digits,
//! integers without a decimal point, and exponent notation only for very
//! large or very small magnitudes.
//!
//! # Examples
//!
//! ```
//! use graphcalc::Value;
//! use graphcalc::output::{format_number, format_value};
//!
//! assert_eq!(format_number(0.1 + 0.2), "0.3");
//! assert_eq!(format_number(1e21), "1e+21");
//!
//! let v = Value::Array(vec![Value::Number(1.0), Value::String("a".into())]);
//! assert_eq!(format_value(&v), "[1, \"a\"]");
//! ```

use std::collections::BTreeMap;

use crate::compiler::Function;
use crate::matrix::Matrix;
use crate::value::Value;

/// Significant digits used when printing numbers.
pub const DEFAULT_PRECISION: usize = 14;

pub struct ValuePrinter {
    precision: usize,
}

impl ValuePrinter {
    pub fn new(precision: usize) -> Self {
        ValuePrinter {
            precision: precision.clamp(1, 17),
        }
    }

    pub fn print(&self, value: &Value) -> String {
        self.print_value(value)
    }

    fn print_value(&self, value: &Value) -> String {
        match value {
            Value::Number(n) => self.print_number(*n),
            Value::BigNumber(d) => d.normalize().to_string(),
            Value::String(s) => format!("\"{}\"", escape_string(s)),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Undefined => "undefined".to_string(),
            Value::Array(items) | Value::ResultSet(items) => self.print_array(items),
            Value::Matrix(m) => self.print_value(&m.to_array()),
            Value::Range(r) => r.to_string(),
            Value::Index(i) => i.to_string(),
            Value::Object(obj) => self.print_object(obj),
            Value::Function(f) => print_function(f),
            Value::Unit(u) => match u.value() {
                Some(v) => format!("{} {}", self.print_number(v), u.name()),
                None => u.name().to_string(),
            },
            Value::Node(node) => crate::render::to_text(node, &Default::default()),
        }
    }

    fn print_array(&self, items: &[Value]) -> String {
        let items: Vec<String> = items.iter().map(|v| self.print_value(v)).collect();
        format!("[{}]", items.join(", "))
    }

    fn print_object(&self, obj: &BTreeMap<String, Value>) -> String {
        if obj.is_empty() {
            return "{}".to_string();
        }
        let items: Vec<String> = obj
            .iter()
            .map(|(k, v)| format!("\"{}\": {}", escape_string(k), self.print_value(v)))
            .collect();
        format!("{{{}}}", items.join(", "))
    }

    pub fn print_number(&self, n: f64) -> String {
        if n.is_nan() {
            return "NaN".to_string();
        }
        if n.is_infinite() {
            return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        if n == 0.0 {
            return "0".to_string();
        }

        let scientific = format!("{:.*e}", self.precision - 1, n.abs());
        let Some((mantissa, exponent)) = scientific.split_once('e') else {
            return n.to_string();
        };
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
        let digits = digits.trim_end_matches('0');
        let sign = if n < 0.0 { "-" } else { "" };

        if !(-6..21).contains(&exponent) {
            let (head, tail) = digits.split_at(1);
            let fraction = if tail.is_empty() {
                String::new()
            } else {
                format!(".{tail}")
            };
            let exp_sign = if exponent > 0 { "+" } else { "-" };
            return format!("{sign}{head}{fraction}e{exp_sign}{}", exponent.abs());
        }

        if exponent < 0 {
            let zeros = "0".repeat((-exponent - 1) as usize);
            return format!("{sign}0.{zeros}{digits}");
        }

        let whole = exponent as usize + 1;
        if digits.len() <= whole {
            format!("{sign}{digits}{}", "0".repeat(whole - digits.len()))
        } else {
            format!("{sign}{}.{}", &digits[..whole], &digits[whole..])
        }
    }
}

fn print_function(f: &Function) -> String {
    match f {
        Function::User(user) => format!("{}({})", user.name, user.params.join(", ")),
        other => other.name().to_string(),
    }
}

pub fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        })
        .collect()
}

pub fn format_value(value: &Value) -> String {
    ValuePrinter::new(DEFAULT_PRECISION).print(value)
}

pub fn format_number(n: f64) -> String {
    ValuePrinter::new(DEFAULT_PRECISION).print_number(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_have_no_fraction() {
        assert_eq!(format_number(14.0), "14");
        assert_eq!(format_number(-250.0), "-250");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn test_rounding_to_precision() {
        assert_eq!(format_number(2.0 / 3.0), "0.66666666666667");
        assert_eq!(format_number(0.000123), "0.000123");
    }

    #[test]
    fn test_exponent_notation() {
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(-2e25), "-2e+25");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a\"b\n"), "a\\\"b\\n");
    }
}
