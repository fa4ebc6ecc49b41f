//! LaTeX tables used by the renderer: symbol names, operator glyphs and
//! per-function templates.
//!
//! Templates use `${name}` for the function name, `${args}` for every
//! argument joined with commas, `${args[i]}` for a single argument and `$$`
//! for a literal dollar sign.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::ast::OperatorFn;

static SYMBOLS: &[(&str, &str)] = &[
    ("Alpha", "A"),
    ("alpha", r"\alpha"),
    ("Beta", "B"),
    ("beta", r"\beta"),
    ("Gamma", r"\Gamma"),
    ("gamma", r"\gamma"),
    ("Delta", r"\Delta"),
    ("delta", r"\delta"),
    ("Epsilon", "E"),
    ("epsilon", r"\epsilon"),
    ("varepsilon", r"\varepsilon"),
    ("Zeta", "Z"),
    ("zeta", r"\zeta"),
    ("Eta", "H"),
    ("eta", r"\eta"),
    ("Theta", r"\Theta"),
    ("theta", r"\theta"),
    ("vartheta", r"\vartheta"),
    ("Iota", "I"),
    ("iota", r"\iota"),
    ("Kappa", "K"),
    ("kappa", r"\kappa"),
    ("varkappa", r"\varkappa"),
    ("Lambda", r"\Lambda"),
    ("lambda", r"\lambda"),
    ("Mu", "M"),
    ("mu", r"\mu"),
    ("Nu", "N"),
    ("nu", r"\nu"),
    ("Xi", r"\Xi"),
    ("xi", r"\xi"),
    ("Omicron", "O"),
    ("omicron", "o"),
    ("Pi", r"\Pi"),
    ("pi", r"\pi"),
    ("varpi", r"\varpi"),
    ("Rho", "P"),
    ("rho", r"\rho"),
    ("varrho", r"\varrho"),
    ("Sigma", r"\Sigma"),
    ("sigma", r"\sigma"),
    ("varsigma", r"\varsigma"),
    ("Tau", "T"),
    ("tau", r"\tau"),
    ("Upsilon", r"\Upsilon"),
    ("upsilon", r"\upsilon"),
    ("Phi", r"\Phi"),
    ("phi", r"\phi"),
    ("varphi", r"\varphi"),
    ("Chi", "X"),
    ("chi", r"\chi"),
    ("Psi", r"\Psi"),
    ("psi", r"\psi"),
    ("Omega", r"\Omega"),
    ("omega", r"\omega"),
    ("true", r"\mathrm{True}"),
    ("false", r"\mathrm{False}"),
    ("i", "i"),
    ("inf", r"\infty"),
    ("Inf", r"\infty"),
    ("infinity", r"\infty"),
    ("Infinity", r"\infty"),
    ("oo", r"\infty"),
    ("lim", r"\lim"),
    ("undefined", r"\mathbf{?}"),
];

static UNIT_SYMBOLS: &[(&str, &str)] = &[("deg", "˚")];

pub fn symbol(name: &str) -> Option<&'static str> {
    SYMBOLS.iter().find(|(n, _)| *n == name).map(|(_, tex)| *tex)
}

/// LaTeX for a symbol name. `alpha_1` renders as `\alpha_{1}`; units render
/// upright.
pub fn to_symbol(name: &str, is_unit: bool) -> String {
    if is_unit {
        return match UNIT_SYMBOLS.iter().find(|(n, _)| *n == name) {
            Some((_, tex)) => tex.to_string(),
            None => format!(r"\mathrm{{{name}}}"),
        };
    }
    if let Some(tex) = symbol(name) {
        return tex.to_string();
    }
    match name.split_once('_') {
        Some((base, sub)) => format!("{}_{{{}}}", to_symbol(base, false), to_symbol(sub, false)),
        None => name.to_string(),
    }
}

pub fn operator(op: OperatorFn) -> &'static str {
    match op {
        OperatorFn::Transpose => r"^\intercal",
        OperatorFn::Factorial => "!",
        OperatorFn::Pow => "^",
        OperatorFn::DotPow => r".^\wedge",
        OperatorFn::UnaryPlus => "+",
        OperatorFn::UnaryMinus => "-",
        OperatorFn::BitNot => "~",
        OperatorFn::Not => r"\neg",
        OperatorFn::Multiply => r"\cdot",
        OperatorFn::Divide => r"\frac",
        OperatorFn::DotMultiply => r".\cdot",
        OperatorFn::DotDivide => "./",
        OperatorFn::Mod => r"\mod",
        OperatorFn::Add => "+",
        OperatorFn::Subtract => "-",
        OperatorFn::To => r"\rightarrow",
        OperatorFn::LeftShift => "<<",
        OperatorFn::RightArithShift => ">>",
        OperatorFn::RightLogShift => ">>>",
        OperatorFn::Equal => "=",
        OperatorFn::Unequal => r"\neq",
        OperatorFn::Smaller => "<",
        OperatorFn::Larger => ">",
        OperatorFn::SmallerEq => r"\leq",
        OperatorFn::LargerEq => r"\geq",
        OperatorFn::BitAnd => r"\&",
        OperatorFn::BitXor => r"\underline{|}",
        OperatorFn::BitOr => "|",
        OperatorFn::And => r"\wedge",
        OperatorFn::Xor => r"\veebar",
        OperatorFn::Or => r"\vee",
    }
}

pub const DEFAULT_TEMPLATE: &str = r"\mathrm{${name}}\left(${args}\right)";

/// Template for `name` called with `arity` arguments. `None` for functions
/// that use [`DEFAULT_TEMPLATE`].
pub fn function_template(name: &str, arity: usize) -> Option<&'static str> {
    let template = match (name, arity) {
        ("abs", 1) => r"\left|${args[0]}\right|",
        ("sqrt", 1) => r"\sqrt{${args[0]}}",
        ("exp", 1) => r"\exp\left(${args[0]}\right)",
        ("log", 1) => r"\ln\left(${args[0]}\right)",
        ("log", 2) => r"\log_{${args[1]}}\left(${args[0]}\right)",
        ("sin", 1) => r"\sin\left(${args[0]}\right)",
        ("cos", 1) => r"\cos\left(${args[0]}\right)",
        ("tan", 1) => r"\tan\left(${args[0]}\right)",
        ("asin", 1) => r"\sin^{-1}\left(${args[0]}\right)",
        ("acos", 1) => r"\cos^{-1}\left(${args[0]}\right)",
        ("atan", 1) => r"\tan^{-1}\left(${args[0]}\right)",
        ("floor", 1) => r"\left\lfloor${args[0]}\right\rfloor",
        ("ceil", 1) => r"\left\lceil${args[0]}\right\rceil",
        ("round", 1) => r"\left\lfloor${args[0]}\right\rceil",
        ("round", 2) => r"\left\lfloor${args[0]}\right\rceil_{${args[1]}}",
        ("min", _) => r"\min\left(${args}\right)",
        ("max", _) => r"\max\left(${args}\right)",
        ("add", 2) => r"\left(${args[0]}+${args[1]}\right)",
        ("subtract", 2) => r"\left(${args[0]}-${args[1]}\right)",
        ("multiply", 2) => r"\left(${args[0]}\cdot${args[1]}\right)",
        ("divide", 2) => r"\frac{${args[0]}}{${args[1]}}",
        ("mod", 2) => r"\left(${args[0]}\mod${args[1]}\right)",
        ("pow", 2) => r"\left(${args[0]}\right)^{${args[1]}}",
        ("unaryMinus", 1) => r"-\left(${args[0]}\right)",
        ("factorial", 1) => r"\left(${args[0]}\right)!",
        ("transpose", 1) => r"\left(${args[0]}\right)^\top",
        ("to", 2) => r"\left(${args[0]}\rightarrow${args[1]}\right)",
        ("matrix", 0) => r"\begin{bmatrix}\end{bmatrix}",
        _ => return None,
    };
    Some(template)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Template: {0} is not a template property")]
    UnknownProperty(String),

    #[error("Template: {0}[{1}] is not a Node.")]
    MissingArgument(String, usize),
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$(?:\{([a-z_][a-z_0-9]*)(?:\[([0-9]+)\])?\}|\$)")
        .expect("template placeholder pattern compiles")
});

/// Expand `template` for a call of `name` whose arguments are already
/// rendered as `args`.
pub fn expand_template(template: &str, name: &str, args: &[String]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        out.push_str(&template[last..whole.start]);
        last = whole.end;
        out.push_str(&placeholder(&caps, name, args)?);
    }
    out.push_str(&template[last..]);
    Ok(out)
}

fn placeholder(caps: &Captures<'_>, name: &str, args: &[String]) -> Result<String, TemplateError> {
    let Some(property) = caps.get(1).map(|m| m.as_str()) else {
        return Ok("$".to_string());
    };
    let position = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok());
    match (property, position) {
        ("name", None) => Ok(name.to_string()),
        ("args", None) => Ok(args.join(",")),
        ("args", Some(i)) => args
            .get(i)
            .cloned()
            .ok_or_else(|| TemplateError::MissingArgument(property.to_string(), i)),
        _ => Err(TemplateError::UnknownProperty(property.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscripted_symbol() {
        assert_eq!(to_symbol("alpha_1", false), r"\alpha_{1}");
        assert_eq!(to_symbol("x", false), "x");
        assert_eq!(to_symbol("deg", true), "˚");
        assert_eq!(to_symbol("cm", true), r"\mathrm{cm}");
    }

    #[test]
    fn test_expand_default_template() {
        let args = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            expand_template(DEFAULT_TEMPLATE, "f", &args).unwrap(),
            r"\mathrm{f}\left(a,b\right)"
        );
    }

    #[test]
    fn test_expand_indexed_argument() {
        let args = vec!["x".to_string(), "2".to_string()];
        let template = function_template("log", 2).unwrap();
        assert_eq!(expand_template(template, "log", &args).unwrap(), r"\log_{2}\left(x\right)");
        assert_eq!(expand_template("$$", "f", &[]).unwrap(), "$");
    }

    #[test]
    fn test_missing_argument() {
        let err = expand_template(r"\sqrt{${args[1]}}", "sqrt", &["x".to_string()]).unwrap_err();
        assert_eq!(err, TemplateError::MissingArgument("args".into(), 1));
    }
}
