//! Regex rewriting of plain expression text into LaTeX.
//!
//! This works on the raw string and never parses it, so it accepts notation
//! the parser rejects (`a // b` for a stacked fraction, `\int`, `^T`). The
//! rules run in a fixed order; fractions are resolved before parentheses are
//! turned into `\left(`/`\right)` so a parenthesised side can be unwrapped.

use std::sync::LazyLock;

use regex::{Captures, Regex};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("pretty-printer pattern compiles")
}

static BAR: LazyLock<Regex> = LazyLock::new(|| re(r"\|"));
static GEQ: LazyLock<Regex> = LazyLock::new(|| re(r">="));
static LEQ: LazyLock<Regex> = LazyLock::new(|| re(r"<="));
static FRAC: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(\((.+?)\)|[^+\-*/()=\s|]+)//(\((.+?)\)|[^\s+\-*/=|()]+)")
});
static OPEN: LazyLock<Regex> = LazyLock::new(|| re(r"\("));
static CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r"\)"));
static TRIG: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(\\?)\b(arc)?(sinh|cosh|tanh|coth|sin|cos|tan|cot|sec|csc)\b")
});
static NEQ: LazyLock<Regex> = LazyLock::new(|| re(r"!=|/=|=/"));
static INT: LazyLock<Regex> = LazyLock::new(|| re(r"\\int\b"));
static TIMES: LazyLock<Regex> = LazyLock::new(|| re(r"\*"));
static TRANSPOSE: LazyLock<Regex> = LazyLock::new(|| re(r"\^T\b"));
static GROUP: LazyLock<Regex> = LazyLock::new(|| re(r"\^G\b"));
static RING: LazyLock<Regex> = LazyLock::new(|| re(r"\^r\b"));
static DEG: LazyLock<Regex> = LazyLock::new(|| re(r"\\deg\b"));
static EXP: LazyLock<Regex> = LazyLock::new(|| re(r"\\E\b"));

/// Rewrite `input` into LaTeX source.
pub fn to_tex(input: &str) -> String {
    let mut out = BAR.replace_all(input, r"\Bigg{|}").into_owned();
    out = GEQ.replace_all(&out, r"\geq").into_owned();
    out = LEQ.replace_all(&out, r"\leq").into_owned();
    out = FRAC.replace_all(&out, fraction).into_owned();
    out = OPEN.replace_all(&out, r"\left(").into_owned();
    out = CLOSE.replace_all(&out, r"\right)").into_owned();
    out = TRIG.replace_all(&out, trig).into_owned();
    out = NEQ.replace_all(&out, r"\neq").into_owned();
    out = INT.replace_all(&out, r"\int\limits").into_owned();
    out = TIMES.replace_all(&out, r"\cdot ").into_owned();
    out = TRANSPOSE.replace_all(&out, r"^\intercal").into_owned();
    out = GROUP.replace_all(&out, r"^\mathsf{G}").into_owned();
    out = RING.replace_all(&out, r"^\mathsf{r}").into_owned();
    out = DEG.replace_all(&out, "˚").into_owned();
    out = EXP.replace_all(&out, r"\mathrm{\scriptsize{E}}").into_owned();
    log::trace!("pretty-printed {input:?} as {out:?}");
    out
}

fn fraction(caps: &Captures<'_>) -> String {
    let side = |whole: usize, inner: usize| {
        caps.get(inner)
            .or_else(|| caps.get(whole))
            .map_or("", |m| m.as_str())
    };
    format!(r"\frac{{{}}}{{{}}}", side(1, 2), side(3, 4))
}

fn trig(caps: &Captures<'_>) -> String {
    let name = caps.get(3).map_or("", |m| m.as_str());
    if caps.get(1).is_some_and(|m| !m.is_empty()) {
        // already a control word
        let arc = caps.get(2).map_or("", |m| m.as_str());
        return format!(r"\{arc}{name}");
    }
    if caps.get(2).is_some() {
        format!(r"\{name}^{{-1}}")
    } else {
        format!(r"\{name}")
    }
}
