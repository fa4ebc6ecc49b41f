//! Evaluator configuration.

/// How numeric literals are represented once compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberMode {
    /// 64-bit floating point
    #[default]
    Number,
    /// Arbitrary precision decimal
    BigNumber,
}

impl std::str::FromStr for NumberMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number" => Ok(NumberMode::Number),
            "BigNumber" | "bignumber" => Ok(NumberMode::BigNumber),
            other => Err(format!("Unknown number mode: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub number: NumberMode,
    /// Deepest bracket or operator nesting the parser accepts
    pub max_parse_depth: usize,
    /// Deepest chain of user-defined function calls and `eval` the evaluator
    /// accepts
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            number: NumberMode::Number,
            max_parse_depth: 64,
            max_call_depth: 128,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_number(mut self, number: NumberMode) -> Self {
        self.number = number;
        self
    }

    #[must_use]
    pub fn with_max_parse_depth(mut self, depth: usize) -> Self {
        self.max_parse_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}
