/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use std::fmt;

/// A named scalar with bounds and a vary flag
///
/// The bounds are not enforced here; the solver keeps trial values inside them.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    pub lb: f64,
    pub ub: f64,
    pub vary: bool,
}

impl Parameter {
    /// A fixed, unbounded parameter
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            lb: f64::NEG_INFINITY,
            ub: f64::INFINITY,
            vary: false,
        }
    }

    pub fn with_bounds(name: &str, value: f64, lb: f64, ub: f64, vary: bool) -> Self {
        Self {
            name: name.to_string(),
            value,
            lb,
            ub,
            vary,
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        self.lb <= self.value && self.value <= self.ub
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Parameter '{}'; value: {}; bounds: [{}, {}]; vary: {}>",
            self.name, self.value, self.lb, self.ub, self.vary
        )
    }
}
