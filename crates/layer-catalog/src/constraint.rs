// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Parameter constraints checked against raw JSON values.
//!
//! Constraints are declared once per descriptor and applied during
//! validation only — shape and render rules read parameters leniently
//! through [`crate::Params`] afterwards.

use serde_json::Value;

/// The primitive kind a parameter value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Int,
    Float,
    Str,
    List,
}

impl ParamKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            ParamKind::Bool => value.is_boolean(),
            ParamKind::Int => value.is_i64() || value.is_u64(),
            // Integers are acceptable where a float is expected.
            ParamKind::Float => value.is_number(),
            ParamKind::Str => value.is_string(),
            ParamKind::List => value.is_array(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ParamKind::Bool => "a boolean",
            ParamKind::Int => "an integer",
            ParamKind::Float => "a number",
            ParamKind::Str => "a string",
            ParamKind::List => "a list",
        }
    }
}

/// A declarative constraint on one parameter.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Numeric range; either bound may be open.
    Range { min: Option<f64>, max: Option<f64> },
    /// Membership in an enumerated set of string choices.
    Choice(&'static [&'static str]),
    /// A sequence of a fixed length (`None` = any length).
    ShapeLen(Option<usize>),
    /// A primitive-kind check.
    Kind(ParamKind),
}

impl Constraint {
    /// Convenience constructor for a closed numeric range.
    pub fn range(min: f64, max: f64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Checks `value` against this constraint.
    pub fn check(&self, name: &str, value: &Value) -> Result<(), ConstraintError> {
        match self {
            Constraint::Range { min, max } => {
                let v = value.as_f64().ok_or_else(|| ConstraintError::NotNumeric {
                    name: name.to_string(),
                })?;
                let below = min.map(|m| v < m).unwrap_or(false);
                let above = max.map(|m| v > m).unwrap_or(false);
                if below || above {
                    return Err(ConstraintError::OutOfRange {
                        name: name.to_string(),
                        value: v,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(())
            }
            Constraint::Choice(values) => {
                let s = value.as_str().unwrap_or_default();
                if values.contains(&s) {
                    Ok(())
                } else {
                    Err(ConstraintError::BadChoice {
                        name: name.to_string(),
                        value: value.to_string(),
                        choices: values.join(", "),
                    })
                }
            }
            Constraint::ShapeLen(expected) => {
                let arr = value.as_array().ok_or_else(|| ConstraintError::NotASequence {
                    name: name.to_string(),
                })?;
                if let Some(len) = expected {
                    if arr.len() != *len {
                        return Err(ConstraintError::BadLength {
                            name: name.to_string(),
                            expected: *len,
                            actual: arr.len(),
                        });
                    }
                }
                Ok(())
            }
            Constraint::Kind(kind) => {
                if kind.matches(value) {
                    Ok(())
                } else {
                    Err(ConstraintError::WrongKind {
                        name: name.to_string(),
                        expected: kind.describe(),
                    })
                }
            }
        }
    }
}

/// A single constraint violation, rendered into the validation report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConstraintError {
    #[error("parameter '{name}' must be numeric")]
    NotNumeric { name: String },

    #[error("parameter '{name}' = {value} is outside the allowed range [{}, {}]",
        min.map(|m| m.to_string()).unwrap_or_else(|| "-inf".into()),
        max.map(|m| m.to_string()).unwrap_or_else(|| "inf".into()))]
    OutOfRange {
        name: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("parameter '{name}' = {value} is not one of: {choices}")]
    BadChoice {
        name: String,
        value: String,
        choices: String,
    },

    #[error("parameter '{name}' must be a sequence")]
    NotASequence { name: String },

    #[error("parameter '{name}' must be a sequence of length {expected}, got length {actual}")]
    BadLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("parameter '{name}' must be {expected}")]
    WrongKind { name: String, expected: &'static str },
}
