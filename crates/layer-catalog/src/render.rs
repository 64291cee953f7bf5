// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-layer code-rendering context and output types.
//!
//! Rendering never fails: an unsupported layer/backend combination renders
//! an explanatory comment, which the emitters place as a standalone line.

use crate::Params;
use shape_core::Shape;

/// Everything a single layer's render rule may consult.
///
/// Render rules are driven by the already-validated, shape-annotated
/// sequence — they re-validate nothing.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx<'a> {
    /// The layer's parameter map.
    pub params: Params<'a>,
    /// Resolved input shape, when shape propagation reached this layer.
    pub input_shape: Option<&'a Shape>,
    /// Resolved output shape, when computable.
    pub output_shape: Option<&'a Shape>,
    /// Position in the processing sequence (0-based; used for member names).
    pub index: usize,
    /// Whether this is the first processing layer (receives `input_shape=`).
    pub is_first: bool,
}

/// One statement for the sequential-style (Keras) emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KerasCode {
    /// A layer constructor expression, wrapped in `model.add(...)`.
    Add(String),
    /// An explanatory comment emitted as-is (unsupported combination).
    Comment(String),
}

/// One definition/forward pair for the object-style (PyTorch) emitter.
///
/// Either half may be empty: stateless layers contribute only a forward
/// statement, and annotation-only layers may contribute only comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorchCode {
    pub definition: String,
    pub forward: String,
}

impl TorchCode {
    pub fn new(definition: impl Into<String>, forward: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            forward: forward.into(),
        }
    }

    /// A forward-only statement (no persistent state).
    pub fn forward_only(forward: impl Into<String>) -> Self {
        Self::new("", forward)
    }
}

/// Renders a bool as a Python literal.
pub(crate) fn py_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// Renders a float as a Python literal (`1.0`, not `1`).
pub(crate) fn py_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Renders an integer slice as a Python list literal, e.g. `[3, 3]`.
pub(crate) fn py_list(values: &[usize]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Renders side pairs as a nested Python list, e.g. `[[1, 1], [2, 2]]`.
pub(crate) fn py_side_pairs(pairs: [[usize; 2]; 2]) -> String {
    format!(
        "[[{}, {}], [{}, {}]]",
        pairs[0][0], pairs[0][1], pairs[1][0], pairs[1][1]
    )
}

/// Renders a raw JSON parameter value as a Python literal: lists become
/// `[a, b]`, strings keep double quotes stripped to repr-style quotes,
/// booleans become `True`/`False`, null becomes `None`.
pub(crate) fn py_value(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(b) => py_bool(*b).to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{s}'"),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(py_value).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(_) => value.to_string(),
    }
}

/// The last known input dimension, rendered for a Torch constructor call.
///
/// When shape propagation could not determine it, this degrades to the bare
/// identifier `in_features`, which keeps the constructor call syntactically
/// valid; renderers pair it with [`unknown_input_note`] so the generated
/// code explains the placeholder on its own line.
pub(crate) fn torch_in_features(ctx: &RenderCtx) -> String {
    match ctx.input_shape.and_then(Shape::last) {
        Some(n) => n.to_string(),
        None => "in_features".to_string(),
    }
}

/// A standalone comment line prefixed to a definition whose input feature
/// size is unknown; empty when the size was resolved.
pub(crate) fn unknown_input_note(ctx: &RenderCtx) -> &'static str {
    if ctx.input_shape.and_then(Shape::last).is_none() {
        "# input size unknown; set in_features manually\n        "
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_py_literals() {
        assert_eq!(py_bool(true), "True");
        assert_eq!(py_float(1.0), "1.0");
        assert_eq!(py_float(0.25), "0.25");
        assert_eq!(py_list(&[3, 3]), "[3, 3]");
        assert_eq!(py_side_pairs([[1, 1], [0, 2]]), "[[1, 1], [0, 2]]");
    }

    #[test]
    fn test_py_value() {
        use serde_json::json;
        assert_eq!(py_value(&json!([7, 7, 2])), "[7, 7, 2]");
        assert_eq!(py_value(&json!([1, [2, 3]])), "[1, [2, 3]]");
        assert_eq!(py_value(&json!("relu")), "'relu'");
        assert_eq!(py_value(&json!(null)), "None");
        assert_eq!(py_value(&json!(true)), "True");
    }

    #[test]
    fn test_in_features_placeholder_is_a_bare_identifier() {
        let m = crate::params::ParamMap::new();
        let ctx = RenderCtx {
            params: Params::new(&m),
            input_shape: None,
            output_shape: None,
            index: 0,
            is_first: false,
        };
        assert_eq!(torch_in_features(&ctx), "in_features");
        assert!(unknown_input_note(&ctx).starts_with("# "));

        let known = Shape::batched(vec![784]);
        let ctx = RenderCtx {
            input_shape: Some(&known),
            ..ctx
        };
        assert_eq!(torch_in_features(&ctx), "784");
        assert_eq!(unknown_input_note(&ctx), "");
    }

    #[test]
    fn test_torch_code_forward_only() {
        let c = TorchCode::forward_only("x = F.relu(x)");
        assert!(c.definition.is_empty());
        assert_eq!(c.forward, "x = F.relu(x)");
    }
}
