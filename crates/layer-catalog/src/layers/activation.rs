// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The unified activation layer.
//!
//! One descriptor covers every supported activation function; the
//! `activation_type` parameter selects the variant and the remaining
//! parameters only apply to the variants that use them.

use serde_json::json;
use shape_core::{Shape, ShapeError};

use crate::constraint::Constraint;
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{py_float, py_value, KerasCode, RenderCtx, TorchCode};

struct Activation;

impl LayerBehavior for Activation {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        let kind = p.str_or("activation_type", "relu");
        let code = match kind {
            "relu" => {
                let mut args = Vec::new();
                if let Some(max_value) = p.raw("max_value").filter(|v| !v.is_null()) {
                    args.push(format!("max_value={}", py_value(max_value)));
                }
                let negative_slope = p.f64_or("negative_slope", 0.0);
                if negative_slope > 0.0 {
                    args.push(format!("negative_slope={}", py_float(negative_slope)));
                }
                let threshold = p.f64_or("threshold", 0.0);
                if threshold > 0.0 {
                    args.push(format!("threshold={}", py_float(threshold)));
                }
                format!("layers.ReLU({})", args.join(", "))
            }
            "leaky_relu" => {
                format!("layers.LeakyReLU(alpha={})", py_float(p.f64_or("alpha", 0.3)))
            }
            "elu" => format!("layers.ELU(alpha={})", py_float(p.f64_or("elu_alpha", 1.0))),
            "prelu" => {
                let mut args = Vec::new();
                let initializer = p.str_or("alpha_initializer", "zeros");
                if initializer != "zeros" {
                    args.push(format!("alpha_initializer='{initializer}'"));
                }
                if let Some(axes) = p.raw("shared_axes").filter(|v| !v.is_null()) {
                    args.push(format!("shared_axes={}", py_value(axes)));
                }
                format!("layers.PReLU({})", args.join(", "))
            }
            "softmax" => format!("layers.Softmax(axis={})", p.i64_or("axis", -1)),
            other => format!("layers.Activation('{other}')"),
        };
        KerasCode::Add(code)
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let i = ctx.index;
        match p.str_or("activation_type", "relu") {
            "relu" => {
                let negative_slope = p.f64_or("negative_slope", 0.0);
                if negative_slope > 0.0 {
                    TorchCode::new(
                        format!(
                            "self.activation_{i} = nn.LeakyReLU({})",
                            py_float(negative_slope)
                        ),
                        format!("x = self.activation_{i}(x)"),
                    )
                } else {
                    TorchCode::forward_only("x = F.relu(x)")
                }
            }
            "leaky_relu" => TorchCode::new(
                format!(
                    "self.activation_{i} = nn.LeakyReLU({})",
                    py_float(p.f64_or("alpha", 0.3))
                ),
                format!("x = self.activation_{i}(x)"),
            ),
            "elu" => TorchCode::new(
                format!(
                    "self.activation_{i} = nn.ELU(alpha={})",
                    py_float(p.f64_or("elu_alpha", 1.0))
                ),
                format!("x = self.activation_{i}(x)"),
            ),
            "prelu" => TorchCode::new(
                format!("self.activation_{i} = nn.PReLU()"),
                format!("x = self.activation_{i}(x)"),
            ),
            "sigmoid" => TorchCode::forward_only("x = torch.sigmoid(x)"),
            "tanh" => TorchCode::forward_only("x = torch.tanh(x)"),
            "softmax" => TorchCode::new(
                format!("self.activation_{i} = nn.Softmax(dim={})", p.i64_or("axis", -1)),
                format!("x = self.activation_{i}(x)"),
            ),
            "swish" => TorchCode::forward_only("x = x * torch.sigmoid(x)"),
            "gelu" => TorchCode::forward_only("x = F.gelu(x)"),
            "mish" => TorchCode::forward_only("x = x * torch.tanh(F.softplus(x))"),
            other => TorchCode::forward_only(format!("x = F.{other}(x)")),
        }
    }
}

pub(super) fn activation() -> LayerDescriptor {
    LayerDescriptor::new(
        "activation",
        Category::Activation,
        "standalone activation function",
        Activation,
    )
    .with_required(&["activation_type"])
    .with_optional("max_value", json!(null))
    .with_optional("negative_slope", json!(0.0))
    .with_optional("threshold", json!(0.0))
    .with_optional("alpha", json!(0.3))
    .with_optional("elu_alpha", json!(1.0))
    .with_optional("alpha_initializer", json!("zeros"))
    .with_optional("shared_axes", json!(null))
    .with_optional("axis", json!(-1))
    .with_optional("approximate", json!(false))
    .with_constraint(
        "activation_type",
        Constraint::Choice(&[
            "relu", "leaky_relu", "elu", "prelu", "sigmoid", "tanh", "softmax", "swish",
            "gelu", "mish",
        ]),
    )
    .with_constraint("max_value", Constraint::range(0.0, 100.0))
    .with_constraint("negative_slope", Constraint::range(0.0, 1.0))
    .with_constraint("threshold", Constraint::range(0.0, 10.0))
    .with_constraint("alpha", Constraint::range(0.0, 1.0))
    .with_constraint("elu_alpha", Constraint::range(0.1, 10.0))
    .with_constraint("axis", Constraint::range(-10.0, 10.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamMap;
    use serde_json::Value;

    fn map(value: Value) -> ParamMap {
        value.as_object().cloned().unwrap_or_default()
    }

    fn ctx(params: &ParamMap) -> RenderCtx<'_> {
        RenderCtx {
            params: Params::new(params),
            input_shape: None,
            output_shape: None,
            index: 4,
            is_first: false,
        }
    }

    #[test]
    fn test_shape_is_identity() {
        let d = activation();
        let input = Shape::batched(vec![26, 26, 32]);
        let m = map(json!({ "activation_type": "relu" }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_plain_relu() {
        let d = activation();
        let m = map(json!({ "activation_type": "relu" }));
        assert_eq!(d.keras(&ctx(&m)), KerasCode::Add("layers.ReLU()".to_string()));
        let torch = d.torch(&ctx(&m));
        assert!(torch.definition.is_empty());
        assert_eq!(torch.forward, "x = F.relu(x)");
    }

    #[test]
    fn test_relu_with_cap() {
        let d = activation();
        let m = map(json!({ "activation_type": "relu", "max_value": 6 }));
        assert_eq!(
            d.keras(&ctx(&m)),
            KerasCode::Add("layers.ReLU(max_value=6)".to_string())
        );
    }

    #[test]
    fn test_leaky_relu_in_both_backends() {
        let d = activation();
        let m = map(json!({ "activation_type": "leaky_relu", "alpha": 0.1 }));
        assert_eq!(
            d.keras(&ctx(&m)),
            KerasCode::Add("layers.LeakyReLU(alpha=0.1)".to_string())
        );
        let torch = d.torch(&ctx(&m));
        assert_eq!(torch.definition, "self.activation_4 = nn.LeakyReLU(0.1)");
    }

    #[test]
    fn test_softmax_axis() {
        let d = activation();
        let m = map(json!({ "activation_type": "softmax" }));
        assert_eq!(
            d.keras(&ctx(&m)),
            KerasCode::Add("layers.Softmax(axis=-1)".to_string())
        );
        let torch = d.torch(&ctx(&m));
        assert_eq!(torch.definition, "self.activation_4 = nn.Softmax(dim=-1)");
    }

    #[test]
    fn test_stateless_functions_are_forward_only() {
        let d = activation();
        for (kind, expected) in [
            ("sigmoid", "x = torch.sigmoid(x)"),
            ("swish", "x = x * torch.sigmoid(x)"),
            ("gelu", "x = F.gelu(x)"),
            ("mish", "x = x * torch.tanh(F.softplus(x))"),
        ] {
            let m = map(json!({ "activation_type": kind }));
            let torch = d.torch(&ctx(&m));
            assert!(torch.definition.is_empty());
            assert_eq!(torch.forward, expected);
        }
    }

    #[test]
    fn test_unknown_type_rejected_by_constraints() {
        let d = activation();
        let check = d.validate_params(&map(json!({ "activation_type": "step" })));
        assert_eq!(check.errors.len(), 1);
        assert!(check.errors[0].contains("'step'") || check.errors[0].contains("step"));
    }
}
