// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Basic layers: fully-connected and flatten.

use serde_json::json;
use shape_core::{Shape, ShapeError};

use crate::constraint::{Constraint, ParamKind};
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{
    py_bool, torch_in_features, unknown_input_note, KerasCode, RenderCtx, TorchCode,
};

// ── Dense ───────────────────────────────────────────────────────────────────

struct Dense;

impl LayerBehavior for Dense {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        let units = params.usize_or("units", 128);
        if input.rank() == 1 {
            Ok(Shape::known(vec![units]))
        } else {
            Ok(input.with_last(units))
        }
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let units = ctx.params.usize_or("units", 128);
        let activation = ctx.params.str_or("activation", "linear");
        let use_bias = ctx.params.bool_or("use_bias", true);

        let mut args = vec![units.to_string()];
        if activation != "linear" {
            args.push(format!("activation='{activation}'"));
        }
        if !use_bias {
            args.push("use_bias=False".to_string());
        }
        if ctx.is_first {
            if let Some(shape) = ctx.input_shape {
                args.push(format!("input_shape={}", shape.to_py_tuple()));
            }
        }
        KerasCode::Add(format!("layers.Dense({})", args.join(", ")))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let units = ctx.params.usize_or("units", 128);
        let use_bias = ctx.params.bool_or("use_bias", true);
        let activation = ctx.params.str_or("activation", "linear");
        let i = ctx.index;
        let in_features = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}self.dense_{i} = nn.Linear({in_features}, {units}, bias={})",
            py_bool(use_bias)
        );

        let mut forward = format!("x = self.dense_{i}(x)");
        match activation {
            "relu" => forward.push_str("\n        x = F.relu(x)"),
            "sigmoid" => forward.push_str("\n        x = torch.sigmoid(x)"),
            "tanh" => forward.push_str("\n        x = torch.tanh(x)"),
            "softmax" => forward.push_str("\n        x = F.softmax(x, dim=1)"),
            _ => {}
        }
        TorchCode::new(definition, forward)
    }
}

pub(super) fn dense() -> LayerDescriptor {
    LayerDescriptor::new("dense", Category::Basic, "fully-connected layer", Dense)
        .with_required(&["units"])
        .with_optional("activation", json!("linear"))
        .with_optional("use_bias", json!(true))
        .with_optional("kernel_initializer", json!("glorot_uniform"))
        .with_optional("bias_initializer", json!("zeros"))
        .with_optional("kernel_regularizer", json!(null))
        .with_optional("bias_regularizer", json!(null))
        .with_optional("activity_regularizer", json!(null))
        .with_constraint("units", Constraint::range(1.0, 10000.0))
        .with_constraint(
            "activation",
            Constraint::Choice(&[
                "linear", "relu", "sigmoid", "tanh", "softmax", "leaky_relu", "elu", "selu",
            ]),
        )
        .with_constraint("use_bias", Constraint::Kind(ParamKind::Bool))
}

// ── Flatten ─────────────────────────────────────────────────────────────────

struct Flatten;

impl LayerBehavior for Flatten {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        if input.rank() < 2 {
            return Ok(input.clone());
        }
        let mut flattened = 1usize;
        for (axis, dim) in input.dims().iter().enumerate().skip(1) {
            match dim {
                Some(n) => flattened *= n,
                None => return Err(ShapeError::UnconstrainedDimension { axis }),
            }
        }
        Ok(Shape::new(vec![input.dim(0), Some(flattened)]))
    }

    fn keras(&self, _ctx: &RenderCtx) -> KerasCode {
        KerasCode::Add("layers.Flatten()".to_string())
    }

    fn torch(&self, _ctx: &RenderCtx) -> TorchCode {
        TorchCode::forward_only("x = x.view(x.size(0), -1)  # flatten")
    }
}

pub(super) fn flatten() -> LayerDescriptor {
    LayerDescriptor::new(
        "flatten",
        Category::Basic,
        "collapses all non-batch dimensions into one",
        Flatten,
    )
}
