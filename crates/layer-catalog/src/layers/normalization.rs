// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Normalization layers. All of them preserve the input shape; they differ
//! only in which statistics they normalise over and which backend
//! primitives exist for them.

use serde_json::json;
use shape_core::{Shape, ShapeError};

use crate::constraint::Constraint;
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{
    py_float, py_value, torch_in_features, unknown_input_note, KerasCode, RenderCtx, TorchCode,
};

/// Epsilon rendered from the raw parameter so `1e-12` stays `1e-12`.
fn epsilon_or(p: Params<'_>, default: &str) -> String {
    p.raw("epsilon")
        .map(py_value)
        .unwrap_or_else(|| default.to_string())
}

// ── BatchNormalization ──────────────────────────────────────────────────────

struct BatchNorm;

impl LayerBehavior for BatchNorm {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        let mut args = Vec::new();
        let axis = p.i64_or("axis", -1);
        if axis != -1 {
            args.push(format!("axis={axis}"));
        }
        let momentum = p.f64_or("momentum", 0.99);
        if momentum != 0.99 {
            args.push(format!("momentum={}", py_float(momentum)));
        }
        if p.has("epsilon") && p.f64_or("epsilon", 0.001) != 0.001 {
            args.push(format!("epsilon={}", epsilon_or(p, "0.001")));
        }
        KerasCode::Add(format!("layers.BatchNormalization({})", args.join(", ")))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let momentum = p.f64_or("momentum", 0.99);
        // Torch's momentum is the complement of the Keras one; round away
        // the binary-float dust so 1 - 0.9 renders as 0.1.
        let complement = ((1.0 - momentum) * 1e10).round() / 1e10;
        let i = ctx.index;
        let features = torch_in_features(ctx);
        let note = unknown_input_note(ctx);
        TorchCode::new(
            format!(
                "{note}self.batchnorm_{i} = nn.BatchNorm1d({features}, eps={}, momentum={})",
                epsilon_or(p, "0.001"),
                py_float(complement)
            ),
            format!("x = self.batchnorm_{i}(x)"),
        )
    }
}

pub(super) fn batch_normalization() -> LayerDescriptor {
    LayerDescriptor::new(
        "batch_normalization",
        Category::Normalization,
        "normalises activations over the batch",
        BatchNorm,
    )
    .with_optional("axis", json!(-1))
    .with_optional("momentum", json!(0.99))
    .with_optional("epsilon", json!(0.001))
    .with_optional("center", json!(true))
    .with_optional("scale", json!(true))
    .with_optional("beta_initializer", json!("zeros"))
    .with_optional("gamma_initializer", json!("ones"))
    .with_constraint("momentum", Constraint::range(0.0, 1.0))
    .with_constraint("epsilon", Constraint::range(1e-8, 1e-2))
}

// ── LayerNormalization ──────────────────────────────────────────────────────

struct LayerNorm;

impl LayerBehavior for LayerNorm {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        let mut args = Vec::new();
        let axis = p.i64_or("axis", -1);
        if axis != -1 {
            args.push(format!("axis={axis}"));
        }
        if p.has("epsilon") && p.f64_or("epsilon", 0.001) != 0.001 {
            args.push(format!("epsilon={}", epsilon_or(p, "0.001")));
        }
        KerasCode::Add(format!("layers.LayerNormalization({})", args.join(", ")))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let i = ctx.index;
        let features = torch_in_features(ctx);
        let note = unknown_input_note(ctx);
        TorchCode::new(
            format!(
                "{note}self.layernorm_{i} = nn.LayerNorm({features}, eps={})",
                epsilon_or(ctx.params, "0.001")
            ),
            format!("x = self.layernorm_{i}(x)"),
        )
    }
}

pub(super) fn layer_normalization() -> LayerDescriptor {
    LayerDescriptor::new(
        "layer_normalization",
        Category::Normalization,
        "normalises activations over the feature axis",
        LayerNorm,
    )
    .with_optional("axis", json!(-1))
    .with_optional("epsilon", json!(0.001))
    .with_optional("center", json!(true))
    .with_optional("scale", json!(true))
    .with_optional("beta_initializer", json!("zeros"))
    .with_optional("gamma_initializer", json!("ones"))
    .with_constraint("epsilon", Constraint::range(1e-8, 1e-2))
}

// ── GroupNormalization ──────────────────────────────────────────────────────

struct GroupNorm;

impl LayerBehavior for GroupNorm {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        KerasCode::Add(format!(
            "tfa.layers.GroupNormalization(groups={}, epsilon={})",
            p.usize_or("groups", 32),
            epsilon_or(p, "0.001")
        ))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let i = ctx.index;
        let channels = torch_in_features(ctx);
        let note = unknown_input_note(ctx);
        TorchCode::new(
            format!(
                "{note}self.groupnorm_{i} = nn.GroupNorm({}, {channels}, eps={})",
                p.usize_or("groups", 32),
                epsilon_or(p, "0.001")
            ),
            format!("x = self.groupnorm_{i}(x)"),
        )
    }
}

pub(super) fn group_normalization() -> LayerDescriptor {
    LayerDescriptor::new(
        "group_normalization",
        Category::Normalization,
        "normalises activations within channel groups",
        GroupNorm,
    )
    .with_required(&["groups"])
    .with_optional("axis", json!(-1))
    .with_optional("epsilon", json!(0.001))
    .with_optional("center", json!(true))
    .with_optional("scale", json!(true))
    .with_constraint("groups", Constraint::range(1.0, 128.0))
    .with_constraint("epsilon", Constraint::range(1e-8, 1e-2))
}

// ── InstanceNormalization ───────────────────────────────────────────────────

struct InstanceNorm;

impl LayerBehavior for InstanceNorm {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        KerasCode::Add(format!(
            "tfa.layers.InstanceNormalization(epsilon={})",
            epsilon_or(ctx.params, "0.001")
        ))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let i = ctx.index;
        let features = torch_in_features(ctx);
        let note = unknown_input_note(ctx);
        TorchCode::new(
            format!(
                "{note}self.instance_norm_{i} = nn.InstanceNorm1d({features}, eps={})",
                epsilon_or(ctx.params, "0.001")
            ),
            format!("x = self.instance_norm_{i}(x)"),
        )
    }
}

pub(super) fn instance_normalization() -> LayerDescriptor {
    LayerDescriptor::new(
        "instance_normalization",
        Category::Normalization,
        "normalises each sample independently",
        InstanceNorm,
    )
    .with_optional("axis", json!(-1))
    .with_optional("epsilon", json!(0.001))
    .with_optional("center", json!(true))
    .with_optional("scale", json!(true))
    .with_constraint("epsilon", Constraint::range(1e-8, 1e-2))
}

// ── WeightNormalization ─────────────────────────────────────────────────────

struct WeightNorm;

impl LayerBehavior for WeightNorm {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, _ctx: &RenderCtx) -> KerasCode {
        KerasCode::Comment(
            "# weight normalization wraps another layer; apply it where that layer is defined"
                .to_string(),
        )
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let dim = ctx.params.i64_or("dim", 0);
        TorchCode::new(
            format!(
                "# weight normalization wraps another module, e.g. nn.utils.weight_norm(layer, dim={dim})"
            ),
            "# weight normalization is applied at definition time".to_string(),
        )
    }
}

pub(super) fn weight_normalization() -> LayerDescriptor {
    LayerDescriptor::new(
        "weight_normalization",
        Category::Normalization,
        "reparameterises the weights of the layer it wraps",
        WeightNorm,
    )
    .with_optional("dim", json!(0))
    .with_constraint("dim", Constraint::range(0.0, 3.0))
}

// ── LocalResponseNormalization ──────────────────────────────────────────────

struct LocalResponseNorm;

impl LayerBehavior for LocalResponseNorm {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        KerasCode::Add(format!(
            "layers.Lambda(lambda x: tf.nn.local_response_normalization(x, depth_radius={}, bias={}, alpha={}, beta={}))",
            p.usize_or("depth_radius", 5),
            py_float(p.f64_or("bias", 1.0)),
            py_float(p.f64_or("alpha", 0.0001)),
            py_float(p.f64_or("beta", 0.75))
        ))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let i = ctx.index;
        let size = p.usize_or("depth_radius", 5) * 2 + 1;
        TorchCode::new(
            format!(
                "self.lrn_{i} = nn.LocalResponseNorm({size}, alpha={}, beta={}, k={})",
                py_float(p.f64_or("alpha", 0.0001)),
                py_float(p.f64_or("beta", 0.75)),
                py_float(p.f64_or("bias", 1.0))
            ),
            format!("x = self.lrn_{i}(x)"),
        )
    }
}

pub(super) fn local_response_normalization() -> LayerDescriptor {
    LayerDescriptor::new(
        "local_response_normalization",
        Category::Normalization,
        "normalises over adjacent channels",
        LocalResponseNorm,
    )
    .with_optional("depth_radius", json!(5))
    .with_optional("bias", json!(1.0))
    .with_optional("alpha", json!(0.0001))
    .with_optional("beta", json!(0.75))
    .with_constraint("depth_radius", Constraint::range(1.0, 20.0))
    .with_constraint("bias", Constraint::range(0.1, 10.0))
    .with_constraint("alpha", Constraint::range(0.00001, 0.01))
    .with_constraint("beta", Constraint::range(0.1, 2.0))
}

// ── UnitNormalization ───────────────────────────────────────────────────────

struct UnitNorm;

impl LayerBehavior for UnitNorm {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        KerasCode::Add(format!(
            "layers.UnitNormalization(axis={})",
            ctx.params.i64_or("axis", -1)
        ))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        TorchCode::forward_only(format!(
            "x = F.normalize(x, p=2, dim={})",
            ctx.params.i64_or("axis", -1)
        ))
    }
}

pub(super) fn unit_normalization() -> LayerDescriptor {
    LayerDescriptor::new(
        "unit_normalization",
        Category::Normalization,
        "scales inputs to unit L2 norm",
        UnitNorm,
    )
    .with_optional("axis", json!(-1))
    .with_constraint("axis", Constraint::range(-10.0, 10.0))
}

// ── CosineNormalization ─────────────────────────────────────────────────────

struct CosineNorm;

impl LayerBehavior for CosineNorm {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        KerasCode::Add(format!(
            "layers.Lambda(lambda x: tf.nn.l2_normalize(x, axis={}, epsilon={}))",
            p.i64_or("axis", -1),
            epsilon_or(p, "1e-12")
        ))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        TorchCode::forward_only(format!(
            "x = F.normalize(x, p=2, dim={}, eps={})",
            p.i64_or("axis", -1),
            epsilon_or(p, "1e-12")
        ))
    }
}

pub(super) fn cosine_normalization() -> LayerDescriptor {
    LayerDescriptor::new(
        "cosine_normalization",
        Category::Normalization,
        "L2-normalises inputs for cosine-similarity computations",
        CosineNorm,
    )
    .with_optional("axis", json!(-1))
    .with_optional("epsilon", json!(1e-12))
    .with_constraint("axis", Constraint::range(-10.0, 10.0))
    .with_constraint("epsilon", Constraint::range(1e-15, 1e-6))
}
