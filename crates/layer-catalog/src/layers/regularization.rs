// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Regularization layers: the dropout family and spectral normalization.

use serde_json::json;
use shape_core::{Shape, ShapeError};

use crate::constraint::Constraint;
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{py_float, KerasCode, RenderCtx, TorchCode};

struct Dropout;

impl LayerBehavior for Dropout {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let rate = ctx.params.f64_or("rate", 0.5);
        KerasCode::Add(format!("layers.Dropout({})", py_float(rate)))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let rate = ctx.params.f64_or("rate", 0.5);
        let i = ctx.index;
        TorchCode::new(
            format!("self.dropout_{i} = nn.Dropout({})", py_float(rate)),
            format!("x = self.dropout_{i}(x)"),
        )
    }
}

pub(super) fn dropout() -> LayerDescriptor {
    LayerDescriptor::new(
        "dropout",
        Category::Regularization,
        "randomly zeroes activations during training",
        Dropout,
    )
    .with_required(&["rate"])
    .with_optional("noise_shape", json!(null))
    .with_optional("seed", json!(null))
    .with_constraint("rate", Constraint::range(0.0, 1.0))
}

struct AlphaDropout;

impl LayerBehavior for AlphaDropout {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let rate = ctx.params.f64_or("rate", 0.5);
        KerasCode::Add(format!("layers.AlphaDropout({})", py_float(rate)))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let rate = ctx.params.f64_or("rate", 0.5);
        let i = ctx.index;
        TorchCode::new(
            format!("self.alpha_dropout_{i} = nn.AlphaDropout({})", py_float(rate)),
            format!("x = self.alpha_dropout_{i}(x)"),
        )
    }
}

pub(super) fn alpha_dropout() -> LayerDescriptor {
    LayerDescriptor::new(
        "alpha_dropout",
        Category::Regularization,
        "dropout that preserves self-normalising statistics (for SELU nets)",
        AlphaDropout,
    )
    .with_required(&["rate"])
    .with_optional("noise_shape", json!(null))
    .with_optional("seed", json!(null))
    .with_constraint("rate", Constraint::range(0.0, 1.0))
}

struct GaussianDropout;

impl LayerBehavior for GaussianDropout {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let rate = ctx.params.f64_or("rate", 0.5);
        KerasCode::Add(format!("layers.GaussianDropout({})", py_float(rate)))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        // Torch has no GaussianDropout module; emit the inline equivalent.
        let rate = ctx.params.f64_or("rate", 0.5);
        TorchCode::new(
            "# Gaussian dropout has no torch module equivalent".to_string(),
            format!(
                "if self.training:\n            \
                 noise = torch.randn_like(x) * {} + 1.0\n            \
                 x = x * noise",
                py_float(rate)
            ),
        )
    }
}

pub(super) fn gaussian_dropout() -> LayerDescriptor {
    LayerDescriptor::new(
        "gaussian_dropout",
        Category::Regularization,
        "multiplies activations by gaussian noise during training",
        GaussianDropout,
    )
    .with_required(&["rate"])
    .with_constraint("rate", Constraint::range(0.0, 1.0))
}

struct SpectralNorm;

impl LayerBehavior for SpectralNorm {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let power_iterations = ctx.params.usize_or("power_iterations", 1);
        KerasCode::Add(format!(
            "tfa.layers.SpectralNormalization(power_iterations={power_iterations})"
        ))
    }

    fn torch(&self, _ctx: &RenderCtx) -> TorchCode {
        TorchCode::new(
            "# spectral normalization wraps another module, e.g. nn.utils.spectral_norm(layer)"
                .to_string(),
            "# spectral normalization is applied at definition time".to_string(),
        )
    }
}

pub(super) fn spectral_normalization() -> LayerDescriptor {
    LayerDescriptor::new(
        "spectral_normalization",
        Category::Regularization,
        "constrains the spectral norm of the wrapped layer's weights",
        SpectralNorm,
    )
    .with_optional("power_iterations", json!(1))
    .with_constraint("power_iterations", Constraint::range(1.0, 10.0))
}
