// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shape-manipulation layers: reshape, permute, repeat, crop, pad, and the
//! escape hatches (lambda, masking).

use serde_json::json;
use shape_core::{Shape, ShapeError};

use crate::constraint::{Constraint, ParamKind};
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{py_float, py_side_pairs, py_value, KerasCode, RenderCtx, TorchCode};

// ── Reshape ─────────────────────────────────────────────────────────────────

struct Reshape;

impl LayerBehavior for Reshape {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        // The batch axis always survives; -1 entries stay unconstrained.
        match params.shape_list("target_shape") {
            Some(target) if target.rank() > 0 => {
                let mut dims = vec![input.dims().first().copied().flatten()];
                dims.extend_from_slice(target.dims());
                Ok(Shape::new(dims))
            }
            _ => Ok(input.clone()),
        }
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let target = ctx
            .params
            .raw("target_shape")
            .map(py_value)
            .unwrap_or_else(|| "[]".to_string());
        KerasCode::Add(format!("layers.Reshape({target})"))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let dims = match ctx.params.raw("target_shape").and_then(|v| v.as_array()) {
            Some(items) => items.iter().map(py_value).collect::<Vec<_>>().join(", "),
            None => "-1".to_string(),
        };
        TorchCode::forward_only(format!("x = x.view(x.size(0), {dims})"))
    }
}

pub(super) fn reshape() -> LayerDescriptor {
    LayerDescriptor::new(
        "reshape",
        Category::Reshaping,
        "reshapes the non-batch dimensions to a target shape",
        Reshape,
    )
    .with_required(&["target_shape"])
    .with_constraint("target_shape", Constraint::ShapeLen(None))
}

// ── Permute ─────────────────────────────────────────────────────────────────

struct Permute;

impl LayerBehavior for Permute {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        let dims = match params.usize_list("dims") {
            Some(d) if !d.is_empty() => d,
            _ => return Ok(input.clone()),
        };
        // `dims` indexes the non-batch axes, zero-based.
        if dims.len() + 1 != input.rank() {
            return Ok(input.clone());
        }
        let mut out = vec![input.dims().first().copied().flatten()];
        for &d in &dims {
            match input.dims().get(d + 1) {
                Some(dim) => out.push(*dim),
                None => {
                    return Err(ShapeError::InvalidDimension(format!(
                        "permute axis {d} out of range for rank {}",
                        input.rank()
                    )))
                }
            }
        }
        Ok(Shape::new(out))
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let dims = ctx
            .params
            .raw("dims")
            .map(py_value)
            .unwrap_or_else(|| "[]".to_string());
        KerasCode::Add(format!("layers.Permute({dims})"))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        // Torch permutes over all axes, so the batch axis is prepended.
        let dims = ctx.params.usize_list("dims").unwrap_or_default();
        let mut order = vec!["0".to_string()];
        order.extend(dims.iter().map(|d| (d + 1).to_string()));
        TorchCode::forward_only(format!("x = x.permute({})", order.join(", ")))
    }
}

pub(super) fn permute() -> LayerDescriptor {
    LayerDescriptor::new(
        "permute",
        Category::Reshaping,
        "reorders the non-batch dimensions",
        Permute,
    )
    .with_required(&["dims"])
    .with_constraint("dims", Constraint::ShapeLen(None))
}

// ── RepeatVector ────────────────────────────────────────────────────────────

struct RepeatVector;

impl LayerBehavior for RepeatVector {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        let n = params.usize_or("n", 1);
        Ok(Shape::new(vec![
            input.dims().first().copied().flatten(),
            Some(n),
            input.last(),
        ]))
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        KerasCode::Add(format!("layers.RepeatVector({})", ctx.params.usize_or("n", 1)))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let n = ctx.params.usize_or("n", 1);
        TorchCode::forward_only(format!("x = x.unsqueeze(1).repeat(1, {n}, 1)"))
    }
}

pub(super) fn repeat_vector() -> LayerDescriptor {
    LayerDescriptor::new(
        "repeat_vector",
        Category::Reshaping,
        "repeats a feature vector along a new time axis",
        RepeatVector,
    )
    .with_required(&["n"])
    .with_constraint("n", Constraint::range(1.0, 1000.0))
}

// ── Lambda ──────────────────────────────────────────────────────────────────

struct Lambda;

impl LayerBehavior for Lambda {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        match params.shape_list("output_shape") {
            Some(target) if target.rank() > 0 => {
                let mut dims = vec![input.dims().first().copied().flatten()];
                dims.extend_from_slice(target.dims());
                Ok(Shape::new(dims))
            }
            _ => Ok(input.clone()),
        }
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let function = ctx.params.str_or("function", "lambda x: x");
        match ctx.params.raw("output_shape").filter(|v| !v.is_null()) {
            Some(shape) => KerasCode::Add(format!(
                "layers.Lambda({function}, output_shape={})",
                py_value(shape)
            )),
            None => KerasCode::Add(format!("layers.Lambda({function})")),
        }
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let function = ctx.params.str_or("function", "lambda x: x");
        TorchCode::new(
            format!("# lambda expression: {function}"),
            format!("# apply the custom expression here: {function}"),
        )
    }
}

pub(super) fn lambda() -> LayerDescriptor {
    LayerDescriptor::new(
        "lambda",
        Category::Reshaping,
        "wraps an arbitrary expression as a layer",
        Lambda,
    )
    .with_required(&["function"])
    .with_optional("output_shape", json!(null))
    .with_optional("mask", json!(null))
    .with_optional("arguments", json!({}))
    .with_constraint("function", Constraint::Kind(ParamKind::Str))
}

// ── Masking ─────────────────────────────────────────────────────────────────

struct Masking;

impl LayerBehavior for Masking {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        KerasCode::Add(format!(
            "layers.Masking(mask_value={})",
            py_float(ctx.params.f64_or("mask_value", 0.0))
        ))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        TorchCode::new(
            format!(
                "# masking (mask_value={}) is handled by the attention modules in torch",
                py_float(ctx.params.f64_or("mask_value", 0.0))
            ),
            String::new(),
        )
    }
}

pub(super) fn masking() -> LayerDescriptor {
    LayerDescriptor::new(
        "masking",
        Category::Reshaping,
        "marks padded timesteps so downstream layers skip them",
        Masking,
    )
    .with_optional("mask_value", json!(0.0))
    .with_constraint("mask_value", Constraint::range(-1000.0, 1000.0))
}

// ── Cropping2D ──────────────────────────────────────────────────────────────

struct Cropping2D;

impl LayerBehavior for Cropping2D {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        if input.rank() != 4 {
            return Ok(input.clone());
        }
        let crops = params.side_pairs_or("cropping", [[0, 0], [0, 0]]);
        let height = input.known_dim(1)?;
        let width = input.known_dim(2)?;
        let out_h = height.checked_sub(crops[0][0] + crops[0][1]).ok_or_else(|| {
            ShapeError::InvalidDimension(format!("cropping exceeds input height {height}"))
        })?;
        let out_w = width.checked_sub(crops[1][0] + crops[1][1]).ok_or_else(|| {
            ShapeError::InvalidDimension(format!("cropping exceeds input width {width}"))
        })?;
        Ok(Shape::new(vec![
            input.dims().first().copied().flatten(),
            Some(out_h),
            Some(out_w),
            input.last(),
        ]))
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        // Scalar shorthand widens to per-side pairs, same as the shape rule.
        let crops = ctx.params.side_pairs_or("cropping", [[1, 1], [1, 1]]);
        KerasCode::Add(format!("layers.Cropping2D({})", py_side_pairs(crops)))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let crops = ctx.params.side_pairs_or("cropping", [[1, 1], [1, 1]]);
        TorchCode::forward_only(format!(
            "h_start, h_end = {}, x.size(2) - {}\n        \
             w_start, w_end = {}, x.size(3) - {}\n        \
             x = x[:, :, h_start:h_end, w_start:w_end]",
            crops[0][0], crops[0][1], crops[1][0], crops[1][1]
        ))
    }
}

pub(super) fn cropping2d() -> LayerDescriptor {
    LayerDescriptor::new(
        "cropping2d",
        Category::Reshaping,
        "crops rows and columns from a spatial input",
        Cropping2D,
    )
    .with_required(&["cropping"])
    .with_optional("data_format", json!(null))
    .with_constraint("cropping", Constraint::ShapeLen(Some(2)))
}

// ── ZeroPadding2D ───────────────────────────────────────────────────────────

struct ZeroPadding2D;

impl LayerBehavior for ZeroPadding2D {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        if input.rank() != 4 {
            return Ok(input.clone());
        }
        let pads = params.side_pairs_or("padding", [[1, 1], [1, 1]]);
        let height = input.known_dim(1)?;
        let width = input.known_dim(2)?;
        Ok(Shape::new(vec![
            input.dims().first().copied().flatten(),
            Some(height + pads[0][0] + pads[0][1]),
            Some(width + pads[1][0] + pads[1][1]),
            input.last(),
        ]))
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let pads = ctx.params.side_pairs_or("padding", [[1, 1], [1, 1]]);
        KerasCode::Add(format!("layers.ZeroPadding2D({})", py_side_pairs(pads)))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        // Torch pad order is (left, right, top, bottom).
        let pads = ctx.params.side_pairs_or("padding", [[1, 1], [1, 1]]);
        TorchCode::forward_only(format!(
            "x = F.pad(x, ({}, {}, {}, {}), mode='constant', value=0)",
            pads[1][0], pads[1][1], pads[0][0], pads[0][1]
        ))
    }
}

pub(super) fn zero_padding2d() -> LayerDescriptor {
    LayerDescriptor::new(
        "zero_padding2d",
        Category::Reshaping,
        "pads rows and columns of a spatial input with zeros",
        ZeroPadding2D,
    )
    .with_optional("padding", json!([[1, 1], [1, 1]]))
    .with_optional("data_format", json!(null))
    .with_constraint("padding", Constraint::ShapeLen(Some(2)))
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
            index: 0,
            is_first: false,
        }
    }

    #[test]
    fn test_reshape_keeps_batch_axis() {
        let d = reshape();
        let input = Shape::batched(vec![784]);
        let m = map(json!({ "target_shape": [28, 28, 1] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 28, 28, 1)");
    }

    #[test]
    fn test_reshape_negative_entry_is_unconstrained() {
        let d = reshape();
        let input = Shape::batched(vec![784]);
        let m = map(json!({ "target_shape": [7, -1] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.dims(), &[None, Some(7), None]);
    }

    #[test]
    fn test_reshape_torch_preserves_minus_one() {
        let d = reshape();
        let m = map(json!({ "target_shape": [7, -1] }));
        let code = d.torch(&ctx(&m));
        assert_eq!(code.forward, "x = x.view(x.size(0), 7, -1)");
    }

    #[test]
    fn test_permute_reorders_non_batch_axes() {
        let d = permute();
        let input = Shape::batched(vec![10, 64]);
        let m = map(json!({ "dims": [1, 0] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 64, 10)");
        let code = d.torch(&ctx(&m));
        assert_eq!(code.forward, "x = x.permute(0, 2, 1)");
    }

    #[test]
    fn test_permute_wrong_arity_passes_through() {
        let d = permute();
        let input = Shape::batched(vec![10, 64]);
        let m = map(json!({ "dims": [0] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_repeat_vector_adds_time_axis() {
        let d = repeat_vector();
        let input = Shape::batched(vec![64]);
        let m = map(json!({ "n": 5 }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 5, 64)");
    }

    #[test]
    fn test_lambda_with_output_shape() {
        let d = lambda();
        let m = map(json!({ "function": "lambda x: x * 2", "output_shape": [64] }));
        assert_eq!(
            d.keras(&ctx(&m)),
            KerasCode::Add("layers.Lambda(lambda x: x * 2, output_shape=[64])".to_string())
        );
    }

    #[test]
    fn test_cropping_shrinks_spatial_dims() {
        let d = cropping2d();
        let input = Shape::batched(vec![28, 28, 1]);
        let m = map(json!({ "cropping": [2, [1, 3]] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 24, 24, 1)");
    }

    #[test]
    fn test_cropping_keras_widens_scalar_shorthand() {
        let d = cropping2d();
        let m = map(json!({ "cropping": [2, [1, 3]] }));
        assert_eq!(
            d.keras(&ctx(&m)),
            KerasCode::Add("layers.Cropping2D([[2, 2], [1, 3]])".to_string())
        );

        let d = zero_padding2d();
        let m = map(json!({}));
        assert_eq!(
            d.keras(&ctx(&m)),
            KerasCode::Add("layers.ZeroPadding2D([[1, 1], [1, 1]])".to_string())
        );
    }

    #[test]
    fn test_cropping_beyond_extent_is_error() {
        let d = cropping2d();
        let input = Shape::batched(vec![4, 4, 1]);
        let m = map(json!({ "cropping": [[3, 3], [0, 0]] }));
        assert!(d.output_shape(&input, Params::new(&m)).is_err());
    }

    #[test]
    fn test_zero_padding_grows_spatial_dims() {
        let d = zero_padding2d();
        let input = Shape::batched(vec![26, 26, 32]);
        let m = map(json!({ "padding": [[1, 1], [2, 2]] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 28, 30, 32)");
        let code = d.torch(&ctx(&m));
        assert_eq!(
            code.forward,
            "x = F.pad(x, (2, 2, 1, 1), mode='constant', value=0)"
        );
    }
}
