// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Convolution layers in one, two, and three spatial dimensions.

use serde_json::json;
use shape_core::{Shape, ShapeError};

use crate::constraint::Constraint;
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{
    py_list, torch_in_features, unknown_input_note, KerasCode, RenderCtx, TorchCode,
};

/// One spatial extent through a convolution or pooling window.
///
/// "same"-style padding keeps the extent at `input / stride` (floor), the
/// windowed case is `(input - window) / stride + 1`.
pub(super) fn windowed_extent(
    input: usize,
    window: usize,
    stride: usize,
    same: bool,
) -> Result<usize, ShapeError> {
    if stride == 0 {
        return Err(ShapeError::InvalidDimension(
            "stride must be positive".to_string(),
        ));
    }
    if same {
        return Ok(input / stride);
    }
    let reduced = input.checked_sub(window).ok_or_else(|| {
        ShapeError::InvalidDimension(format!(
            "window size {window} exceeds input extent {input}"
        ))
    })?;
    Ok(reduced / stride + 1)
}

/// Shape rule shared by conv2d and separable_conv2d.
fn conv2d_shape(input: &Shape, params: Params, context: &str) -> Result<Shape, ShapeError> {
    input.require_rank(4, context)?;
    let filters = params.usize_or("filters", 32);
    let kernel = params.pair_or("kernel_size", [3, 3]);
    let strides = params.pair_or("strides", [1, 1]);
    let same = params.str_or("padding", "valid") == "same";

    let height = input.known_dim(1)?;
    let width = input.known_dim(2)?;
    let out_h = windowed_extent(height, kernel[0], strides[0], same)?;
    let out_w = windowed_extent(width, kernel[1], strides[1], same)?;
    Ok(Shape::new(vec![
        input.dim(0),
        Some(out_h),
        Some(out_w),
        Some(filters),
    ]))
}

// ── Conv1D ──────────────────────────────────────────────────────────────────

struct Conv1D;

impl LayerBehavior for Conv1D {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        input.require_rank(3, "conv1d")?;
        let filters = params.usize_or("filters", 32);
        let kernel = params.usize_or("kernel_size", 3);
        let strides = params.usize_or("strides", 1);
        // "causal" pads like "same" as far as the output length goes.
        let same = params.str_or("padding", "valid") != "valid";

        let timesteps = input.known_dim(1)?;
        let out_t = windowed_extent(timesteps, kernel, strides, same)?;
        Ok(Shape::new(vec![input.dim(0), Some(out_t), Some(filters)]))
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        let filters = p.usize_or("filters", 32);
        let kernel = p.usize_or("kernel_size", 3);
        let strides = p.usize_or("strides", 1);
        let padding = p.str_or("padding", "valid");
        let activation = p.str_or("activation", "linear");

        let mut args = vec![filters.to_string(), kernel.to_string()];
        if strides != 1 {
            args.push(format!("strides={strides}"));
        }
        if padding != "valid" {
            args.push(format!("padding='{padding}'"));
        }
        if activation != "linear" {
            args.push(format!("activation='{activation}'"));
        }
        if ctx.is_first {
            if let Some(shape) = ctx.input_shape {
                args.push(format!("input_shape={}", shape.tail_py_tuple()));
            }
        }
        KerasCode::Add(format!("layers.Conv1D({})", args.join(", ")))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let filters = p.usize_or("filters", 32);
        let kernel = p.usize_or("kernel_size", 3);
        let strides = p.usize_or("strides", 1);
        let activation = p.str_or("activation", "linear");
        let padding = if p.str_or("padding", "valid") == "same" {
            kernel / 2
        } else {
            0
        };
        let i = ctx.index;
        let in_channels = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}self.conv1d_{i} = nn.Conv1d({in_channels}, {filters}, {kernel}, stride={strides}, padding={padding})"
        );
        let mut forward = format!(
            "x = x.transpose(1, 2)  # (batch, features, timesteps)\n        \
             x = self.conv1d_{i}(x)\n        \
             x = x.transpose(1, 2)  # (batch, timesteps, features)"
        );
        if activation == "relu" {
            forward.push_str("\n        x = F.relu(x)");
        }
        TorchCode::new(definition, forward)
    }
}

pub(super) fn conv1d() -> LayerDescriptor {
    LayerDescriptor::new(
        "conv1d",
        Category::Convolution,
        "one-dimensional convolution over the time axis",
        Conv1D,
    )
    .with_required(&["filters", "kernel_size"])
    .with_optional("strides", json!(1))
    .with_optional("padding", json!("valid"))
    .with_optional("activation", json!("linear"))
    .with_optional("use_bias", json!(true))
    .with_optional("dilation_rate", json!(1))
    .with_constraint("filters", Constraint::range(1.0, 2048.0))
    .with_constraint("kernel_size", Constraint::range(1.0, 100.0))
    .with_constraint("strides", Constraint::range(1.0, 10.0))
    .with_constraint("padding", Constraint::Choice(&["valid", "same", "causal"]))
}

// ── Conv2D ──────────────────────────────────────────────────────────────────

struct Conv2D;

impl LayerBehavior for Conv2D {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        conv2d_shape(input, params, "conv2d")
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        let filters = p.usize_or("filters", 32);
        let kernel = p.pair_or("kernel_size", [3, 3]);
        let strides = p.pair_or("strides", [1, 1]);
        let padding = p.str_or("padding", "valid");
        let activation = p.str_or("activation", "linear");

        let mut args = vec![filters.to_string(), py_list(&kernel)];
        if strides != [1, 1] {
            args.push(format!("strides={}", py_list(&strides)));
        }
        if padding != "valid" {
            args.push(format!("padding='{padding}'"));
        }
        if activation != "linear" {
            args.push(format!("activation='{activation}'"));
        }
        if ctx.is_first {
            if let Some(shape) = ctx.input_shape {
                args.push(format!("input_shape={}", shape.tail_py_tuple()));
            }
        }
        KerasCode::Add(format!("layers.Conv2D({})", args.join(", ")))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let filters = p.usize_or("filters", 32);
        let kernel = p.pair_or("kernel_size", [3, 3]);
        let strides = p.pair_or("strides", [1, 1]);
        let activation = p.str_or("activation", "linear");
        let padding = if p.str_or("padding", "valid") == "same" {
            "'same'".to_string()
        } else {
            "0".to_string()
        };
        let i = ctx.index;
        let in_channels = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}self.conv2d_{i} = nn.Conv2d({in_channels}, {filters}, {}, stride={}, padding={padding})",
            kernel[0], strides[0]
        );
        let mut forward = format!("x = self.conv2d_{i}(x)");
        match activation {
            "relu" => forward.push_str("\n        x = F.relu(x)"),
            "sigmoid" => forward.push_str("\n        x = torch.sigmoid(x)"),
            "tanh" => forward.push_str("\n        x = torch.tanh(x)"),
            _ => {}
        }
        TorchCode::new(definition, forward)
    }
}

pub(super) fn conv2d() -> LayerDescriptor {
    LayerDescriptor::new(
        "conv2d",
        Category::Convolution,
        "two-dimensional convolution over height and width",
        Conv2D,
    )
    .with_required(&["filters", "kernel_size"])
    .with_optional("strides", json!([1, 1]))
    .with_optional("padding", json!("valid"))
    .with_optional("activation", json!("linear"))
    .with_optional("use_bias", json!(true))
    .with_optional("kernel_initializer", json!("glorot_uniform"))
    .with_optional("bias_initializer", json!("zeros"))
    .with_optional("dilation_rate", json!([1, 1]))
    .with_constraint("filters", Constraint::range(1.0, 2048.0))
    .with_constraint("kernel_size", Constraint::ShapeLen(Some(2)))
    .with_constraint("strides", Constraint::ShapeLen(Some(2)))
    .with_constraint("padding", Constraint::Choice(&["valid", "same"]))
    .with_constraint(
        "activation",
        Constraint::Choice(&["linear", "relu", "sigmoid", "tanh", "leaky_relu", "elu"]),
    )
}

// ── Conv3D ──────────────────────────────────────────────────────────────────

struct Conv3D;

impl LayerBehavior for Conv3D {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        input.require_rank(5, "conv3d")?;
        let filters = params.usize_or("filters", 32);
        let kernel = params.triple_or("kernel_size", [3, 3, 3]);
        let strides = params.triple_or("strides", [1, 1, 1]);
        let same = params.str_or("padding", "valid") == "same";

        let mut dims = vec![input.dim(0)];
        for axis in 1..4 {
            let extent = input.known_dim(axis)?;
            dims.push(Some(windowed_extent(
                extent,
                kernel[axis - 1],
                strides[axis - 1],
                same,
            )?));
        }
        dims.push(Some(filters));
        Ok(Shape::new(dims))
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        let filters = p.usize_or("filters", 32);
        let kernel = p.triple_or("kernel_size", [3, 3, 3]);
        let strides = p.triple_or("strides", [1, 1, 1]);
        let padding = p.str_or("padding", "valid");
        let activation = p.str_or("activation", "linear");

        let mut args = vec![filters.to_string(), py_list(&kernel)];
        if strides != [1, 1, 1] {
            args.push(format!("strides={}", py_list(&strides)));
        }
        if padding != "valid" {
            args.push(format!("padding='{padding}'"));
        }
        if activation != "linear" {
            args.push(format!("activation='{activation}'"));
        }
        if ctx.is_first {
            if let Some(shape) = ctx.input_shape {
                args.push(format!("input_shape={}", shape.tail_py_tuple()));
            }
        }
        KerasCode::Add(format!("layers.Conv3D({})", args.join(", ")))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let filters = p.usize_or("filters", 32);
        let kernel = p.triple_or("kernel_size", [3, 3, 3]);
        let strides = p.triple_or("strides", [1, 1, 1]);
        let activation = p.str_or("activation", "linear");
        let padding = if p.str_or("padding", "valid") == "same" {
            "'same'".to_string()
        } else {
            "0".to_string()
        };
        let i = ctx.index;
        let in_channels = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}self.conv3d_{i} = nn.Conv3d({in_channels}, {filters}, {}, stride={}, padding={padding})",
            kernel[0], strides[0]
        );
        let mut forward = format!("x = self.conv3d_{i}(x)");
        if activation == "relu" {
            forward.push_str("\n        x = F.relu(x)");
        }
        TorchCode::new(definition, forward)
    }
}

pub(super) fn conv3d() -> LayerDescriptor {
    LayerDescriptor::new(
        "conv3d",
        Category::Convolution,
        "three-dimensional convolution over depth, height, and width",
        Conv3D,
    )
    .with_required(&["filters", "kernel_size"])
    .with_optional("strides", json!([1, 1, 1]))
    .with_optional("padding", json!("valid"))
    .with_optional("activation", json!("linear"))
    .with_optional("use_bias", json!(true))
    .with_constraint("filters", Constraint::range(1.0, 512.0))
    .with_constraint("kernel_size", Constraint::ShapeLen(Some(3)))
    .with_constraint("strides", Constraint::ShapeLen(Some(3)))
    .with_constraint("padding", Constraint::Choice(&["valid", "same"]))
}

// ── SeparableConv2D ─────────────────────────────────────────────────────────

struct SeparableConv2D;

impl LayerBehavior for SeparableConv2D {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        conv2d_shape(input, params, "separable_conv2d")
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        let filters = p.usize_or("filters", 32);
        let kernel = p.pair_or("kernel_size", [3, 3]);
        let strides = p.pair_or("strides", [1, 1]);
        let padding = p.str_or("padding", "valid");
        let activation = p.str_or("activation", "linear");
        let depth_multiplier = p.usize_or("depth_multiplier", 1);

        let mut args = vec![filters.to_string(), py_list(&kernel)];
        if strides != [1, 1] {
            args.push(format!("strides={}", py_list(&strides)));
        }
        if padding != "valid" {
            args.push(format!("padding='{padding}'"));
        }
        if activation != "linear" {
            args.push(format!("activation='{activation}'"));
        }
        if depth_multiplier != 1 {
            args.push(format!("depth_multiplier={depth_multiplier}"));
        }
        if ctx.is_first {
            if let Some(shape) = ctx.input_shape {
                args.push(format!("input_shape={}", shape.tail_py_tuple()));
            }
        }
        KerasCode::Add(format!("layers.SeparableConv2D({})", args.join(", ")))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let filters = p.usize_or("filters", 32);
        let kernel = p.pair_or("kernel_size", [3, 3]);
        let i = ctx.index;
        let in_channels = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}# depthwise separable convolution built from two convs\n        \
             self.depthwise_{i} = nn.Conv2d({in_channels}, {in_channels}, {}, groups={in_channels})\n        \
             self.pointwise_{i} = nn.Conv2d({in_channels}, {filters}, 1)",
            kernel[0]
        );
        let forward = format!(
            "x = self.depthwise_{i}(x)\n        x = self.pointwise_{i}(x)"
        );
        TorchCode::new(definition, forward)
    }
}

pub(super) fn separable_conv2d() -> LayerDescriptor {
    LayerDescriptor::new(
        "separable_conv2d",
        Category::Convolution,
        "depthwise separable two-dimensional convolution",
        SeparableConv2D,
    )
    .with_required(&["filters", "kernel_size"])
    .with_optional("strides", json!([1, 1]))
    .with_optional("padding", json!("valid"))
    .with_optional("activation", json!("linear"))
    .with_optional("use_bias", json!(true))
    .with_optional("depth_multiplier", json!(1))
    .with_constraint("filters", Constraint::range(1.0, 2048.0))
    .with_constraint("kernel_size", Constraint::ShapeLen(Some(2)))
    .with_constraint("depth_multiplier", Constraint::range(1.0, 8.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamMap;
    use serde_json::Value;

    fn map(value: Value) -> ParamMap {
        value.as_object().cloned().unwrap_or_default()
    }

    fn ctx<'a>(params: &'a ParamMap, input: Option<&'a Shape>, is_first: bool) -> RenderCtx<'a> {
        RenderCtx {
            params: Params::new(params),
            input_shape: input,
            output_shape: None,
            index: 0,
            is_first,
        }
    }

    #[test]
    fn test_windowed_extent() {
        assert_eq!(windowed_extent(28, 3, 1, false).unwrap(), 26);
        assert_eq!(windowed_extent(28, 3, 2, false).unwrap(), 13);
        // "same" keeps input/stride, plain floor division.
        assert_eq!(windowed_extent(28, 3, 1, true).unwrap(), 28);
        assert_eq!(windowed_extent(7, 2, 2, true).unwrap(), 3);
        assert!(windowed_extent(2, 5, 1, false).is_err());
        assert!(windowed_extent(28, 3, 0, false).is_err());
    }

    #[test]
    fn test_conv2d_valid_padding_shape() {
        let d = conv2d();
        let input = Shape::batched(vec![28, 28, 1]);
        let m = map(json!({ "filters": 32, "kernel_size": [3, 3] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 26, 26, 32)");
    }

    #[test]
    fn test_conv2d_same_padding_shape() {
        let d = conv2d();
        let input = Shape::batched(vec![28, 28, 3]);
        let m = map(json!({
            "filters": 16, "kernel_size": [5, 5], "strides": [2, 2], "padding": "same"
        }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 14, 14, 16)");
    }

    #[test]
    fn test_conv2d_rejects_wrong_rank() {
        let d = conv2d();
        let input = Shape::batched(vec![784]);
        let m = map(json!({ "filters": 32, "kernel_size": [3, 3] }));
        let err = d.output_shape(&input, Params::new(&m)).unwrap_err();
        assert!(err.to_string().contains("4-dimensional"));
    }

    #[test]
    fn test_conv2d_keras_first_layer() {
        let d = conv2d();
        let input = Shape::batched(vec![28, 28, 1]);
        let m = map(json!({ "filters": 32, "kernel_size": [3, 3], "activation": "relu" }));
        let code = d.keras(&ctx(&m, Some(&input), true));
        assert_eq!(
            code,
            KerasCode::Add(
                "layers.Conv2D(32, [3, 3], activation='relu', input_shape=(28, 28, 1))"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_conv1d_causal_keeps_length() {
        let d = conv1d();
        let input = Shape::batched(vec![100, 8]);
        let m = map(json!({ "filters": 16, "kernel_size": 5, "padding": "causal" }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 100, 16)");
    }

    #[test]
    fn test_conv3d_shape() {
        let d = conv3d();
        let input = Shape::batched(vec![16, 32, 32, 3]);
        let m = map(json!({ "filters": 8, "kernel_size": [3, 3, 3] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 14, 30, 30, 8)");
    }

    #[test]
    fn test_separable_conv2d_torch_two_stage() {
        let d = separable_conv2d();
        let input = Shape::batched(vec![28, 28, 3]);
        let m = map(json!({ "filters": 32, "kernel_size": [3, 3] }));
        let code = d.torch(&ctx(&m, Some(&input), false));
        assert!(code.definition.contains("self.depthwise_0 = nn.Conv2d(3, 3, 3, groups=3)"));
        assert!(code.definition.contains("self.pointwise_0 = nn.Conv2d(3, 32, 1)"));
        assert!(code.forward.contains("self.depthwise_0"));
    }
}
