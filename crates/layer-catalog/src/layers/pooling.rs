// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Two-dimensional pooling layers.

use serde_json::json;
use shape_core::{Shape, ShapeError};

use super::convolution::windowed_extent;
use crate::constraint::Constraint;
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{py_list, KerasCode, RenderCtx, TorchCode};

/// Shared shape rule: channels pass through, spatial extents shrink.
/// Strides default to the pool size, matching the Keras contract.
fn pool2d_shape(input: &Shape, params: Params, context: &str) -> Result<Shape, ShapeError> {
    input.require_rank(4, context)?;
    let pool = params.pair_or("pool_size", [2, 2]);
    let strides = params.pair_or("strides", pool);
    let same = params.str_or("padding", "valid") == "same";

    let height = input.known_dim(1)?;
    let width = input.known_dim(2)?;
    let out_h = windowed_extent(height, pool[0], strides[0], same)?;
    let out_w = windowed_extent(width, pool[1], strides[1], same)?;
    Ok(Shape::new(vec![
        input.dim(0),
        Some(out_h),
        Some(out_w),
        input.dim(3),
    ]))
}

fn pool2d_keras(ctx: &RenderCtx, keras_name: &str) -> KerasCode {
    let pool = ctx.params.pair_or("pool_size", [2, 2]);
    let strides = ctx.params.pair_or("strides", pool);
    let padding = ctx.params.str_or("padding", "valid");

    let mut args = vec![py_list(&pool)];
    if strides != pool {
        args.push(format!("strides={}", py_list(&strides)));
    }
    if padding != "valid" {
        args.push(format!("padding='{padding}'"));
    }
    KerasCode::Add(format!("layers.{keras_name}({})", args.join(", ")))
}

fn pool2d_torch(ctx: &RenderCtx, member: &str, torch_name: &str) -> TorchCode {
    let pool = ctx.params.pair_or("pool_size", [2, 2]);
    let strides = ctx.params.pair_or("strides", pool);
    let i = ctx.index;
    TorchCode::new(
        format!(
            "self.{member}_{i} = nn.{torch_name}({}, stride={})",
            pool[0], strides[0]
        ),
        format!("x = self.{member}_{i}(x)"),
    )
}

struct MaxPool2D;

impl LayerBehavior for MaxPool2D {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        pool2d_shape(input, params, "maxpool2d")
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        pool2d_keras(ctx, "MaxPooling2D")
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        pool2d_torch(ctx, "maxpool", "MaxPool2d")
    }
}

struct AvgPool2D;

impl LayerBehavior for AvgPool2D {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        pool2d_shape(input, params, "avgpool2d")
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        pool2d_keras(ctx, "AveragePooling2D")
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        pool2d_torch(ctx, "avgpool", "AvgPool2d")
    }
}

fn pool2d_descriptor(
    type_id: &'static str,
    description: &'static str,
    behavior: impl LayerBehavior + 'static,
) -> LayerDescriptor {
    LayerDescriptor::new(type_id, Category::Pooling, description, behavior)
        .with_required(&["pool_size"])
        .with_optional("strides", json!(null))
        .with_optional("padding", json!("valid"))
        .with_constraint("pool_size", Constraint::ShapeLen(Some(2)))
        .with_constraint("padding", Constraint::Choice(&["valid", "same"]))
}

pub(super) fn maxpool2d() -> LayerDescriptor {
    pool2d_descriptor("maxpool2d", "two-dimensional max pooling", MaxPool2D)
}

pub(super) fn avgpool2d() -> LayerDescriptor {
    pool2d_descriptor("avgpool2d", "two-dimensional average pooling", AvgPool2D)
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
            index: 2,
            is_first: false,
        }
    }

    #[test]
    fn test_maxpool_halves_spatial_dims() {
        let d = maxpool2d();
        let input = Shape::batched(vec![26, 26, 32]);
        let m = map(json!({ "pool_size": [2, 2] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 13, 13, 32)");
    }

    #[test]
    fn test_strides_default_to_pool_size() {
        let d = avgpool2d();
        let input = Shape::batched(vec![9, 9, 8]);
        let m = map(json!({ "pool_size": [3, 3] }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 3, 3, 8)");
    }

    #[test]
    fn test_keras_omits_matching_strides() {
        let d = maxpool2d();
        let m = map(json!({ "pool_size": [2, 2] }));
        assert_eq!(
            d.keras(&ctx(&m)),
            KerasCode::Add("layers.MaxPooling2D([2, 2])".to_string())
        );

        let m = map(json!({ "pool_size": [2, 2], "strides": [1, 1] }));
        assert_eq!(
            d.keras(&ctx(&m)),
            KerasCode::Add("layers.MaxPooling2D([2, 2], strides=[1, 1])".to_string())
        );
    }

    #[test]
    fn test_torch_member_naming() {
        let d = avgpool2d();
        let m = map(json!({ "pool_size": [2, 2] }));
        let code = d.torch(&ctx(&m));
        assert_eq!(code.definition, "self.avgpool_2 = nn.AvgPool2d(2, stride=2)");
        assert_eq!(code.forward, "x = self.avgpool_2(x)");
    }
}
