// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Data-source layers. These carry an input shape into the graph but emit no
//! executable statements; the orderer drops them from the processing sequence.

use serde_json::json;
use shape_core::{Shape, ShapeError};

use crate::constraint::Constraint;
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{KerasCode, RenderCtx, TorchCode};

// ── data_input ──────────────────────────────────────────────────────────────

struct DataInput;

impl LayerBehavior for DataInput {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        match params.shape_list("shape") {
            Some(declared) if declared.rank() > 0 => {
                let mut dims = vec![None];
                dims.extend_from_slice(declared.dims());
                Ok(Shape::new(dims))
            }
            _ => Ok(input.clone()),
        }
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        KerasCode::Comment(match ctx.output_shape {
            Some(shape) => format!("# data source: expects input of shape {shape}"),
            None => "# data source: input shape not declared".to_string(),
        })
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        TorchCode::new(
            match ctx.output_shape {
                Some(shape) => format!("# data source: expects input of shape {shape}"),
                None => "# data source: input shape not declared".to_string(),
            },
            String::new(),
        )
    }
}

pub(super) fn data_input() -> LayerDescriptor {
    LayerDescriptor::new(
        "data_input",
        Category::DataSource,
        "generic data source with an optionally declared shape",
        DataInput,
    )
    .with_optional("shape", json!(null))
    .with_optional("dtype", json!("float32"))
    .with_constraint("shape", Constraint::ShapeLen(None))
}

// ── mnist ───────────────────────────────────────────────────────────────────

struct Mnist;

impl LayerBehavior for Mnist {
    fn output_shape(&self, _input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(Shape::batched(vec![28, 28, 1]))
    }

    fn keras(&self, _ctx: &RenderCtx) -> KerasCode {
        KerasCode::Comment("# data source: MNIST images, shape (None, 28, 28, 1)".to_string())
    }

    fn torch(&self, _ctx: &RenderCtx) -> TorchCode {
        TorchCode::new(
            "# data source: MNIST images, shape (None, 28, 28, 1)".to_string(),
            String::new(),
        )
    }
}

pub(super) fn mnist() -> LayerDescriptor {
    LayerDescriptor::new(
        "mnist",
        Category::DataSource,
        "MNIST image source, 28x28 grayscale",
        Mnist,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamMap;
    use serde_json::Value;

    fn map(value: Value) -> ParamMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_mnist_shape_is_fixed() {
        let d = mnist();
        let m = map(json!({}));
        let out = d.output_shape(&Shape::new(vec![]), Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 28, 28, 1)");
        assert!(d.is_data_source());
    }

    #[test]
    fn test_data_input_declares_shape() {
        let d = data_input();
        let m = map(json!({ "shape": [32, 32, 3] }));
        let out = d.output_shape(&Shape::new(vec![]), Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 32, 32, 3)");
    }

    #[test]
    fn test_data_input_without_shape_passes_through() {
        let d = data_input();
        let m = map(json!({}));
        let input = Shape::batched(vec![10]);
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out, input);
    }
}
