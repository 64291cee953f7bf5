// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Closed-form parameter-count estimates per layer type.
//!
//! These mirror the standard framework formulas for the weight-bearing
//! layers; everything else counts as zero. Estimates require both shapes to
//! be known, since the input feature count feeds every formula.

use layer_catalog::Params;
use model_graph::Step;

/// Estimates the number of trainable parameters `step` contributes.
pub(crate) fn estimate_parameters(step: &Step) -> u64 {
    let (Some(input), Some(output)) = (&step.input_shape, &step.output_shape) else {
        return 0;
    };
    let params = Params::new(&step.parameters);
    let in_features = input.last().unwrap_or(0) as u64;

    match step.type_id.as_str() {
        "dense" => {
            let units = params.usize_or("units", 128) as u64;
            let bias = if params.bool_or("use_bias", true) { units } else { 0 };
            in_features * units + bias
        }
        "conv2d" => {
            let filters = params.usize_or("filters", 32) as u64;
            let [k0, k1] = params.pair_or("kernel_size", [3, 3]);
            let bias = if params.bool_or("use_bias", true) { filters } else { 0 };
            k0 as u64 * k1 as u64 * in_features * filters + bias
        }
        "conv1d" => {
            let filters = params.usize_or("filters", 32) as u64;
            let k = params.usize_or("kernel_size", 3) as u64;
            let bias = if params.bool_or("use_bias", true) { filters } else { 0 };
            k * in_features * filters + bias
        }
        // Scale and shift vectors over the feature axis.
        "batch_normalization" | "layer_normalization" => {
            2 * output.last().unwrap_or(0) as u64
        }
        // Four gate matrices: input, forget, cell, output.
        "lstm" => {
            let units = params.usize_or("units", 128) as u64;
            4 * (in_features * units + units * units + units)
        }
        // Three gate matrices: update, reset, candidate.
        "gru" => {
            let units = params.usize_or("units", 128) as u64;
            3 * (in_features * units + units * units + units)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_catalog::ParamMap;
    use serde_json::{json, Value};
    use shape_core::Shape;

    fn step(type_id: &str, params: Value, input: Shape, output: Shape) -> Step {
        Step {
            position: 0,
            type_id: type_id.to_string(),
            instance_id: "t".to_string(),
            display_name: type_id.to_string(),
            parameters: params.as_object().cloned().unwrap_or_else(ParamMap::new),
            trainable: true,
            input_shape: Some(input),
            output_shape: Some(output),
        }
    }

    #[test]
    fn test_dense_count() {
        let s = step(
            "dense",
            json!({ "units": 10 }),
            Shape::batched(vec![784]),
            Shape::batched(vec![10]),
        );
        assert_eq!(estimate_parameters(&s), 784 * 10 + 10);
    }

    #[test]
    fn test_dense_without_bias() {
        let s = step(
            "dense",
            json!({ "units": 10, "use_bias": false }),
            Shape::batched(vec![784]),
            Shape::batched(vec![10]),
        );
        assert_eq!(estimate_parameters(&s), 7840);
    }

    #[test]
    fn test_conv2d_count() {
        let s = step(
            "conv2d",
            json!({ "filters": 32, "kernel_size": [3, 3] }),
            Shape::batched(vec![28, 28, 1]),
            Shape::batched(vec![26, 26, 32]),
        );
        assert_eq!(estimate_parameters(&s), 3 * 3 * 1 * 32 + 32);
    }

    #[test]
    fn test_lstm_count() {
        let s = step(
            "lstm",
            json!({ "units": 64 }),
            Shape::batched(vec![10, 32]),
            Shape::batched(vec![64]),
        );
        assert_eq!(estimate_parameters(&s), 4 * (32 * 64 + 64 * 64 + 64));
    }

    #[test]
    fn test_stateless_layer_counts_zero() {
        let s = step(
            "dropout",
            json!({ "rate": 0.5 }),
            Shape::batched(vec![64]),
            Shape::batched(vec![64]),
        );
        assert_eq!(estimate_parameters(&s), 0);
    }

    #[test]
    fn test_unknown_shape_counts_zero() {
        let mut s = step(
            "dense",
            json!({ "units": 10 }),
            Shape::batched(vec![784]),
            Shape::batched(vec![10]),
        );
        s.input_shape = None;
        assert_eq!(estimate_parameters(&s), 0);
    }
}
