// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Recurrent layers: LSTM and GRU.
//!
//! Both expect rank-3 input `(batch, timesteps, features)`. The time axis
//! survives only when `return_sequences` is set, and `bidirectional`
//! doubles the feature width.

use serde_json::json;
use shape_core::{Shape, ShapeError};

use crate::constraint::Constraint;
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{
    py_bool, py_float, torch_in_features, unknown_input_note, KerasCode, RenderCtx, TorchCode,
};

fn recurrent_shape(input: &Shape, params: Params, context: &str) -> Result<Shape, ShapeError> {
    input.require_rank(3, context)?;
    let mut units = params.usize_or("units", 128);
    if params.bool_or("bidirectional", false) {
        units *= 2;
    }
    if params.bool_or("return_sequences", false) {
        Ok(Shape::new(vec![input.dim(0), input.dim(1), Some(units)]))
    } else {
        Ok(Shape::new(vec![input.dim(0), Some(units)]))
    }
}

fn recurrent_keras(ctx: &RenderCtx, keras_name: &str) -> KerasCode {
    let p = ctx.params;
    let units = p.usize_or("units", 128);
    let activation = p.str_or("activation", "tanh");
    let return_sequences = p.bool_or("return_sequences", false);
    let dropout = p.f64_or("dropout", 0.0);
    let bidirectional = p.bool_or("bidirectional", false);

    let mut args = vec![units.to_string()];
    if activation != "tanh" {
        args.push(format!("activation='{activation}'"));
    }
    if return_sequences {
        args.push("return_sequences=True".to_string());
    }
    if dropout > 0.0 {
        args.push(format!("dropout={}", py_float(dropout)));
    }
    if ctx.is_first {
        if let Some(shape) = ctx.input_shape {
            args.push(format!("input_shape={}", shape.tail_py_tuple()));
        }
    }
    let cell = format!("layers.{keras_name}({})", args.join(", "));
    if bidirectional {
        KerasCode::Add(format!("layers.Bidirectional({cell})"))
    } else {
        KerasCode::Add(cell)
    }
}

struct Lstm;

impl LayerBehavior for Lstm {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        recurrent_shape(input, params, "lstm")
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        recurrent_keras(ctx, "LSTM")
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let units = p.usize_or("units", 128);
        let dropout = p.f64_or("dropout", 0.0);
        let bidirectional = p.bool_or("bidirectional", false);
        let return_sequences = p.bool_or("return_sequences", false);
        let i = ctx.index;
        let input_size = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}self.lstm_{i} = nn.LSTM({input_size}, {units}, batch_first=True, dropout={}, bidirectional={})",
            py_float(dropout),
            py_bool(bidirectional)
        );
        let forward = if return_sequences {
            format!("x, _ = self.lstm_{i}(x)  # keep every timestep")
        } else {
            format!(
                "x, _ = self.lstm_{i}(x)\n        x = x[:, -1, :]  # last timestep only"
            )
        };
        TorchCode::new(definition, forward)
    }
}

struct Gru;

impl LayerBehavior for Gru {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        recurrent_shape(input, params, "gru")
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        recurrent_keras(ctx, "GRU")
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let units = p.usize_or("units", 128);
        let dropout = p.f64_or("dropout", 0.0);
        let bidirectional = p.bool_or("bidirectional", false);
        let return_sequences = p.bool_or("return_sequences", false);
        let i = ctx.index;
        let input_size = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}self.gru_{i} = nn.GRU({input_size}, {units}, batch_first=True, dropout={}, bidirectional={})",
            py_float(dropout),
            py_bool(bidirectional)
        );
        let forward = if return_sequences {
            format!("x, _ = self.gru_{i}(x)")
        } else {
            format!("x, _ = self.gru_{i}(x)\n        x = x[:, -1, :]")
        };
        TorchCode::new(definition, forward)
    }
}

fn recurrent_descriptor(
    type_id: &'static str,
    description: &'static str,
    behavior: impl LayerBehavior + 'static,
) -> LayerDescriptor {
    LayerDescriptor::new(type_id, Category::Recurrent, description, behavior)
        .with_required(&["units"])
        .with_optional("activation", json!("tanh"))
        .with_optional("recurrent_activation", json!("sigmoid"))
        .with_optional("use_bias", json!(true))
        .with_optional("return_sequences", json!(false))
        .with_optional("return_state", json!(false))
        .with_optional("go_backwards", json!(false))
        .with_optional("stateful", json!(false))
        .with_optional("dropout", json!(0.0))
        .with_optional("recurrent_dropout", json!(0.0))
        .with_optional("bidirectional", json!(false))
        .with_constraint("units", Constraint::range(1.0, 2048.0))
        .with_constraint(
            "activation",
            Constraint::Choice(&["tanh", "sigmoid", "relu", "linear"]),
        )
        .with_constraint("dropout", Constraint::range(0.0, 1.0))
}

pub(super) fn lstm() -> LayerDescriptor {
    recurrent_descriptor("lstm", "long short-term memory layer", Lstm)
        .with_constraint("recurrent_dropout", Constraint::range(0.0, 1.0))
}

pub(super) fn gru() -> LayerDescriptor {
    recurrent_descriptor("gru", "gated recurrent unit layer", Gru)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamMap;
    use serde_json::Value;

    fn map(value: Value) -> ParamMap {
        value.as_object().cloned().unwrap_or_default()
    }

    fn ctx<'a>(params: &'a ParamMap, input: Option<&'a Shape>) -> RenderCtx<'a> {
        RenderCtx {
            params: Params::new(params),
            input_shape: input,
            output_shape: None,
            index: 1,
            is_first: false,
        }
    }

    #[test]
    fn test_lstm_drops_time_axis_by_default() {
        let d = lstm();
        let input = Shape::batched(vec![100, 8]);
        let m = map(json!({ "units": 64 }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 64)");
    }

    #[test]
    fn test_lstm_return_sequences_keeps_time_axis() {
        let d = lstm();
        let input = Shape::batched(vec![100, 8]);
        let m = map(json!({ "units": 64, "return_sequences": true }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 100, 64)");
    }

    #[test]
    fn test_bidirectional_doubles_units() {
        let d = gru();
        let input = Shape::batched(vec![50, 16]);
        let m = map(json!({ "units": 32, "bidirectional": true }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 64)");
    }

    #[test]
    fn test_recurrent_requires_rank_three() {
        let d = lstm();
        let input = Shape::batched(vec![784]);
        let m = map(json!({ "units": 64 }));
        assert!(d.output_shape(&input, Params::new(&m)).is_err());
    }

    #[test]
    fn test_keras_bidirectional_wrapper() {
        let d = lstm();
        let m = map(json!({ "units": 64, "bidirectional": true, "dropout": 0.2 }));
        assert_eq!(
            d.keras(&ctx(&m, None)),
            KerasCode::Add("layers.Bidirectional(layers.LSTM(64, dropout=0.2))".to_string())
        );
    }

    #[test]
    fn test_torch_last_timestep_slice() {
        let d = gru();
        let input = Shape::batched(vec![50, 16]);
        let m = map(json!({ "units": 32 }));
        let code = d.torch(&ctx(&m, Some(&input)));
        assert_eq!(
            code.definition,
            "self.gru_1 = nn.GRU(16, 32, batch_first=True, dropout=0.0, bidirectional=False)"
        );
        assert!(code.forward.ends_with("x = x[:, -1, :]"));
    }
}
