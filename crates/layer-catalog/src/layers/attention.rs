// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Attention layers.
//!
//! The sequential backend only has a native layer for multi-head and
//! additive attention; the remaining variants render explanatory comments
//! there and full query/key/value wiring on the object backend.

use serde_json::json;
use shape_core::{Shape, ShapeError};

use crate::constraint::Constraint;
use crate::descriptor::{Category, LayerBehavior, LayerDescriptor};
use crate::params::Params;
use crate::render::{
    py_bool, py_float, torch_in_features, unknown_input_note, KerasCode, RenderCtx, TorchCode,
};

// ── MultiHeadAttention ──────────────────────────────────────────────────────

struct MultiHeadAttention;

impl LayerBehavior for MultiHeadAttention {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        let num_heads = p.usize_or("num_heads", 8);
        let key_dim = p.usize_or("key_dim", 64);
        let dropout = p.f64_or("dropout", 0.0);

        let mut args = vec![format!("num_heads={num_heads}"), format!("key_dim={key_dim}")];
        if dropout > 0.0 {
            args.push(format!("dropout={}", py_float(dropout)));
        }
        KerasCode::Add(format!("layers.MultiHeadAttention({})", args.join(", ")))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let num_heads = p.usize_or("num_heads", 8);
        let key_dim = p.usize_or("key_dim", 64);
        let dropout = p.f64_or("dropout", 0.0);
        let embed_dim = key_dim * num_heads;
        let i = ctx.index;

        TorchCode::new(
            format!(
                "self.multihead_attn_{i} = nn.MultiheadAttention(embed_dim={embed_dim}, num_heads={num_heads}, dropout={}, batch_first=True)",
                py_float(dropout)
            ),
            format!("x, _ = self.multihead_attn_{i}(x, x, x)  # self-attention"),
        )
    }

    fn check_params(&self, params: Params) -> Vec<String> {
        let key_dim = params.usize_or("key_dim", 64);
        let num_heads = params.usize_or("num_heads", 8);
        if num_heads > 0 && key_dim % num_heads != 0 {
            vec![format!(
                "key_dim ({key_dim}) must be divisible by num_heads ({num_heads})"
            )]
        } else {
            Vec::new()
        }
    }
}

pub(super) fn multi_head_attention() -> LayerDescriptor {
    LayerDescriptor::new(
        "multi_head_attention",
        Category::Attention,
        "scaled dot-product attention with multiple heads",
        MultiHeadAttention,
    )
    .with_required(&["num_heads", "key_dim"])
    .with_optional("value_dim", json!(null))
    .with_optional("dropout", json!(0.0))
    .with_optional("use_bias", json!(true))
    .with_optional("output_shape", json!(null))
    .with_optional("attention_axes", json!(null))
    .with_constraint("num_heads", Constraint::range(1.0, 32.0))
    .with_constraint("key_dim", Constraint::range(8.0, 512.0))
    .with_constraint("dropout", Constraint::range(0.0, 1.0))
}

// ── SelfAttention ───────────────────────────────────────────────────────────

struct SelfAttention;

impl LayerBehavior for SelfAttention {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        let p = ctx.params;
        KerasCode::Comment(format!(
            "# self-attention needs a custom Keras layer (units={}, use_scale={})",
            p.usize_or("units", 64),
            py_bool(p.bool_or("use_scale", true))
        ))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let units = p.usize_or("units", 64);
        let dropout = py_float(p.f64_or("dropout", 0.0));
        let i = ctx.index;
        let input_dim = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}# self-attention projections\n        \
             self.query_{i} = nn.Linear({input_dim}, {units})\n        \
             self.key_{i} = nn.Linear({input_dim}, {units})\n        \
             self.value_{i} = nn.Linear({input_dim}, {units})\n        \
             self.attention_dropout_{i} = nn.Dropout({dropout})"
        );
        let forward = format!(
            "Q = self.query_{i}(x)\n        \
             K = self.key_{i}(x)\n        \
             V = self.value_{i}(x)\n        \
             attention_scores = torch.matmul(Q, K.transpose(-2, -1)) / math.sqrt({units})\n        \
             attention_weights = F.softmax(attention_scores, dim=-1)\n        \
             attention_weights = self.attention_dropout_{i}(attention_weights)\n        \
             x = torch.matmul(attention_weights, V)"
        );
        TorchCode::new(definition, forward)
    }
}

pub(super) fn self_attention() -> LayerDescriptor {
    LayerDescriptor::new(
        "self_attention",
        Category::Attention,
        "single-head dot-product self-attention",
        SelfAttention,
    )
    .with_required(&["units"])
    .with_optional("use_scale", json!(true))
    .with_optional("dropout", json!(0.0))
    .with_constraint("units", Constraint::range(8.0, 512.0))
    .with_constraint("dropout", Constraint::range(0.0, 1.0))
}

// ── AdditiveAttention ───────────────────────────────────────────────────────

struct AdditiveAttention;

impl LayerBehavior for AdditiveAttention {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        KerasCode::Add(format!(
            "layers.AdditiveAttention(use_scale={})",
            py_bool(ctx.params.bool_or("use_scale", false))
        ))
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let units = p.usize_or("units", 64);
        let dropout = py_float(p.f64_or("dropout", 0.0));
        let i = ctx.index;
        let input_dim = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}# additive (Bahdanau) attention\n        \
             self.W_q_{i} = nn.Linear({input_dim}, {units})\n        \
             self.W_k_{i} = nn.Linear({input_dim}, {units})\n        \
             self.W_v_{i} = nn.Linear({units}, 1)\n        \
             self.attention_dropout_{i} = nn.Dropout({dropout})"
        );
        let forward = format!(
            "query = self.W_q_{i}(x)\n        \
             key = self.W_k_{i}(x)\n        \
             score = self.W_v_{i}(torch.tanh(query + key))\n        \
             attention_weights = F.softmax(score, dim=1)\n        \
             attention_weights = self.attention_dropout_{i}(attention_weights)\n        \
             x = torch.sum(attention_weights * x, dim=1, keepdim=True)"
        );
        TorchCode::new(definition, forward)
    }
}

pub(super) fn additive_attention() -> LayerDescriptor {
    LayerDescriptor::new(
        "additive_attention",
        Category::Attention,
        "Bahdanau-style additive attention",
        AdditiveAttention,
    )
    .with_required(&["units"])
    .with_optional("use_scale", json!(false))
    .with_optional("dropout", json!(0.0))
    .with_constraint("units", Constraint::range(8.0, 512.0))
    .with_constraint("dropout", Constraint::range(0.0, 1.0))
}

// ── AttentionPooling ────────────────────────────────────────────────────────

struct AttentionPooling;

impl LayerBehavior for AttentionPooling {
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        if input.rank() < 2 {
            return Ok(input.clone());
        }
        let pool_size = params.usize_or("pool_size", 2).max(1);
        let timesteps = input.known_dim(1)?;
        Ok(Shape::new(vec![
            input.dim(0),
            Some(timesteps / pool_size),
            input.last(),
        ]))
    }

    fn keras(&self, _ctx: &RenderCtx) -> KerasCode {
        KerasCode::Comment("# attention pooling needs a custom Keras layer".to_string())
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let pool_size = p.usize_or("pool_size", 2);
        let dropout = py_float(p.f64_or("dropout", 0.0));
        let i = ctx.index;
        let input_dim = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}# attention pooling\n        \
             self.attention_weights_{i} = nn.Linear({input_dim}, 1)\n        \
             self.pool_dropout_{i} = nn.Dropout({dropout})"
        );
        let forward = format!(
            "batch_size, seq_len, hidden_dim = x.shape\n        \
             x_reshaped = x.view(batch_size, seq_len // {pool_size}, {pool_size}, hidden_dim)\n        \
             attn_scores = self.attention_weights_{i}(x_reshaped)\n        \
             attn_weights = F.softmax(attn_scores, dim=2)\n        \
             attn_weights = self.pool_dropout_{i}(attn_weights)\n        \
             x = torch.sum(attn_weights * x_reshaped, dim=2)"
        );
        TorchCode::new(definition, forward)
    }
}

pub(super) fn attention_pooling() -> LayerDescriptor {
    LayerDescriptor::new(
        "attention_pooling",
        Category::Attention,
        "pools the time axis with learned attention weights",
        AttentionPooling,
    )
    .with_optional("pool_size", json!(2))
    .with_optional("dropout", json!(0.0))
    .with_constraint("pool_size", Constraint::range(1.0, 10.0))
    .with_constraint("dropout", Constraint::range(0.0, 1.0))
}

// ── CrossAttention ──────────────────────────────────────────────────────────

struct CrossAttention;

impl LayerBehavior for CrossAttention {
    fn output_shape(&self, input: &Shape, _params: Params) -> Result<Shape, ShapeError> {
        Ok(input.clone())
    }

    fn keras(&self, _ctx: &RenderCtx) -> KerasCode {
        KerasCode::Comment("# cross-attention needs a custom Keras layer".to_string())
    }

    fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        let p = ctx.params;
        let units = p.usize_or("units", 64);
        let dropout = py_float(p.f64_or("dropout", 0.0));
        let i = ctx.index;
        let input_dim = torch_in_features(ctx);
        let note = unknown_input_note(ctx);

        let definition = format!(
            "{note}# cross-attention projections\n        \
             self.cross_query_{i} = nn.Linear({input_dim}, {units})\n        \
             self.cross_key_{i} = nn.Linear({input_dim}, {units})\n        \
             self.cross_value_{i} = nn.Linear({input_dim}, {units})\n        \
             self.cross_dropout_{i} = nn.Dropout({dropout})"
        );
        let forward = format!(
            "# cross-attention needs a second input for keys and values\n        \
             Q = self.cross_query_{i}(x)\n        \
             # K = self.cross_key_{i}(other_input)\n        \
             # V = self.cross_value_{i}(other_input)"
        );
        TorchCode::new(definition, forward)
    }
}

pub(super) fn cross_attention() -> LayerDescriptor {
    LayerDescriptor::new(
        "cross_attention",
        Category::Attention,
        "attention where keys and values come from a second input",
        CrossAttention,
    )
    .with_required(&["units"])
    .with_optional("dropout", json!(0.0))
    .with_optional("use_bias", json!(true))
    .with_constraint("units", Constraint::range(8.0, 512.0))
    .with_constraint("dropout", Constraint::range(0.0, 1.0))
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
            index: 0,
            is_first: false,
        }
    }

    #[test]
    fn test_mha_divisibility_check() {
        let d = multi_head_attention();
        let check = d.validate_params(&map(json!({ "num_heads": 8, "key_dim": 65 })));
        assert!(check.errors[0].contains("divisible"));

        let check = d.validate_params(&map(json!({ "num_heads": 8, "key_dim": 64 })));
        assert!(check.errors.is_empty());
    }

    #[test]
    fn test_mha_torch_embed_dim() {
        let d = multi_head_attention();
        let m = map(json!({ "num_heads": 8, "key_dim": 64 }));
        let torch = d.torch(&ctx(&m, None));
        assert!(torch.definition.contains("embed_dim=512, num_heads=8"));
    }

    #[test]
    fn test_mha_keras_omits_zero_dropout() {
        let d = multi_head_attention();
        let m = map(json!({ "num_heads": 4, "key_dim": 32 }));
        assert_eq!(
            d.keras(&ctx(&m, None)),
            KerasCode::Add("layers.MultiHeadAttention(num_heads=4, key_dim=32)".to_string())
        );
    }

    #[test]
    fn test_self_attention_keras_is_comment() {
        let d = self_attention();
        let m = map(json!({ "units": 64 }));
        assert!(matches!(d.keras(&ctx(&m, None)), KerasCode::Comment(_)));
    }

    #[test]
    fn test_self_attention_torch_projections() {
        let d = self_attention();
        let input = Shape::batched(vec![10, 32]);
        let m = map(json!({ "units": 64 }));
        let torch = d.torch(&ctx(&m, Some(&input)));
        assert!(torch.definition.contains("self.query_0 = nn.Linear(32, 64)"));
        assert!(torch.forward.contains("math.sqrt(64)"));
    }

    #[test]
    fn test_attention_pooling_shrinks_time_axis() {
        let d = attention_pooling();
        let input = Shape::batched(vec![10, 64]);
        let m = map(json!({ "pool_size": 2 }));
        let out = d.output_shape(&input, Params::new(&m)).unwrap();
        assert_eq!(out.to_py_tuple(), "(None, 5, 64)");
    }
}
