// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer descriptors: one value per layer type, bundling its parameter
//! contract, its shape-transfer rule, and its two code-rendering rules.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use shape_core::{Shape, ShapeError};

use crate::constraint::Constraint;
use crate::params::{ParamMap, Params};
use crate::render::{KerasCode, RenderCtx, TorchCode};

/// Coarse grouping used for listing and for sequencing decisions.
///
/// `DataSource` layers produce data rather than transform it; the orderer
/// excludes them from the processing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Basic,
    Convolution,
    Pooling,
    Recurrent,
    Activation,
    Normalization,
    Regularization,
    Attention,
    Reshaping,
    DataSource,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Basic => "basic",
            Category::Convolution => "convolution",
            Category::Pooling => "pooling",
            Category::Recurrent => "recurrent",
            Category::Activation => "activation",
            Category::Normalization => "normalization",
            Category::Regularization => "regularization",
            Category::Attention => "attention",
            Category::Reshaping => "reshaping",
            Category::DataSource => "data_source",
        }
    }
}

/// The behavioural half of a descriptor.
///
/// Implementations are pure: the same inputs always produce the same
/// outputs, and nothing here touches ambient state. That keeps every rule
/// unit-testable in isolation and the whole pipeline deterministic.
pub trait LayerBehavior: Send + Sync {
    /// Maps an input shape to this layer's output shape.
    fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError>;

    /// Renders the layer for the sequential-style backend.
    fn keras(&self, ctx: &RenderCtx) -> KerasCode;

    /// Renders the layer for the object-style backend.
    fn torch(&self, ctx: &RenderCtx) -> TorchCode;

    /// Cross-parameter checks beyond the declarative per-parameter
    /// constraints (e.g. divisibility between two parameters). Returns
    /// human-readable error messages.
    fn check_params(&self, _params: Params) -> Vec<String> {
        Vec::new()
    }
}

/// Outcome of validating one layer instance's parameter map.
#[derive(Debug, Default)]
pub struct ParamCheck {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// The complete, immutable contract of one layer type.
pub struct LayerDescriptor {
    type_id: &'static str,
    category: Category,
    description: &'static str,
    required: Vec<&'static str>,
    optional: BTreeMap<&'static str, Value>,
    constraints: Vec<(&'static str, Constraint)>,
    behavior: Box<dyn LayerBehavior>,
}

impl LayerDescriptor {
    pub fn new(
        type_id: &'static str,
        category: Category,
        description: &'static str,
        behavior: impl LayerBehavior + 'static,
    ) -> Self {
        Self {
            type_id,
            category,
            description,
            required: Vec::new(),
            optional: BTreeMap::new(),
            constraints: Vec::new(),
            behavior: Box::new(behavior),
        }
    }

    pub fn with_required(mut self, names: &[&'static str]) -> Self {
        self.required.extend_from_slice(names);
        self
    }

    pub fn with_optional(mut self, name: &'static str, default: Value) -> Self {
        self.optional.insert(name, default);
        self
    }

    pub fn with_constraint(mut self, name: &'static str, constraint: Constraint) -> Self {
        self.constraints.push((name, constraint));
        self
    }

    pub fn type_id(&self) -> &'static str {
        self.type_id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn is_data_source(&self) -> bool {
        self.category == Category::DataSource
    }

    /// Validates a raw parameter map against this descriptor's contract.
    ///
    /// Missing required parameters and constraint violations are errors;
    /// parameters the contract does not know are warnings (forward
    /// compatibility: they are passed through to rendering untouched).
    pub fn validate_params(&self, map: &ParamMap) -> ParamCheck {
        let mut check = ParamCheck::default();

        for name in &self.required {
            if !map.contains_key(*name) {
                check
                    .errors
                    .push(format!("missing required parameter '{name}'"));
            }
        }

        for (name, constraint) in &self.constraints {
            if let Some(value) = map.get(*name) {
                if let Err(err) = constraint.check(name, value) {
                    check.errors.push(err.to_string());
                }
            }
        }

        for name in map.keys() {
            let known = self.required.iter().any(|r| r == name)
                || self.optional.contains_key(name.as_str());
            if !known {
                check
                    .warnings
                    .push(format!("unknown parameter '{name}' will be ignored"));
            }
        }

        check
            .errors
            .extend(self.behavior.check_params(Params::new(map)));
        check
    }

    pub fn output_shape(&self, input: &Shape, params: Params) -> Result<Shape, ShapeError> {
        self.behavior.output_shape(input, params)
    }

    pub fn keras(&self, ctx: &RenderCtx) -> KerasCode {
        self.behavior.keras(ctx)
    }

    pub fn torch(&self, ctx: &RenderCtx) -> TorchCode {
        self.behavior.torch(ctx)
    }

    /// A JSON summary of the contract, served by the listing operation.
    pub fn info(&self) -> Value {
        json!({
            "type": self.type_id,
            "category": self.category.as_str(),
            "description": self.description,
            "required_parameters": self.required,
            "optional_parameters": self.optional,
        })
    }
}

impl std::fmt::Debug for LayerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerDescriptor")
            .field("type_id", &self.type_id)
            .field("category", &self.category)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}
