// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The high-level pipeline: validate, build, analyze.
//!
//! All three operations are pure functions of the spec: they share the
//! compilation pass and differ only in what they do with its result.
//! Outcomes serialise directly to the JSON the service boundary returns.

use crate::estimate::estimate_parameters;
use code_emitters::{emitter_for, CodeBundle};
use layer_catalog::Catalog;
use model_graph::{compile, ModelSpec, Report};
use serde::Serialize;
use shape_core::Shape;

/// The result of validating a spec.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

/// The result of building code from a spec.
#[derive(Debug, Serialize)]
pub struct BuildOutcome {
    pub success: bool,
    /// Present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeBundle>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Per-layer complexity breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct LayerDetail {
    pub layer_index: usize,
    pub layer_type: String,
    pub input_shape: Option<Shape>,
    pub output_shape: Option<Shape>,
    pub parameters: u64,
    pub trainable: bool,
}

/// Model complexity summary.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub total_parameters: u64,
    pub total_layers: usize,
    pub input_shape: Option<Shape>,
    pub output_shape: Option<Shape>,
    pub layer_details: Vec<LayerDetail>,
}

/// The result of analysing a spec.
#[derive(Debug, Serialize)]
pub struct AnalysisOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    pub errors: Vec<String>,
}

/// Validates, builds, and analyses model specs against a layer catalog.
pub struct ModelBuilder {
    catalog: &'static Catalog,
}

impl ModelBuilder {
    /// A builder over the standard catalog.
    pub fn new() -> Self {
        Self {
            catalog: Catalog::global(),
        }
    }

    /// A builder over a caller-provided catalog.
    pub fn with_catalog(catalog: &'static Catalog) -> Self {
        Self { catalog }
    }

    /// Checks a spec and reports every problem found, without generating
    /// any code.
    pub fn validate(&self, spec: &ModelSpec) -> ValidationOutcome {
        let compilation = compile(spec, self.catalog);
        let Report {
            errors,
            warnings,
            suggestions,
        } = compilation.report;
        ValidationOutcome {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            suggestions,
        }
    }

    /// Compiles the spec and, when it is valid, emits code for its target
    /// framework.
    pub fn build(&self, spec: &ModelSpec) -> BuildOutcome {
        let compilation = compile(spec, self.catalog);
        let Report {
            errors,
            warnings,
            suggestions,
        } = compilation.report;

        if !errors.is_empty() {
            return BuildOutcome {
                success: false,
                code: None,
                errors,
                warnings,
                suggestions,
            };
        }

        // A valid report implies a compiled model.
        let Some(model) = compilation.model else {
            return BuildOutcome {
                success: false,
                code: None,
                errors,
                warnings,
                suggestions,
            };
        };
        let code = emitter_for(spec.framework).emit(&model, self.catalog);
        tracing::info!(
            model = %model.name,
            backend = %spec.framework,
            layers = model.steps.len(),
            "built model code"
        );
        BuildOutcome {
            success: true,
            code: Some(code),
            errors,
            warnings,
            suggestions,
        }
    }

    /// Estimates model complexity: per-layer and total parameter counts
    /// alongside the propagated shapes.
    pub fn analyze(&self, spec: &ModelSpec) -> AnalysisOutcome {
        let compilation = compile(spec, self.catalog);
        if !compilation.report.is_valid() {
            return AnalysisOutcome {
                success: false,
                analysis: None,
                errors: compilation.report.errors,
            };
        }
        let Some(model) = compilation.model else {
            return AnalysisOutcome {
                success: false,
                analysis: None,
                errors: Vec::new(),
            };
        };

        let mut total = 0u64;
        let mut details = Vec::with_capacity(model.steps.len());
        for step in &model.steps {
            let parameters = estimate_parameters(step);
            total += parameters;
            details.push(LayerDetail {
                layer_index: step.position,
                layer_type: step.type_id.clone(),
                input_shape: step.input_shape.clone(),
                output_shape: step.output_shape.clone(),
                parameters,
                trainable: step.trainable,
            });
        }

        AnalysisOutcome {
            success: true,
            analysis: Some(Analysis {
                total_parameters: total,
                total_layers: model.steps.len(),
                input_shape: model.input_shape.clone(),
                output_shape: model.output_shape.clone(),
                layer_details: details,
            }),
            errors: Vec::new(),
        }
    }

    /// The catalog description clients use to populate layer palettes.
    pub fn available_layers(&self) -> serde_json::Value {
        self.catalog.info()
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
