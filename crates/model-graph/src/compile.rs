// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Spec compilation: validation, ordering, and shape propagation in one
//! pass over the layer list.
//!
//! Compilation never fails outright. It produces a [`Compilation`] holding
//! the shape-annotated model (when there was anything to compile) and a
//! [`Report`] with every diagnostic found, so a client can fix all problems
//! in one round trip. Layer positions in messages are 1-based.

use crate::{execution_order, Backend, ModelSpec, Report};
use layer_catalog::{Catalog, ParamMap, Params};
use serde::Serialize;
use shape_core::Shape;
use std::collections::HashSet;

/// One shape-annotated processing layer, ready for code generation.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    /// Position in the execution sequence, 0-based.
    pub position: usize,
    /// Catalog layer type.
    pub type_id: String,
    /// Connection-graph id of the layer instance.
    pub instance_id: String,
    /// Human-readable name (explicit `name`, else the type id).
    pub display_name: String,
    pub parameters: ParamMap,
    pub trainable: bool,
    /// Input shape, when propagation reached this layer.
    pub input_shape: Option<Shape>,
    /// Output shape, when computable.
    pub output_shape: Option<Shape>,
}

/// The compiled model: execution-ordered, shape-annotated layers.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledModel {
    pub name: String,
    pub backend: Backend,
    /// Input shape after data sources were applied.
    pub input_shape: Option<Shape>,
    /// Shape leaving the last layer, when propagation completed.
    pub output_shape: Option<Shape>,
    pub steps: Vec<Step>,
}

/// The result of compiling a spec: the model plus all diagnostics.
#[derive(Debug)]
pub struct Compilation {
    /// `None` only when the spec had no layers at all.
    pub model: Option<CompiledModel>,
    pub report: Report,
}

/// Compiles `spec` against `catalog`.
pub fn compile(spec: &ModelSpec, catalog: &Catalog) -> Compilation {
    let mut report = Report::new();

    if spec.layers.is_empty() {
        report.error("model must contain at least one layer");
        return Compilation {
            model: None,
            report,
        };
    }

    check_ids(spec, &mut report);
    check_layers(spec, catalog, &mut report);

    let order = execution_order(spec, catalog);
    if order.cycle_detected {
        report.warning("connection graph may contain a cycle; using declaration order");
    }

    // Seed shape propagation: explicit input_shape first, then whatever the
    // data sources declare.
    let mut current = spec.input_shape.clone();
    for &i in &order.sources {
        let layer = &spec.layers[i];
        let Some(descriptor) = layer.type_id.as_deref().and_then(|t| catalog.get(t)) else {
            continue;
        };
        let seed = current.clone().unwrap_or_else(|| Shape::new(vec![]));
        match descriptor.output_shape(&seed, Params::new(&layer.parameters)) {
            // A rank-0 result means the source declared nothing.
            Ok(shape) if shape.rank() > 0 => current = Some(shape),
            Ok(_) => {}
            Err(e) => {
                report.error(format!(
                    "layer {} ({}): {e}",
                    i + 1,
                    descriptor.type_id()
                ));
            }
        }
    }
    let input_shape = current.clone();

    let mut steps = Vec::with_capacity(order.processing.len());
    for &i in &order.processing {
        let layer = &spec.layers[i];
        let Some(descriptor) = layer.type_id.as_deref().and_then(|t| catalog.get(t)) else {
            // Already reported; the layer cannot participate in propagation.
            current = None;
            continue;
        };

        let step_input = current.clone();
        let output = match &current {
            Some(shape) => {
                match descriptor.output_shape(shape, Params::new(&layer.parameters)) {
                    Ok(out) => Some(out),
                    Err(e) => {
                        report.error(format!(
                            "layer {} ({}): {e}",
                            i + 1,
                            descriptor.type_id()
                        ));
                        None
                    }
                }
            }
            None => None,
        };
        current = output.clone();

        steps.push(Step {
            position: steps.len(),
            type_id: descriptor.type_id().to_string(),
            instance_id: layer.instance_id(i),
            display_name: layer
                .name
                .clone()
                .unwrap_or_else(|| descriptor.type_id().to_string()),
            parameters: layer.parameters.clone(),
            trainable: layer.trainable,
            input_shape: step_input,
            output_shape: output,
        });
    }

    // Completeness checks only make sense for a structurally valid model.
    if report.is_valid() {
        if current.is_none() {
            report.warning("could not determine the model output shape");
        }
        if let Some(last) = steps.last() {
            if !is_output_layer(last) {
                report.suggestion(
                    "model does not end with an output layer; consider adding dense, softmax, or sigmoid",
                );
            }
        }
    }

    Compilation {
        model: Some(CompiledModel {
            name: spec.display_name().to_string(),
            backend: spec.framework,
            input_shape,
            output_shape: current,
            steps,
        }),
        report,
    }
}

/// Whether a final layer already looks like a classifier head: a dense
/// layer, or a standalone softmax/sigmoid activation.
fn is_output_layer(step: &Step) -> bool {
    match step.type_id.as_str() {
        "dense" => true,
        "activation" => matches!(
            Params::new(&step.parameters).str_or("activation_type", ""),
            "softmax" | "sigmoid"
        ),
        _ => false,
    }
}

/// Reports duplicate layer ids and connections to ids that do not exist.
fn check_ids(spec: &ModelSpec, report: &mut Report) {
    let mut seen = HashSet::new();
    for layer in &spec.layers {
        if let Some(id) = &layer.id {
            if !seen.insert(id.as_str()) {
                report.error(format!("duplicate layer id '{id}'"));
            }
        }
    }

    let ids: HashSet<String> = spec
        .layers
        .iter()
        .enumerate()
        .map(|(i, l)| l.instance_id(i))
        .collect();
    for conn in &spec.connections {
        for id in [&conn.source, &conn.target] {
            if !ids.contains(id) {
                report.warning(format!("connection references unknown layer id '{id}'"));
            }
        }
    }
}

/// Per-layer structural and parameter validation, in declaration order.
fn check_layers(spec: &ModelSpec, catalog: &Catalog, report: &mut Report) {
    for (i, layer) in spec.layers.iter().enumerate() {
        let n = i + 1;
        match layer.type_id.as_deref() {
            None => report.error(format!("layer {n}: missing 'type' field")),
            Some(type_id) => match catalog.get(type_id) {
                None => report.error(format!("layer {n}: unknown layer type '{type_id}'")),
                Some(descriptor) => {
                    let check = descriptor.validate_params(&layer.parameters);
                    report.absorb_check(&format!("layer {n} ({type_id})"), check);
                }
            },
        }
    }
}
