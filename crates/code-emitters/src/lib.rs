// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Source-code emitters: compiled model → runnable Python.
//!
//! Each emitter walks the execution-ordered, shape-annotated steps of a
//! [`CompiledModel`] and assembles a complete training-ready script for its
//! backend. Emission is infallible: layers a backend cannot express render
//! as explanatory comments instead of failing the whole model.

mod keras;
mod torch;

pub use keras::KerasEmitter;
pub use torch::TorchEmitter;

use layer_catalog::Catalog;
use model_graph::{Backend, CompiledModel};
use serde::Serialize;
use shape_core::Shape;

/// The generated code, split the way clients consume it.
#[derive(Debug, Clone, Serialize)]
pub struct CodeBundle {
    /// Import statements, one per line.
    pub imports: String,
    /// The model definition plus instantiation footer.
    pub model_definition: String,
    /// Imports and definition joined into one runnable script.
    pub complete_code: String,
}

impl CodeBundle {
    fn assemble(imports: String, model_definition: String) -> Self {
        let complete_code = format!("{imports}\n\n{model_definition}");
        Self {
            imports,
            model_definition,
            complete_code,
        }
    }
}

/// A backend code generator.
pub trait Emitter {
    fn backend(&self) -> Backend;

    /// Generates the full script for `model`, resolving layer render rules
    /// through `catalog`.
    fn emit(&self, model: &CompiledModel, catalog: &Catalog) -> CodeBundle;
}

/// Returns the emitter for `backend`.
pub fn emitter_for(backend: Backend) -> Box<dyn Emitter> {
    match backend {
        Backend::Tensorflow => Box::new(KerasEmitter),
        Backend::Pytorch => Box::new(TorchEmitter),
    }
}

/// The input shape rendered for docstrings, or `unknown`.
fn shape_or_unknown(shape: &Option<Shape>) -> String {
    match shape {
        Some(s) => s.to_py_tuple(),
        None => "unknown".to_string(),
    }
}

/// Lowercases `name` into a Python function-name fragment.
fn snake_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_').to_string();
    if trimmed.is_empty() {
        "model".to_string()
    } else {
        trimmed
    }
}

/// Reduces `name` to a valid Python class name, keeping its casing.
fn class_ident(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match cleaned.chars().next() {
        None => "CustomModel".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{cleaned}"),
        Some(_) => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_ident() {
        assert_eq!(snake_ident("CustomModel"), "custommodel");
        assert_eq!(snake_ident("My MNIST Net"), "my_mnist_net");
        assert_eq!(snake_ident("__"), "model");
    }

    #[test]
    fn test_class_ident() {
        assert_eq!(class_ident("CustomModel"), "CustomModel");
        assert_eq!(class_ident("My Net!"), "MyNet");
        assert_eq!(class_ident("3dNet"), "_3dNet");
        assert_eq!(class_ident("  "), "CustomModel");
    }

    #[test]
    fn test_emitter_for_dispatch() {
        assert_eq!(
            emitter_for(Backend::Tensorflow).backend(),
            Backend::Tensorflow
        );
        assert_eq!(emitter_for(Backend::Pytorch).backend(), Backend::Pytorch);
    }
}
