// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The JSON model specification: what the client sends.
//!
//! A spec names a target framework, an optional input shape, a list of
//! layers, and an optional set of connections between layer ids. Everything
//! beyond JSON well-formedness is validated later, during compilation, so a
//! structurally sloppy spec still parses and gets a full diagnostic report.

use crate::SpecError;
use layer_catalog::ParamMap;
use serde::{Deserialize, Serialize};
use shape_core::Shape;
use std::path::Path;

/// Fallback model name when the spec does not provide one.
pub const DEFAULT_MODEL_NAME: &str = "CustomModel";

/// The code-generation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// TensorFlow / Keras `Sequential` code.
    #[default]
    Tensorflow,
    /// PyTorch `nn.Module` code.
    Pytorch,
}

impl Backend {
    /// Parses a backend name, accepting the common aliases.
    pub fn from_str_loose(s: &str) -> Option<Backend> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tensorflow" | "tf" | "keras" => Some(Backend::Tensorflow),
            "pytorch" | "torch" => Some(Backend::Pytorch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Tensorflow => "tensorflow",
            Backend::Pytorch => "pytorch",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One layer entry in a model spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Layer type id, looked up in the catalog. Absence is a diagnostic,
    /// not a parse error.
    #[serde(rename = "type", default)]
    pub type_id: Option<String>,

    /// Instance id, referenced by connections.
    #[serde(default)]
    pub id: Option<String>,

    /// Optional human-readable name.
    #[serde(default)]
    pub name: Option<String>,

    /// Layer parameters, validated against the catalog descriptor.
    #[serde(default)]
    pub parameters: ParamMap,

    /// Whether the layer's weights train. Only affects analysis output.
    #[serde(default = "default_trainable")]
    pub trainable: bool,
}

fn default_trainable() -> bool {
    true
}

impl LayerSpec {
    /// The id used in the connection graph: the explicit `id`, or a
    /// position-derived fallback so unnamed layers still order correctly.
    pub fn instance_id(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("layer_{index}"),
        }
    }
}

/// A directed edge in the connection graph: data flows source → target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
}

/// A complete model specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model name, used for generated function/class names.
    #[serde(default)]
    pub name: Option<String>,

    /// Declared input shape, e.g. `[null, 28, 28, 1]`.
    #[serde(default)]
    pub input_shape: Option<Shape>,

    /// Code-generation target. Defaults to TensorFlow.
    #[serde(default)]
    pub framework: Backend,

    #[serde(default)]
    pub layers: Vec<LayerSpec>,

    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl ModelSpec {
    /// Parses a spec from a JSON string.
    pub fn from_json(json: &str) -> Result<ModelSpec, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a spec file.
    pub fn from_file(path: &Path) -> Result<ModelSpec, SpecError> {
        let contents = std::fs::read_to_string(path)?;
        ModelSpec::from_json(&contents)
    }

    /// The model name, falling back to [`DEFAULT_MODEL_NAME`].
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_MODEL_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_spec() {
        let spec = ModelSpec::from_json(
            r#"{
                "input_shape": [null, 784],
                "layers": [
                    { "type": "dense", "parameters": { "units": 10 } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(spec.framework, Backend::Tensorflow);
        assert_eq!(spec.display_name(), "CustomModel");
        assert_eq!(spec.layers.len(), 1);
        assert_eq!(spec.layers[0].type_id.as_deref(), Some("dense"));
        assert!(spec.layers[0].trainable);
        assert_eq!(
            spec.input_shape.as_ref().unwrap().dims(),
            &[None, Some(784)]
        );
    }

    #[test]
    fn test_parse_full_spec() {
        let spec = ModelSpec::from_json(
            r#"{
                "name": "MnistNet",
                "framework": "pytorch",
                "input_shape": [null, 28, 28, 1],
                "layers": [
                    { "type": "conv2d", "id": "c1", "parameters": { "filters": 32, "kernel_size": [3, 3] } },
                    { "type": "flatten", "id": "f1", "trainable": false },
                    { "type": "dense", "id": "d1", "parameters": { "units": 10, "activation": "softmax" } }
                ],
                "connections": [
                    { "source": "c1", "target": "f1" },
                    { "source": "f1", "target": "d1" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(spec.framework, Backend::Pytorch);
        assert_eq!(spec.display_name(), "MnistNet");
        assert_eq!(spec.connections.len(), 2);
        assert!(!spec.layers[1].trainable);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = ModelSpec::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SpecError::ParseError(_)));
    }

    #[test]
    fn test_missing_type_parses() {
        // Semantic validation happens at compile time, not parse time.
        let spec = ModelSpec::from_json(r#"{ "layers": [ { "id": "x" } ] }"#).unwrap();
        assert!(spec.layers[0].type_id.is_none());
    }

    #[test]
    fn test_backend_aliases() {
        assert_eq!(Backend::from_str_loose("TF"), Some(Backend::Tensorflow));
        assert_eq!(Backend::from_str_loose("keras"), Some(Backend::Tensorflow));
        assert_eq!(Backend::from_str_loose("torch"), Some(Backend::Pytorch));
        assert_eq!(Backend::from_str_loose("jax"), None);
    }

    #[test]
    fn test_instance_id_fallback() {
        let spec = ModelSpec::from_json(r#"{ "layers": [ { "type": "flatten" } ] }"#).unwrap();
        assert_eq!(spec.layers[0].instance_id(3), "layer_3");
    }
}
