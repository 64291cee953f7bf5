// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! TensorFlow/Keras emitter: builds a `Sequential` model inside a factory
//! function, then compiles and summarises it.

use crate::{class_ident, shape_or_unknown, snake_ident, CodeBundle, Emitter};
use layer_catalog::{Catalog, KerasCode, Params, RenderCtx};
use model_graph::{Backend, CompiledModel};

/// Layer types whose generated code needs `tensorflow_addons`.
const ADDONS_LAYERS: &[&str] = &[
    "group_normalization",
    "instance_normalization",
    "spectral_normalization",
];

pub struct KerasEmitter;

impl Emitter for KerasEmitter {
    fn backend(&self) -> Backend {
        Backend::Tensorflow
    }

    fn emit(&self, model: &CompiledModel, catalog: &Catalog) -> CodeBundle {
        let mut imports = vec![
            "import tensorflow as tf",
            "from tensorflow.keras import layers, models",
            "import numpy as np",
        ];
        if model
            .steps
            .iter()
            .any(|s| ADDONS_LAYERS.contains(&s.type_id.as_str()))
        {
            imports.push("import tensorflow_addons as tfa");
        }

        let fn_name = snake_ident(&model.name);
        let mut lines = Vec::new();
        lines.push(format!("def create_{fn_name}():"));
        lines.push("    \"\"\"".to_string());
        lines.push(format!("    Builds the {} model.", class_ident(&model.name)));
        lines.push(format!(
            "    Input shape: {}",
            shape_or_unknown(&model.input_shape)
        ));
        lines.push("    \"\"\"".to_string());
        lines.push("    model = models.Sequential()".to_string());
        lines.push(String::new());

        for step in &model.steps {
            let Some(descriptor) = catalog.get(&step.type_id) else {
                lines.push(format!("    # unsupported layer type: {}", step.type_id));
                continue;
            };
            let ctx = RenderCtx {
                params: Params::new(&step.parameters),
                input_shape: step.input_shape.as_ref(),
                output_shape: step.output_shape.as_ref(),
                index: step.position,
                is_first: step.position == 0,
            };
            match descriptor.keras(&ctx) {
                KerasCode::Add(expr) => lines.push(format!("    model.add({expr})")),
                KerasCode::Comment(comment) => lines.push(format!("    {comment}")),
            }
        }

        lines.push(String::new());
        lines.push("    return model".to_string());
        lines.push(String::new());
        lines.push(format!("model = create_{fn_name}()"));
        lines.push(String::new());
        lines.push("model.compile(".to_string());
        lines.push("    optimizer='adam',".to_string());
        lines.push("    loss='categorical_crossentropy',".to_string());
        lines.push("    metrics=['accuracy']".to_string());
        lines.push(")".to_string());
        lines.push(String::new());
        lines.push("model.summary()".to_string());

        tracing::debug!(
            model = %model.name,
            layers = model.steps.len(),
            "generated keras code"
        );
        CodeBundle::assemble(imports.join("\n"), lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_graph::{compile, ModelSpec};

    fn emit_json(json: &str) -> CodeBundle {
        let spec = ModelSpec::from_json(json).unwrap();
        let compilation = compile(&spec, Catalog::global());
        assert!(
            compilation.report.is_valid(),
            "errors: {:?}",
            compilation.report.errors
        );
        KerasEmitter.emit(&compilation.model.unwrap(), Catalog::global())
    }

    #[test]
    fn test_mlp_script() {
        let bundle = emit_json(
            r#"{
                "name": "MnistMlp",
                "input_shape": [null, 784],
                "layers": [
                    { "type": "dense", "parameters": { "units": 128, "activation": "relu" } },
                    { "type": "dropout", "parameters": { "rate": 0.5 } },
                    { "type": "dense", "parameters": { "units": 10, "activation": "softmax" } }
                ]
            }"#,
        );

        assert_eq!(
            bundle.imports,
            "import tensorflow as tf\nfrom tensorflow.keras import layers, models\nimport numpy as np"
        );
        assert!(bundle.model_definition.starts_with("def create_mnistmlp():"));
        assert!(bundle.model_definition.contains(
            "    model.add(layers.Dense(128, activation='relu', input_shape=(None, 784)))"
        ));
        assert!(bundle
            .model_definition
            .contains("    model.add(layers.Dropout(0.5))"));
        assert!(bundle.model_definition.contains("model.summary()"));
        assert!(bundle
            .complete_code
            .starts_with("import tensorflow as tf"));
        assert!(bundle.complete_code.contains("\n\ndef create_mnistmlp():"));
    }

    #[test]
    fn test_addons_import_only_when_needed() {
        let with = emit_json(
            r#"{
                "input_shape": [null, 64],
                "layers": [
                    { "type": "group_normalization", "parameters": { "groups": 4 } },
                    { "type": "dense", "parameters": { "units": 10 } }
                ]
            }"#,
        );
        assert!(with.imports.contains("import tensorflow_addons as tfa"));

        let without = emit_json(
            r#"{
                "input_shape": [null, 64],
                "layers": [ { "type": "dense", "parameters": { "units": 10 } } ]
            }"#,
        );
        assert!(!without.imports.contains("tensorflow_addons"));
    }

    #[test]
    fn test_comment_layers_are_standalone_lines() {
        let bundle = emit_json(
            r#"{
                "input_shape": [null, 16, 64],
                "layers": [
                    { "type": "self_attention", "parameters": { "units": 64 } },
                    { "type": "flatten" },
                    { "type": "dense", "parameters": { "units": 10 } }
                ]
            }"#,
        );
        // Unsupported combinations render as comments, never model.add(#...).
        assert!(!bundle.model_definition.contains("model.add(#"));
        assert!(bundle.model_definition.contains("    # self-attention"));
    }
}
