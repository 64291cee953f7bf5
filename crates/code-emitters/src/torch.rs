// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! PyTorch emitter: builds an `nn.Module` subclass with a constructor and a
//! forward pass, plus a parameter-count footer.

use crate::{class_ident, shape_or_unknown, CodeBundle, Emitter};
use layer_catalog::{Catalog, Params, RenderCtx};
use model_graph::{Backend, CompiledModel};

pub struct TorchEmitter;

impl Emitter for TorchEmitter {
    fn backend(&self) -> Backend {
        Backend::Pytorch
    }

    fn emit(&self, model: &CompiledModel, catalog: &Catalog) -> CodeBundle {
        let imports = [
            "import torch",
            "import torch.nn as nn",
            "import torch.nn.functional as F",
            "import math",
        ]
        .join("\n");

        let mut definitions = Vec::new();
        let mut forwards = Vec::new();
        for step in &model.steps {
            let Some(descriptor) = catalog.get(&step.type_id) else {
                forwards.push(format!("        # unsupported layer type: {}", step.type_id));
                continue;
            };
            let ctx = RenderCtx {
                params: Params::new(&step.parameters),
                input_shape: step.input_shape.as_ref(),
                output_shape: step.output_shape.as_ref(),
                index: step.position,
                is_first: step.position == 0,
            };
            let code = descriptor.torch(&ctx);
            if !code.definition.trim().is_empty() {
                definitions.push(format!("        {}", code.definition));
            }
            if !code.forward.trim().is_empty() {
                forwards.push(format!("        {}", code.forward));
            }
        }

        let class_name = class_ident(&model.name);
        let mut lines = Vec::new();
        lines.push(format!("class {class_name}(nn.Module):"));
        lines.push("    \"\"\"".to_string());
        lines.push(format!("    The {class_name} model."));
        lines.push(format!(
            "    Input shape: {}",
            shape_or_unknown(&model.input_shape)
        ));
        lines.push("    \"\"\"".to_string());
        lines.push(String::new());
        lines.push("    def __init__(self):".to_string());
        lines.push(format!("        super({class_name}, self).__init__()"));
        if !definitions.is_empty() {
            lines.push(String::new());
            lines.extend(definitions);
        }
        lines.push(String::new());
        lines.push("    def forward(self, x):".to_string());
        lines.extend(forwards);
        lines.push("        return x".to_string());
        lines.push(String::new());
        lines.push(format!("model = {class_name}()"));
        lines.push(String::new());
        lines.push("def count_parameters(model):".to_string());
        lines.push(
            "    return sum(p.numel() for p in model.parameters() if p.requires_grad)".to_string(),
        );
        lines.push(String::new());
        lines.push("print(f\"Trainable parameters: {count_parameters(model):,}\")".to_string());
        lines.push("print(f\"Model structure:\\n{model}\")".to_string());

        tracing::debug!(
            model = %model.name,
            layers = model.steps.len(),
            "generated torch code"
        );
        CodeBundle::assemble(imports, lines.join("\n"))
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
        TorchEmitter.emit(&compilation.model.unwrap(), Catalog::global())
    }

    #[test]
    fn test_mlp_module() {
        let bundle = emit_json(
            r#"{
                "name": "MnistMlp",
                "framework": "pytorch",
                "input_shape": [null, 784],
                "layers": [
                    { "type": "dense", "parameters": { "units": 128, "activation": "relu" } },
                    { "type": "dense", "parameters": { "units": 10, "activation": "softmax" } }
                ]
            }"#,
        );

        assert_eq!(
            bundle.imports,
            "import torch\nimport torch.nn as nn\nimport torch.nn.functional as F\nimport math"
        );
        assert!(bundle.model_definition.starts_with("class MnistMlp(nn.Module):"));
        assert!(bundle
            .model_definition
            .contains("        super(MnistMlp, self).__init__()"));
        assert!(bundle
            .model_definition
            .contains("        self.dense_0 = nn.Linear(784, 128, bias=True)"));
        assert!(bundle
            .model_definition
            .contains("        self.dense_1 = nn.Linear(128, 10, bias=True)"));
        assert!(bundle.model_definition.contains("    def forward(self, x):"));
        assert!(bundle.model_definition.contains("        return x"));
        assert!(bundle.model_definition.contains("model = MnistMlp()"));
        assert!(bundle
            .model_definition
            .contains("def count_parameters(model):"));
    }

    #[test]
    fn test_stateless_layers_skip_the_constructor() {
        let bundle = emit_json(
            r#"{
                "input_shape": [null, 28, 28, 1],
                "layers": [
                    { "type": "flatten" },
                    { "type": "dense", "parameters": { "units": 10 } }
                ]
            }"#,
        );
        // flatten contributes no member, only a forward statement.
        assert!(!bundle.model_definition.contains("self.flatten"));
        assert!(bundle
            .model_definition
            .contains("        x = x.view(x.size(0), -1)  # flatten"));
    }

    #[test]
    fn test_unknown_input_size_degrades_to_valid_placeholder() {
        // No input_shape and no data source is a warning, not an error, so
        // the emitter still runs; the constructor call must stay closed.
        let bundle = emit_json(
            r#"{
                "framework": "pytorch",
                "layers": [
                    { "type": "dense", "parameters": { "units": 128 } }
                ]
            }"#,
        );
        assert!(bundle.model_definition.contains(
            "        # input size unknown; set in_features manually\n        \
             self.dense_0 = nn.Linear(in_features, 128, bias=True)"
        ));
        assert!(!bundle.complete_code.contains("set manually,"));
    }

    #[test]
    fn test_forward_statement_order_follows_execution_order() {
        let bundle = emit_json(
            r#"{
                "input_shape": [null, 784],
                "layers": [
                    { "type": "dense", "id": "out", "parameters": { "units": 10 } },
                    { "type": "dense", "id": "hidden", "parameters": { "units": 64 } }
                ],
                "connections": [ { "source": "hidden", "target": "out" } ]
            }"#,
        );
        let hidden = bundle
            .model_definition
            .find("nn.Linear(784, 64")
            .expect("hidden layer present");
        let out = bundle
            .model_definition
            .find("nn.Linear(64, 10")
            .expect("output layer present");
        assert!(hidden < out);
    }
}
