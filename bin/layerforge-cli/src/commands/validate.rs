// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `layerforge validate` command: full diagnostics for a model spec.

use super::{load_spec, print_diagnostics};
use model_builder::ModelBuilder;
use std::path::PathBuf;

pub fn execute(spec_path: PathBuf) -> anyhow::Result<()> {
    let spec = load_spec(&spec_path)?;
    let builder = ModelBuilder::new();
    let outcome = builder.validate(&spec);

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            layerforge · Spec Validation              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Model: {}", spec.display_name());
    println!("  Framework: {}", spec.framework);
    println!("  Layers: {}", spec.layers.len());
    println!();

    print_diagnostics("Errors", &outcome.errors);
    print_diagnostics("Warnings", &outcome.warnings);
    print_diagnostics("Suggestions", &outcome.suggestions);

    if outcome.is_valid {
        println!("  Result: valid");
        Ok(())
    } else {
        println!("  Result: invalid");
        anyhow::bail!(
            "spec failed validation with {} error(s)",
            outcome.errors.len()
        )
    }
}
