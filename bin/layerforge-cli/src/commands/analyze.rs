// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `layerforge analyze` command: parameter counts and shape flow.

use super::{load_spec, print_diagnostics};
use anyhow::Context;
use model_builder::ModelBuilder;
use shape_core::Shape;
use std::path::PathBuf;

pub fn execute(spec_path: PathBuf, json: bool) -> anyhow::Result<()> {
    let spec = load_spec(&spec_path)?;
    let builder = ModelBuilder::new();
    let outcome = builder.analyze(&spec);

    if !outcome.success {
        print_diagnostics("Errors", &outcome.errors);
        anyhow::bail!("spec failed validation with {} error(s)", outcome.errors.len());
    }
    let analysis = outcome
        .analysis
        .context("analysis reported success but produced no data")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            layerforge · Model Analysis               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Model: {}", spec.display_name());
    println!("  Layers: {}", analysis.total_layers);
    println!("  Total parameters: {}", analysis.total_parameters);
    println!("  Input shape: {}", shape_cell(&analysis.input_shape));
    println!("  Output shape: {}", shape_cell(&analysis.output_shape));
    println!();

    // ── Per-Layer Detail ───────────────────────────────────────
    println!(
        "  {:<4} {:<24} {:<20} {:<20} {:>12} {:>6}",
        "Idx", "Type", "Input", "Output", "Params", "Train",
    );
    println!("  {}", "-".repeat(92));
    for detail in &analysis.layer_details {
        println!(
            "  {:<4} {:<24} {:<20} {:<20} {:>12} {:>6}",
            detail.layer_index,
            detail.layer_type,
            shape_cell(&detail.input_shape),
            shape_cell(&detail.output_shape),
            detail.parameters,
            if detail.trainable { "yes" } else { "no" },
        );
    }
    println!();

    Ok(())
}

fn shape_cell(shape: &Option<Shape>) -> String {
    match shape {
        Some(s) => s.to_py_tuple(),
        None => "unknown".to_string(),
    }
}
