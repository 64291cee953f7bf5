// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `layerforge build` command: generate framework code from a spec.

use super::{load_spec, print_diagnostics};
use anyhow::Context;
use model_builder::ModelBuilder;
use model_graph::Backend;
use std::path::PathBuf;

pub fn execute(
    spec_path: PathBuf,
    framework: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut spec = load_spec(&spec_path)?;

    if let Some(name) = &framework {
        spec.framework = Backend::from_str_loose(name)
            .with_context(|| format!("unknown framework '{name}' (expected tensorflow or pytorch)"))?;
    }

    let builder = ModelBuilder::new();
    let outcome = builder.build(&spec);

    print_diagnostics("Warnings", &outcome.warnings);
    print_diagnostics("Suggestions", &outcome.suggestions);

    if !outcome.success {
        print_diagnostics("Errors", &outcome.errors);
        anyhow::bail!(
            "spec failed validation with {} error(s)",
            outcome.errors.len()
        );
    }

    let code = outcome
        .code
        .context("build reported success but produced no code")?;
    match output {
        Some(path) => {
            std::fs::write(&path, &code.complete_code)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            println!(
                "  Wrote {} code for '{}' to {}",
                spec.framework,
                spec.display_name(),
                path.display()
            );
        }
        None => println!("{}", code.complete_code),
    }

    Ok(())
}
