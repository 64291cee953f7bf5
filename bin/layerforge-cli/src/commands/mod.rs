// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CLI subcommand implementations.

pub mod analyze;
pub mod build;
pub mod layers;
pub mod validate;

use anyhow::Context;
use model_graph::ModelSpec;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialises tracing from the `-v` count; `RUST_LOG` takes precedence.
pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads a spec file with a path-bearing error message.
pub(crate) fn load_spec(path: &Path) -> anyhow::Result<ModelSpec> {
    let spec = ModelSpec::from_file(path)
        .with_context(|| format!("failed to load model spec '{}'", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        model = %spec.display_name(),
        layers = spec.layers.len(),
        "loaded model spec"
    );
    Ok(spec)
}

/// Prints a diagnostic list under a heading, one bullet per message.
pub(crate) fn print_diagnostics(heading: &str, messages: &[String]) {
    if messages.is_empty() {
        return;
    }
    println!("  {heading}:");
    for message in messages {
        println!("   - {message}");
    }
    println!();
}
