// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # layerforge
//!
//! Command-line interface for the layerforge model builder.
//!
//! ## Usage
//! ```bash
//! # Validate a model spec
//! layerforge validate --spec ./model.json
//!
//! # Generate framework code
//! layerforge build --spec ./model.json --framework pytorch -o model.py
//!
//! # Estimate parameter counts and shape flow
//! layerforge analyze --spec ./model.json
//!
//! # List the layer catalog
//! layerforge layers
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "layerforge",
    about = "Validate neural-network model specs and generate framework code",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a model spec and print every diagnostic found.
    Validate {
        /// Path to the model spec JSON file.
        #[arg(short, long)]
        spec: std::path::PathBuf,
    },

    /// Generate framework code from a valid model spec.
    Build {
        /// Path to the model spec JSON file.
        #[arg(short, long)]
        spec: std::path::PathBuf,

        /// Target framework: tensorflow or pytorch (overrides the spec).
        #[arg(short, long)]
        framework: Option<String>,

        /// Write the generated script here instead of stdout.
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Estimate model complexity: parameter counts and shape flow.
    Analyze {
        /// Path to the model spec JSON file.
        #[arg(short, long)]
        spec: std::path::PathBuf,

        /// Print the analysis as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// List the layer catalog, grouped by category.
    Layers {
        /// Show only this category (e.g. convolution, attention).
        #[arg(short, long)]
        category: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { spec } => commands::validate::execute(spec),
        Commands::Build {
            spec,
            framework,
            output,
        } => commands::build::execute(spec, framework, output),
        Commands::Analyze { spec, json } => commands::analyze::execute(spec, json),
        Commands::Layers { category } => commands::layers::execute(category),
    }
}
