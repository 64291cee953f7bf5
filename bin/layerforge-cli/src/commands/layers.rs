// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `layerforge layers` command: list the layer catalog.

use layer_catalog::Catalog;

pub fn execute(category: Option<String>) -> anyhow::Result<()> {
    let catalog = Catalog::global();

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             layerforge · Layer Catalog               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let mut shown = 0;
    for cat in catalog.categories() {
        if let Some(wanted) = &category {
            if cat.as_str() != wanted.to_ascii_lowercase() {
                continue;
            }
        }
        let descriptors = catalog.by_category(cat);
        println!("  {} ({})", cat.as_str(), descriptors.len());
        for descriptor in descriptors {
            println!("   {:<28} {}", descriptor.type_id(), descriptor.description());
            shown += 1;
        }
        println!();
    }

    if shown == 0 {
        if let Some(wanted) = category {
            anyhow::bail!("unknown category '{wanted}'");
        }
    }
    println!("  {} layer types available", shown);
    Ok(())
}
