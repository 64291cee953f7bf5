// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution ordering of spec layers.
//!
//! Connections form a dependency graph over layer ids. Data-source layers
//! feed the graph but emit no code, so they are split off first; the
//! remaining processing layers are ordered so every layer comes after its
//! sources. Ties resolve in declaration order, which also makes the output
//! deterministic. A cycle cannot be ordered, so the remaining layers are
//! appended in declaration order and the condition is flagged for the
//! caller to report.

use crate::ModelSpec;
use layer_catalog::Catalog;
use std::collections::HashMap;

/// The result of ordering a spec's layers. All entries are indices into
/// `spec.layers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOrder {
    /// Data-source layers, in declaration order.
    pub sources: Vec<usize>,
    /// Processing layers, in dependency order.
    pub processing: Vec<usize>,
    /// True when the connection graph could not be fully ordered.
    pub cycle_detected: bool,
}

/// Orders the layers of `spec` for sequential code generation.
///
/// Layers whose type is missing or not in `catalog` are treated as
/// processing layers with no special semantics; compilation reports them
/// separately.
pub fn execution_order(spec: &ModelSpec, catalog: &Catalog) -> ExecutionOrder {
    let ids: Vec<String> = spec
        .layers
        .iter()
        .enumerate()
        .map(|(i, layer)| layer.instance_id(i))
        .collect();

    // target id → source ids
    let mut dependencies: HashMap<&str, Vec<&str>> = HashMap::new();
    for conn in &spec.connections {
        dependencies
            .entry(conn.target.as_str())
            .or_default()
            .push(conn.source.as_str());
    }

    let mut sources = Vec::new();
    let mut remaining = Vec::new();
    for (i, layer) in spec.layers.iter().enumerate() {
        let is_source = layer
            .type_id
            .as_deref()
            .and_then(|t| catalog.get(t))
            .is_some_and(|d| d.is_data_source());
        if is_source {
            sources.push(i);
        } else {
            remaining.push(i);
        }
    }

    let mut processing = Vec::with_capacity(remaining.len());
    let mut cycle_detected = false;

    while !remaining.is_empty() {
        let ready: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&i| {
                dependencies
                    .get(ids[i].as_str())
                    .map(|deps| {
                        deps.iter()
                            .all(|dep| !remaining.iter().any(|&r| ids[r] == *dep))
                    })
                    .unwrap_or(true)
            })
            .collect();

        if ready.is_empty() {
            tracing::warn!("connection graph has no ready layer; possible cycle");
            cycle_detected = true;
            processing.extend(remaining.iter().copied());
            break;
        }

        remaining.retain(|i| !ready.contains(i));
        processing.extend(ready);
    }

    ExecutionOrder {
        sources,
        processing,
        cycle_detected,
    }
}
