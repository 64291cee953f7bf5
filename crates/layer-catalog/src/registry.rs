// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The catalog: an ordered, read-only registry of layer descriptors.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::Value;

use crate::descriptor::{Category, LayerDescriptor};
use crate::layers;

/// A registry of [`LayerDescriptor`]s keyed by type id.
///
/// Built once through [`Catalog::standard`] and never mutated afterwards;
/// the process-wide instance lives behind [`Catalog::global`].
pub struct Catalog {
    descriptors: BTreeMap<&'static str, LayerDescriptor>,
}

impl Catalog {
    /// An empty catalog. Useful for targeted tests; production code goes
    /// through [`Catalog::standard`].
    pub fn new() -> Self {
        Self {
            descriptors: BTreeMap::new(),
        }
    }

    /// Registers a descriptor. Replacing an existing type id is allowed
    /// but logged, since it almost always indicates a wiring mistake.
    pub fn register(&mut self, descriptor: LayerDescriptor) {
        let id = descriptor.type_id();
        if self.descriptors.insert(id, descriptor).is_some() {
            tracing::warn!(layer_type = id, "replacing existing layer descriptor");
        }
    }

    /// The full standard catalog, built from one explicit constructor list.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for descriptor in layers::all() {
            catalog.register(descriptor);
        }
        tracing::debug!(layers = catalog.len(), "layer catalog initialised");
        catalog
    }

    /// The process-wide catalog instance, built on first use.
    pub fn global() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(Catalog::standard)
    }

    pub fn get(&self, type_id: &str) -> Option<&LayerDescriptor> {
        self.descriptors.get(type_id)
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.descriptors.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All descriptors in type-id order.
    pub fn all(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.descriptors.values()
    }

    /// Descriptors of one category, in type-id order.
    pub fn by_category(&self, category: Category) -> Vec<&LayerDescriptor> {
        self.descriptors
            .values()
            .filter(|d| d.category() == category)
            .collect()
    }

    /// The distinct categories present, sorted.
    pub fn categories(&self) -> Vec<Category> {
        let mut out: Vec<Category> = Vec::new();
        for d in self.descriptors.values() {
            if !out.contains(&d.category()) {
                out.push(d.category());
            }
        }
        out.sort();
        out
    }

    /// Contract summaries for every layer type, grouped by category.
    pub fn info(&self) -> Value {
        let mut grouped = serde_json::Map::new();
        for category in self.categories() {
            let entries: Vec<Value> = self
                .by_category(category)
                .iter()
                .map(|d| d.info())
                .collect();
            grouped.insert(category.as_str().to_string(), Value::Array(entries));
        }
        Value::Object(grouped)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
