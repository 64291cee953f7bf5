// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # layer-catalog
//!
//! The immutable-after-startup catalog of neural-network layer types.
//!
//! Each [`LayerDescriptor`] bundles one layer type's complete contract:
//!
//! - identity: type id, [`Category`], human description;
//! - parameter contract: required names, optional name→default map, and
//!   per-parameter [`Constraint`]s checked against raw JSON values;
//! - a shape-transfer rule mapping an input [`shape_core::Shape`] to an
//!   output shape;
//! - two code-rendering rules, one per backend ([`KerasCode`] for the
//!   sequential/graph-mode target, [`TorchCode`] for the object/imperative
//!   target).
//!
//! Descriptors are registered exactly once, through the explicit ordered
//! constructor list in [`Catalog::standard`] — there is no import-time
//! auto-registration, so the catalog's content never depends on load order.
//! After [`Catalog::global`] has initialised, the registry is read-only and
//! lookups need no synchronisation.

mod constraint;
mod descriptor;
mod layers;
mod params;
mod registry;
mod render;

pub use constraint::{Constraint, ConstraintError, ParamKind};
pub use descriptor::{Category, LayerBehavior, LayerDescriptor, ParamCheck};
pub use params::{ParamMap, Params};
pub use registry::Catalog;
pub use render::{KerasCode, RenderCtx, TorchCode};
