// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # shape-core
//!
//! Tensor shape descriptors for the layerforge pipeline.
//!
//! A [`Shape`] is an ordered tuple of *optional* dimensions: `None` denotes
//! an unconstrained axis (typically the batch dimension). Shape-transfer
//! rules in the layer catalog consume and produce these, and signal
//! [`ShapeError`] values — never panics — when a rule's rank precondition
//! fails or arithmetic would touch an unconstrained axis.

mod error;
mod shape;

pub use error::ShapeError;
pub use shape::Shape;
