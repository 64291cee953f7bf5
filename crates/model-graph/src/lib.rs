// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model specification parsing and compilation.
//!
//! A [`ModelSpec`] is the JSON document a client submits: layers,
//! parameters, connections, a target framework. [`compile`] validates it
//! against the layer catalog, orders the layers along the connection graph,
//! propagates tensor shapes through the sequence, and returns a
//! [`CompiledModel`] plus a [`Report`] of every diagnostic found.

mod compile;
mod error;
mod order;
mod report;
mod spec;

pub use compile::{compile, Compilation, CompiledModel, Step};
pub use error::SpecError;
pub use order::{execution_order, ExecutionOrder};
pub use report::Report;
pub use spec::{Backend, Connection, LayerSpec, ModelSpec, DEFAULT_MODEL_NAME};
