// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The model-builder pipeline.
//!
//! [`ModelBuilder`] is the single entry point a service or CLI needs:
//!
//! - [`ModelBuilder::validate`] — full diagnostics for a spec.
//! - [`ModelBuilder::build`] — TensorFlow/Keras or PyTorch code for a valid
//!   spec.
//! - [`ModelBuilder::analyze`] — parameter counts and shape flow.
//!
//! # Example
//! ```
//! use model_builder::ModelBuilder;
//! use model_graph::ModelSpec;
//!
//! let spec = ModelSpec::from_json(r#"{
//!     "input_shape": [null, 784],
//!     "layers": [
//!         { "type": "dense", "parameters": { "units": 10, "activation": "softmax" } }
//!     ]
//! }"#).unwrap();
//!
//! let builder = ModelBuilder::new();
//! let outcome = builder.build(&spec);
//! assert!(outcome.success);
//! ```

mod builder;
mod estimate;

pub use builder::{
    Analysis, AnalysisOutcome, BuildOutcome, LayerDetail, ModelBuilder, ValidationOutcome,
};
