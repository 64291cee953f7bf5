// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model-spec parsing.

/// Errors that can occur when reading a model specification.
///
/// Semantic problems (unknown layer types, bad parameters, broken
/// connections) are *not* errors: they are collected in a
/// [`Report`](crate::Report) so the caller can show all of them at once.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// The specification file could not be read.
    #[error("failed to read model spec: {0}")]
    ReadError(#[from] std::io::Error),

    /// The specification JSON is malformed.
    #[error("failed to parse model spec: {0}")]
    ParseError(#[from] serde_json::Error),
}
