// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for shape computation.

/// Errors produced by shape-transfer rules.
///
/// These are plain values, not panics: a failed shape computation aborts
/// shape propagation for the rest of the graph but must not abort the
/// validation pass that produced it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// The input shape has the wrong number of dimensions for this rule.
    #[error("{context} expects a {expected}-dimensional input, got {actual} dimensions")]
    RankMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// An axis required by dimension arithmetic is unconstrained (`None`).
    #[error("dimension {axis} is unconstrained and cannot be used in shape arithmetic")]
    UnconstrainedDimension { axis: usize },

    /// The arithmetic itself is invalid (e.g., kernel larger than input).
    #[error("invalid dimension arithmetic: {0}")]
    InvalidDimension(String),
}
