// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors with optional (unconstrained) dimensions.

use crate::ShapeError;
use std::fmt;

/// Describes the dimensionality of a tensor flowing between layers.
///
/// Each entry is `Some(n)` for a fixed axis or `None` for an unconstrained
/// one (most commonly the batch axis). Shapes serialise as JSON arrays with
/// `null` entries, matching the wire format of the model-spec boundary:
/// `[null, 28, 28, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Shape {
    dims: Vec<Option<usize>>,
}

impl Shape {
    /// Creates a shape from explicit optional dimensions.
    pub fn new(dims: Vec<Option<usize>>) -> Self {
        Self { dims }
    }

    /// Creates a fully-known shape.
    ///
    /// # Examples
    /// ```
    /// use shape_core::Shape;
    /// let s = Shape::known(vec![28, 28, 1]);
    /// assert_eq!(s.rank(), 3);
    /// ```
    pub fn known(dims: Vec<usize>) -> Self {
        Self {
            dims: dims.into_iter().map(Some).collect(),
        }
    }

    /// Creates a shape with an unconstrained batch axis followed by known dims.
    pub fn batched(dims: Vec<usize>) -> Self {
        let mut all = vec![None];
        all.extend(dims.into_iter().map(Some));
        Self { dims: all }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[Option<usize>] {
        &self.dims
    }

    /// Returns the fixed size of `index`, or `None` when the axis is
    /// unconstrained or out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied().flatten()
    }

    /// Returns the last dimension when it is fixed.
    pub fn last(&self) -> Option<usize> {
        self.dims.last().copied().flatten()
    }

    /// Returns a copy with the last dimension replaced by `dim`.
    ///
    /// An empty shape becomes `(dim,)`.
    pub fn with_last(&self, dim: usize) -> Shape {
        let mut dims = self.dims.clone();
        match dims.last_mut() {
            Some(last) => *last = Some(dim),
            None => dims.push(Some(dim)),
        }
        Shape { dims }
    }

    /// Checks the rank precondition of a shape-transfer rule.
    ///
    /// `context` names the rule (layer type) for the error message.
    pub fn require_rank(&self, expected: usize, context: &str) -> Result<(), ShapeError> {
        if self.rank() != expected {
            return Err(ShapeError::RankMismatch {
                context: context.to_string(),
                expected,
                actual: self.rank(),
            });
        }
        Ok(())
    }

    /// Returns the fixed size of `axis`, or an error if the axis is
    /// unconstrained or out of bounds.
    pub fn known_dim(&self, axis: usize) -> Result<usize, ShapeError> {
        match self.dims.get(axis) {
            Some(Some(n)) => Ok(*n),
            Some(None) => Err(ShapeError::UnconstrainedDimension { axis }),
            None => Err(ShapeError::InvalidDimension(format!(
                "axis {axis} out of bounds for rank {}",
                self.rank()
            ))),
        }
    }

    /// Renders the shape as a Python tuple literal, e.g. `(None, 28, 28, 1)`.
    ///
    /// Used verbatim in emitted code and in diagnostics.
    pub fn to_py_tuple(&self) -> String {
        let parts: Vec<String> = self
            .dims
            .iter()
            .map(|d| match d {
                Some(n) => n.to_string(),
                None => "None".to_string(),
            })
            .collect();
        if parts.len() == 1 {
            format!("({},)", parts[0])
        } else {
            format!("({})", parts.join(", "))
        }
    }

    /// Like [`Shape::to_py_tuple`] but with the leading (batch) axis dropped,
    /// the form Keras expects for `input_shape=` arguments on spatial layers.
    pub fn tail_py_tuple(&self) -> String {
        Shape::new(self.dims.iter().skip(1).copied().collect()).to_py_tuple()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_py_tuple())
    }
}

impl From<Vec<Option<usize>>> for Shape {
    fn from(dims: Vec<Option<usize>>) -> Self {
        Self::new(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_shape() {
        let s = Shape::known(vec![28, 28, 1]);
        assert_eq!(s.rank(), 3);
        assert_eq!(s.dim(0), Some(28));
        assert_eq!(s.last(), Some(1));
    }

    #[test]
    fn test_batched_shape() {
        let s = Shape::batched(vec![4]);
        assert_eq!(s.rank(), 2);
        assert_eq!(s.dims(), &[None, Some(4)]);
        assert_eq!(s.dim(0), None);
        assert_eq!(s.dim(1), Some(4));
    }

    #[test]
    fn test_with_last() {
        let s = Shape::batched(vec![4]);
        let out = s.with_last(10);
        assert_eq!(out.dims(), &[None, Some(10)]);

        let empty = Shape::new(vec![]);
        assert_eq!(empty.with_last(3).dims(), &[Some(3)]);
    }

    #[test]
    fn test_require_rank() {
        let s = Shape::batched(vec![10, 4]);
        assert!(s.require_rank(3, "lstm").is_ok());
        let err = s.require_rank(4, "conv2d").unwrap_err();
        assert_eq!(
            err,
            ShapeError::RankMismatch {
                context: "conv2d".into(),
                expected: 4,
                actual: 3,
            }
        );
        assert!(err.to_string().contains("4-dimensional"));
        assert!(err.to_string().contains("got 3"));
    }

    #[test]
    fn test_known_dim() {
        let s = Shape::batched(vec![28, 28, 1]);
        assert_eq!(s.known_dim(1).unwrap(), 28);
        assert!(matches!(
            s.known_dim(0),
            Err(ShapeError::UnconstrainedDimension { axis: 0 })
        ));
        assert!(s.known_dim(9).is_err());
    }

    #[test]
    fn test_py_tuple() {
        assert_eq!(Shape::batched(vec![4]).to_py_tuple(), "(None, 4)");
        assert_eq!(Shape::known(vec![10]).to_py_tuple(), "(10,)");
        assert_eq!(
            Shape::batched(vec![28, 28, 1]).tail_py_tuple(),
            "(28, 28, 1)"
        );
    }

    #[test]
    fn test_display() {
        let s = Shape::batched(vec![28, 28, 1]);
        assert_eq!(format!("{s}"), "(None, 28, 28, 1)");
    }

    #[test]
    fn test_serde_null_entries() {
        let s = Shape::batched(vec![28, 28, 1]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "[null,28,28,1]");
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
