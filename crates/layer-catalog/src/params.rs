// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Lenient typed access to a layer instance's parameter map.
//!
//! Validation has already reported missing and malformed parameters by the
//! time shape and render rules run, so these readers never fail: a missing
//! or wrong-kind value falls back to the supplied default, exactly the way
//! rules are specified (each rule names its own defaults).

use serde_json::Value;
use shape_core::Shape;

/// The raw parameter map of one layer instance, as received on the wire.
pub type ParamMap = serde_json::Map<String, Value>;

/// A read-only view over a [`ParamMap`] with typed, defaulting getters.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a>(&'a ParamMap);

impl<'a> Params<'a> {
    pub fn new(map: &'a ParamMap) -> Self {
        Self(map)
    }

    /// Returns the raw value for `name`, if present.
    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.0.get(name)
    }

    /// Returns `true` if the parameter is present (regardless of kind).
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn usize_or(&self, name: &str, default: usize) -> usize {
        self.raw(name)
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(default)
    }

    pub fn i64_or(&self, name: &str, default: i64) -> i64 {
        self.raw(name).and_then(Value::as_i64).unwrap_or(default)
    }

    pub fn f64_or(&self, name: &str, default: f64) -> f64 {
        self.raw(name).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.raw(name).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn str_or(&self, name: &str, default: &'a str) -> &'a str {
        self.raw(name).and_then(Value::as_str).unwrap_or(default)
    }

    /// Optional number that may legitimately be absent (e.g. `max_value`).
    pub fn opt_f64(&self, name: &str) -> Option<f64> {
        self.raw(name).and_then(Value::as_f64)
    }

    /// A pair of positive integers, e.g. `kernel_size: [3, 3]`.
    ///
    /// A bare integer `k` is widened to `[k, k]`.
    pub fn pair_or(&self, name: &str, default: [usize; 2]) -> [usize; 2] {
        match self.raw(name) {
            Some(Value::Array(items)) if items.len() == 2 => {
                let a = items[0].as_u64().map(|v| v as usize).unwrap_or(default[0]);
                let b = items[1].as_u64().map(|v| v as usize).unwrap_or(default[1]);
                [a, b]
            }
            Some(v) => match v.as_u64() {
                Some(k) => [k as usize, k as usize],
                None => default,
            },
            None => default,
        }
    }

    /// A triple of positive integers, e.g. `kernel_size: [3, 3, 3]`.
    pub fn triple_or(&self, name: &str, default: [usize; 3]) -> [usize; 3] {
        match self.raw(name) {
            Some(Value::Array(items)) if items.len() == 3 => {
                let mut out = default;
                for (slot, item) in out.iter_mut().zip(items) {
                    if let Some(v) = item.as_u64() {
                        *slot = v as usize;
                    }
                }
                out
            }
            Some(v) => match v.as_u64() {
                Some(k) => [k as usize; 3],
                None => default,
            },
            None => default,
        }
    }

    /// A per-axis `[before, after]` pair list used by cropping/padding:
    /// `[[1, 1], [2, 2]]`, with bare integers widened symmetrically
    /// (`[1, 2]` ⇒ `[[1, 1], [2, 2]]`).
    pub fn side_pairs_or(&self, name: &str, default: [[usize; 2]; 2]) -> [[usize; 2]; 2] {
        let value = match self.raw(name) {
            Some(Value::Array(items)) if items.len() == 2 => items,
            _ => return default,
        };
        let mut out = default;
        for (axis, item) in value.iter().enumerate() {
            out[axis] = match item {
                Value::Array(pair) if pair.len() == 2 => [
                    pair[0].as_u64().unwrap_or(0) as usize,
                    pair[1].as_u64().unwrap_or(0) as usize,
                ],
                other => match other.as_u64() {
                    Some(n) => [n as usize, n as usize],
                    None => out[axis],
                },
            };
        }
        out
    }

    /// An integer list where negative entries mean "unconstrained"
    /// (Keras-style `-1` in a `target_shape`).
    pub fn shape_list(&self, name: &str) -> Option<Shape> {
        let items = self.raw(name)?.as_array()?;
        let dims = items
            .iter()
            .map(|v| match v.as_i64() {
                Some(n) if n >= 0 => Some(n as usize),
                _ => None,
            })
            .collect();
        Some(Shape::new(dims))
    }

    /// A plain list of non-negative integers (e.g. `dims` for permute).
    pub fn usize_list(&self, name: &str) -> Option<Vec<usize>> {
        let items = self.raw(name)?.as_array()?;
        items
            .iter()
            .map(|v| v.as_u64().map(|n| n as usize))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ParamMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_scalar_getters() {
        let m = map(json!({
            "units": 64, "rate": 0.25, "use_bias": false, "activation": "relu"
        }));
        let p = Params::new(&m);
        assert_eq!(p.usize_or("units", 128), 64);
        assert_eq!(p.usize_or("missing", 128), 128);
        assert_eq!(p.f64_or("rate", 0.5), 0.25);
        assert!(!p.bool_or("use_bias", true));
        assert_eq!(p.str_or("activation", "linear"), "relu");
        assert_eq!(p.str_or("padding", "valid"), "valid");
    }

    #[test]
    fn test_wrong_kind_falls_back() {
        let m = map(json!({ "units": "many" }));
        let p = Params::new(&m);
        assert_eq!(p.usize_or("units", 128), 128);
    }

    #[test]
    fn test_pair_widening() {
        let m = map(json!({ "kernel_size": 3, "strides": [2, 1] }));
        let p = Params::new(&m);
        assert_eq!(p.pair_or("kernel_size", [1, 1]), [3, 3]);
        assert_eq!(p.pair_or("strides", [1, 1]), [2, 1]);
        assert_eq!(p.pair_or("pool_size", [2, 2]), [2, 2]);
    }

    #[test]
    fn test_triple() {
        let m = map(json!({ "kernel_size": [3, 5, 7] }));
        let p = Params::new(&m);
        assert_eq!(p.triple_or("kernel_size", [1, 1, 1]), [3, 5, 7]);
        assert_eq!(p.triple_or("strides", [1, 1, 1]), [1, 1, 1]);
    }

    #[test]
    fn test_side_pairs() {
        let m = map(json!({ "cropping": [1, [2, 3]] }));
        let p = Params::new(&m);
        assert_eq!(
            p.side_pairs_or("cropping", [[0, 0], [0, 0]]),
            [[1, 1], [2, 3]]
        );
    }

    #[test]
    fn test_shape_list_negative_is_unconstrained() {
        let m = map(json!({ "target_shape": [7, -1, 2] }));
        let p = Params::new(&m);
        let s = p.shape_list("target_shape").unwrap();
        assert_eq!(s.dims(), &[Some(7), None, Some(2)]);
    }

    #[test]
    fn test_usize_list() {
        let m = map(json!({ "dims": [2, 1] }));
        let p = Params::new(&m);
        assert_eq!(p.usize_list("dims").unwrap(), vec![2, 1]);
        assert!(p.usize_list("missing").is_none());
    }
}
