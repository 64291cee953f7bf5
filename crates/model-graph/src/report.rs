// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Accumulated compilation diagnostics.

use layer_catalog::ParamCheck;
use serde::Serialize;

/// All diagnostics produced while compiling a model spec.
///
/// Errors block code generation; warnings and suggestions do not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn suggestion(&mut self, message: impl Into<String>) {
        self.suggestions.push(message.into());
    }

    /// Folds a per-layer parameter check in, prefixing every message with
    /// the layer's position and type, e.g. `layer 2 (conv2d): ...`.
    pub fn absorb_check(&mut self, prefix: &str, check: ParamCheck) {
        self.errors
            .extend(check.errors.into_iter().map(|m| format!("{prefix}: {m}")));
        self.warnings
            .extend(check.warnings.into_iter().map(|m| format!("{prefix}: {m}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_valid() {
        let mut report = Report::new();
        assert!(report.is_valid());
        report.warning("something minor");
        report.suggestion("something optional");
        assert!(report.is_valid());
        report.error("something fatal");
        assert!(!report.is_valid());
    }

    #[test]
    fn test_absorb_check_prefixes() {
        let mut report = Report::new();
        let check = ParamCheck {
            errors: vec!["missing required parameter 'units'".to_string()],
            warnings: vec!["unknown parameter 'foo' will be ignored".to_string()],
        };
        report.absorb_check("layer 1 (dense)", check);
        assert_eq!(
            report.errors,
            vec!["layer 1 (dense): missing required parameter 'units'"]
        );
        assert_eq!(
            report.warnings,
            vec!["layer 1 (dense): unknown parameter 'foo' will be ignored"]
        );
    }
}
