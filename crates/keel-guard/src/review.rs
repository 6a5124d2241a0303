//! Combined content review
//!
//! Runs every validator over content about to be written and triages the
//! findings into one [`Review`].

use crate::checks::ContentValidator;
use crate::contract::check_contracts;
use crate::layer::validate_against_layer;
use crate::triage::Triage;
use crate::violation::{ValidationReport, Violation};
use std::collections::HashMap;

/// Findings for one piece of content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Layer rules and semantic heuristics
    pub report: ValidationReport,
    /// Imports missing from files written earlier
    pub contract: Vec<Violation>,
    /// Structural content checks
    pub structural: Vec<Violation>,
    /// All messages, split by class
    pub triage: Triage,
}

impl Review {
    /// Whether the content must not be written
    #[inline]
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.triage.is_blocking()
    }

    /// Every violation found, in validator order
    pub fn violations(&self) -> impl Iterator<Item = &Violation> + '_ {
        self.report
            .violations
            .iter()
            .chain(&self.contract)
            .chain(&self.structural)
    }
}

/// Layer, contract and structural validation in one pass
#[derive(Debug, Default)]
pub struct ContentGuard {
    validator: ContentValidator,
}

impl ContentGuard {
    /// Create guard with the default content checks
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create guard with a custom set of content checks
    #[inline]
    #[must_use]
    pub fn with_validator(validator: ContentValidator) -> Self {
        Self { validator }
    }

    /// Review `content` destined for `path`
    ///
    /// `known_files` holds files written earlier in the same run, keyed by
    /// normalized relative path.
    #[must_use]
    pub fn review(&self, path: &str, content: &str, known_files: &HashMap<String, String>) -> Review {
        let report = validate_against_layer(content, path);
        let contract = check_contracts(path, content, known_files);
        let structural = self.validator.run(path, content);

        let triage = Triage::split(
            report
                .violations
                .iter()
                .chain(&contract)
                .chain(&structural)
                .map(|v| v.message.clone()),
        );
        if triage.is_blocking() {
            tracing::debug!(path, critical = triage.critical.len(), "content blocked");
        }

        Review {
            report,
            contract,
            structural,
            triage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_component_passes() {
        let src = "import React from 'react';\nexport const Cart = () => <div>{1}</div>;\n";
        let review = ContentGuard::new().review("src/components/Cart.tsx", src, &HashMap::new());
        assert!(!review.is_blocking());
        assert!(review.triage.is_clean());
        assert_eq!(review.violations().count(), 0);
    }

    #[test]
    fn collects_all_sources() {
        let known: HashMap<String, String> =
            [("src/types/cart.ts".to_string(), "export interface Cart {}".to_string())]
                .into_iter()
                .collect();
        let src = "import { useState } from 'react';\nimport { Item } from '../types/cart';\nconst [n] = useState(0);\nexport function load(): any {\n";
        let review = ContentGuard::new().review("src/services/cart.ts", src, &known);

        assert_eq!(review.report.violations.len(), 2);
        assert_eq!(review.contract.len(), 1);
        assert!(review.structural.len() >= 2);
        assert!(review.is_blocking());
        assert!(review
            .triage
            .suggestions
            .iter()
            .any(|s| s.contains("untyped `any`")));
    }
}
