//! Violation and report types
//!
//! Reports are immutable snapshots: built once from a list of violations,
//! never edited afterwards, and holding no reference to execution state.

use crate::layer::Layer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a violation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory
    Low,
    /// Should be fixed
    Medium,
    /// Breaks the layer's rules
    High,
}

/// Violation classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Import of a module the layer forbids
    ForbiddenImport,
    /// Code pattern the layer forbids
    SemanticError,
    /// Imported symbol not exported by its target
    ContractViolation,
    /// Structural problem with the file content
    Structure,
}

impl ViolationKind {
    /// Kebab-case name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::ForbiddenImport => "forbidden-import",
            ViolationKind::SemanticError => "semantic-error",
            ViolationKind::ContractViolation => "contract-violation",
            ViolationKind::Structure => "structure",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule that was broken
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    /// Human-readable description
    pub message: String,
    /// How to fix it
    pub suggestion: String,
    /// Severity of the finding
    pub severity: Severity,
    /// Offending module specifier, for import findings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<String>,
}

impl Violation {
    /// Create violation
    pub fn new(
        kind: ViolationKind,
        severity: Severity,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            suggestion: suggestion.into(),
            severity,
            import: None,
        }
    }

    /// Attach the offending module name
    #[inline]
    #[must_use]
    pub fn with_import(mut self, module: impl Into<String>) -> Self {
        self.import = Some(module.into());
        self
    }
}

/// What the caller should do with the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// No violations
    Allow,
    /// Only medium/low violations
    Fix,
    /// At least one high violation
    Skip,
}

impl Recommendation {
    /// Derive the recommendation from a set of violations
    #[must_use]
    pub fn from_violations(violations: &[Violation]) -> Self {
        match violations.iter().map(|v| v.severity).max() {
            None => Recommendation::Allow,
            Some(Severity::High) => Recommendation::Skip,
            Some(_) => Recommendation::Fix,
        }
    }
}

/// Result of validating content against its layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Whether any violation was found
    pub has_violations: bool,
    /// Findings in source order
    pub violations: Vec<Violation>,
    /// Layer derived from the path
    pub layer: Layer,
    /// What to do with the content
    pub recommendation: Recommendation,
}

impl ValidationReport {
    /// Build a report from the violations found for `layer`
    #[must_use]
    pub fn new(layer: Layer, violations: Vec<Violation>) -> Self {
        Self {
            has_violations: !violations.is_empty(),
            recommendation: Recommendation::from_violations(&violations),
            violations,
            layer,
        }
    }

    /// Report with nothing to flag
    #[must_use]
    pub fn allow(layer: Layer) -> Self {
        Self::new(layer, Vec::new())
    }

    /// Violations of one kind
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> + '_ {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(severity: Severity) -> Violation {
        Violation::new(ViolationKind::ForbiddenImport, severity, "m", "s")
    }

    #[test]
    fn recommendation_follows_highest_severity() {
        assert_eq!(Recommendation::from_violations(&[]), Recommendation::Allow);
        assert_eq!(
            Recommendation::from_violations(&[violation(Severity::Low), violation(Severity::Medium)]),
            Recommendation::Fix
        );
        assert_eq!(
            Recommendation::from_violations(&[violation(Severity::Medium), violation(Severity::High)]),
            Recommendation::Skip
        );
    }

    #[test]
    fn report_flags_violations() {
        let report = ValidationReport::new(Layer::Services, vec![violation(Severity::Medium)]);
        assert!(report.has_violations);
        assert_eq!(report.recommendation, Recommendation::Fix);
        assert_eq!(report.of_kind(ViolationKind::ForbiddenImport).count(), 1);

        let clean = ValidationReport::allow(Layer::Components);
        assert!(!clean.has_violations);
        assert_eq!(clean.recommendation, Recommendation::Allow);
    }

    #[test]
    fn kind_names_are_kebab_case() {
        assert_eq!(ViolationKind::ForbiddenImport.to_string(), "forbidden-import");
        assert_eq!(ViolationKind::SemanticError.as_str(), "semantic-error");
    }
}
