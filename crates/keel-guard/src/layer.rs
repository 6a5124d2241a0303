//! Layer import rules
//!
//! A path's layer is the first `services`, `types`, `utils`, `hooks` or
//! `components` segment in it. Each layer forbids a set of modules:
//!
//! | Layer | Forbidden |
//! |---|---|
//! | services, types, utils | UI runtime (high), state/query/router libraries (medium) |
//! | hooks | DOM render entry points (high) |
//! | components | nothing |
//!
//! Paths without a recognised segment are unmapped and always allowed.

use crate::imports::parse_imports;
use crate::semantic::check_semantics;
use crate::violation::{Severity, ValidationReport, Violation, ViolationKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// UI framework runtime modules
const FRAMEWORK_RUNTIME: &[&str] = &["react", "react-dom"];

/// State, query and router libraries built around the runtime
const FRAMEWORK_ECOSYSTEM: &[&str] = &[
    "zustand",
    "redux",
    "@reduxjs/toolkit",
    "react-redux",
    "@tanstack/react-query",
    "react-query",
    "swr",
    "jotai",
    "recoil",
    "react-router",
    "react-router-dom",
];

/// Entry points that render into the DOM
const DOM_RENDER: &[&str] = &["react-dom"];

/// Architectural layer derived from a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Data access and business logic
    Services,
    /// Type declarations
    Types,
    /// Framework-free helpers
    Utils,
    /// Framework hooks
    Hooks,
    /// UI components
    Components,
    /// No rule applies
    Unmapped,
}

impl Layer {
    /// Classify a path by its first recognised directory segment
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        path.split(['/', '\\'])
            .find_map(|segment| match segment {
                "services" => Some(Layer::Services),
                "types" => Some(Layer::Types),
                "utils" => Some(Layer::Utils),
                "hooks" => Some(Layer::Hooks),
                "components" => Some(Layer::Components),
                _ => None,
            })
            .unwrap_or(Layer::Unmapped)
    }

    /// Directory name of the layer
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Services => "services",
            Layer::Types => "types",
            Layer::Utils => "utils",
            Layer::Hooks => "hooks",
            Layer::Components => "components",
            Layer::Unmapped => "unmapped",
        }
    }

    /// Severity of importing `module` here, if it is forbidden
    #[must_use]
    pub fn forbids(&self, module: &str) -> Option<Severity> {
        match self {
            Layer::Services | Layer::Types | Layer::Utils => {
                if matches_any(module, FRAMEWORK_RUNTIME) {
                    Some(Severity::High)
                } else if matches_any(module, FRAMEWORK_ECOSYSTEM) {
                    Some(Severity::Medium)
                } else {
                    None
                }
            }
            Layer::Hooks => matches_any(module, DOM_RENDER).then_some(Severity::High),
            Layer::Components | Layer::Unmapped => None,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate content against the rules of the layer its path belongs to
///
/// Emits one `forbidden-import` violation per offending import statement
/// plus the semantic heuristics for the layer.
#[must_use]
pub fn validate_against_layer(content: &str, path: &str) -> ValidationReport {
    let layer = Layer::from_path(path);
    if layer == Layer::Unmapped {
        return ValidationReport::allow(layer);
    }

    let mut violations: Vec<Violation> = parse_imports(content)
        .into_iter()
        .filter_map(|import| {
            let severity = layer.forbids(&import.module)?;
            Some(forbidden_import(layer, &import.module, import.line, severity))
        })
        .collect();
    violations.extend(check_semantics(layer, content));

    if !violations.is_empty() {
        tracing::debug!(path, layer = %layer, count = violations.len(), "layer violations");
    }
    ValidationReport::new(layer, violations)
}

fn forbidden_import(layer: Layer, module: &str, line: usize, severity: Severity) -> Violation {
    let (message, suggestion) = if severity == Severity::High {
        (
            format!("framework rule violation: '{module}' imported in the {layer} layer (line {line})"),
            format!("move UI code out of {layer}/ into components/ or hooks/"),
        )
    } else {
        (
            format!("consider removing '{module}' from the {layer} layer (line {line})"),
            format!("keep {layer}/ framework-agnostic and wire '{module}' up in hooks/"),
        )
    };
    Violation::new(ViolationKind::ForbiddenImport, severity, message, suggestion).with_import(module)
}

fn matches_any(module: &str, names: &[&str]) -> bool {
    names.iter().any(|name| {
        module == *name
            || module
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::Recommendation;

    #[test]
    fn layer_from_path() {
        assert_eq!(Layer::from_path("src/services/api.ts"), Layer::Services);
        assert_eq!(Layer::from_path("src\\hooks\\useCart.ts"), Layer::Hooks);
        assert_eq!(Layer::from_path("src/components/services/x.tsx"), Layer::Components);
        assert_eq!(Layer::from_path("src/app.ts"), Layer::Unmapped);
        assert_eq!(Layer::from_path("src/my-services/x.ts"), Layer::Unmapped);
    }

    #[test]
    fn module_matching_uses_exact_or_subpath() {
        assert_eq!(Layer::Utils.forbids("react"), Some(Severity::High));
        assert_eq!(Layer::Utils.forbids("react/jsx-runtime"), Some(Severity::High));
        assert_eq!(Layer::Utils.forbids("react-dom/client"), Some(Severity::High));
        assert_eq!(Layer::Utils.forbids("react-redux"), Some(Severity::Medium));
        assert_eq!(Layer::Utils.forbids("reactive"), None);
        assert_eq!(Layer::Hooks.forbids("react"), None);
        assert_eq!(Layer::Hooks.forbids("react-dom/client"), Some(Severity::High));
        assert_eq!(Layer::Components.forbids("react-dom"), None);
    }

    #[test]
    fn react_in_services_is_skipped() {
        let report = validate_against_layer("import React from 'react'", "src/services/x.ts");
        assert!(report.has_violations);
        assert_eq!(report.recommendation, Recommendation::Skip);
        assert_eq!(report.violations[0].kind, ViolationKind::ForbiddenImport);
        assert_eq!(report.violations[0].import.as_deref(), Some("react"));
    }

    #[test]
    fn react_in_components_is_allowed() {
        let report = validate_against_layer("import React from 'react'", "src/components/x.tsx");
        assert_eq!(report.of_kind(ViolationKind::ForbiddenImport).count(), 0);
        assert_eq!(report.recommendation, Recommendation::Allow);
    }

    #[test]
    fn ecosystem_import_recommends_fix() {
        let src = "import { create } from 'zustand';\nexport const x = 1;";
        let report = validate_against_layer(src, "src/utils/store.ts");
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].severity, Severity::Medium);
        assert_eq!(report.recommendation, Recommendation::Fix);
    }

    #[test]
    fn one_violation_per_statement() {
        let src = "import React from 'react';\nimport { createRoot } from 'react-dom/client';\nimport axios from 'axios';";
        let report = validate_against_layer(src, "src/types/index.ts");
        assert_eq!(report.of_kind(ViolationKind::ForbiddenImport).count(), 2);
    }

    #[test]
    fn unmapped_layer_always_allows() {
        let report = validate_against_layer("import React from 'react'; useState(0);", "src/main.tsx");
        assert_eq!(report.layer, Layer::Unmapped);
        assert!(!report.has_violations);
        assert_eq!(report.recommendation, Recommendation::Allow);
    }
}
