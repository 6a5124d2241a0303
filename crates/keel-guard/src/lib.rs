//! Keel Guard - Validators for generated source files
//!
//! Defends a project tree against content that is structurally broken or
//! breaks its architecture:
//! - **Layers**: path-derived import rules and semantic heuristics
//! - **Contracts**: imports checked against files written earlier
//! - **Checks**: pluggable structural checks (fences, prose, balance)
//! - **Triage**: critical issues block a write, suggestions become warnings
//!
//! # Example
//!
//! ```rust,ignore
//! use keel_guard::{validate_against_layer, Recommendation};
//!
//! let report = validate_against_layer("import React from 'react'", "src/services/api.ts");
//! assert_eq!(report.recommendation, Recommendation::Skip);
//! ```

#![warn(unreachable_pub)]

pub mod checks;
pub mod contract;
pub mod imports;
pub mod layer;
pub mod review;
pub mod semantic;
pub mod triage;
pub mod violation;

// Re-exports for convenience
pub use checks::{ContentCheck, ContentValidator};
pub use contract::check_contracts;
pub use layer::{validate_against_layer, Layer};
pub use review::{ContentGuard, Review};
pub use triage::{classify, IssueClass, Triage};
pub use violation::{Recommendation, Severity, ValidationReport, Violation, ViolationKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
