//! Cross-file contract checking
//!
//! Verifies that symbols imported from files written earlier in the same run
//! are actually exported by them. Best-effort: specifiers that do not resolve
//! to a known file, and targets with dynamic or wildcard exports, are skipped.

use crate::imports::{exported_names, parse_imports};
use crate::violation::{Severity, Violation, ViolationKind};
use std::collections::HashMap;

/// Extensions probed when resolving an extensionless specifier
const PROBE_SUFFIXES: &[&str] = &[
    "",
    ".ts",
    ".tsx",
    ".js",
    ".jsx",
    ".mjs",
    "/index.ts",
    "/index.tsx",
    "/index.js",
];

/// Check imports in `content` (at `path`) against already materialized files
///
/// `known_files` maps normalized relative paths to their content.
#[must_use]
pub fn check_contracts(
    path: &str,
    content: &str,
    known_files: &HashMap<String, String>,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for import in parse_imports(content) {
        if import.default.is_none() && import.named.is_empty() {
            continue;
        }
        let Some(target) = resolve_import(path, &import.module, known_files) else {
            continue;
        };
        let exports = exported_names(&known_files[target]);
        if exports.wildcard {
            continue;
        }

        let wanted = import
            .default
            .as_ref()
            .map(|_| "default".to_string())
            .into_iter()
            .chain(import.named.iter().cloned());
        for name in wanted {
            if !exports.contains(&name) {
                violations.push(missing_export(&name, target, &import.module));
            }
        }
    }

    violations
}

/// Resolve a relative or `@/` specifier to a key of `known_files`
#[must_use]
pub fn resolve_import<'a>(
    from: &str,
    specifier: &str,
    known_files: &'a HashMap<String, String>,
) -> Option<&'a str> {
    let base = if specifier.starts_with("./") || specifier.starts_with("../") {
        let dir = from.rsplit_once('/').map_or("", |(dir, _)| dir);
        normalize_path(&format!("{dir}/{specifier}"))
    } else if let Some(rest) = specifier.strip_prefix("@/") {
        normalize_path(&format!("src/{rest}"))
    } else {
        return None;
    };

    PROBE_SUFFIXES.iter().find_map(|suffix| {
        known_files
            .get_key_value(&format!("{base}{suffix}"))
            .map(|(key, _)| key.as_str())
    })
}

/// Collapse `.` and `..` segments and duplicate separators
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn missing_export(name: &str, target: &str, specifier: &str) -> Violation {
    let shown = if name == "default" { "default export" } else { name };
    Violation::new(
        ViolationKind::ContractViolation,
        Severity::High,
        format!("missing import: '{shown}' is not exported by {target}"),
        format!("export '{shown}' from {target} or fix the import of '{specifier}'"),
    )
    .with_import(specifier)
}
