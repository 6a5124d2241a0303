//! Pre-flight safety checks
//!
//! Cheap checks run before any backend call:
//! - reading from a greenfield workspace (nothing exists to read)
//! - path shapes that only appear in hallucinated or truncated paths

use crate::error::StepError;
use keel_plan::{Action, Step};

/// Extensionless file names that are legitimate
pub const EXTENSIONLESS_NAMES: &[&str] = &[
    "Makefile",
    "Dockerfile",
    "LICENSE",
    "README",
    "Procfile",
    "Gemfile",
    "Rakefile",
    "Jenkinsfile",
    "Vagrantfile",
    "CODEOWNERS",
];

/// Run pre-flight checks for a (sanitized) step
///
/// # Errors
/// `GREENFIELD_VIOLATION` for a read in an empty workspace, `PATH_VIOLATION`
/// for a malformed path
pub fn preflight(step: &Step, greenfield: bool) -> Result<(), StepError> {
    let Some(path) = step.path.as_deref() else {
        return Ok(());
    };
    if step.action == Action::Run {
        return Ok(());
    }

    if greenfield && step.action == Action::Read {
        return Err(StepError::Greenfield {
            path: path.to_string(),
        });
    }
    check_path(path).map_err(|reason| StepError::path(path, reason))
}

/// Check a path's shape, returning the reason it is rejected
///
/// # Errors
/// A short reason when the path contains double spaces or an ellipsis, or
/// its file name has no extension and is not a known extensionless name
pub fn check_path(path: &str) -> Result<(), &'static str> {
    if path.contains("  ") {
        return Err("contains double spaces");
    }
    if path.contains("...") || path.contains('…') {
        return Err("contains an ellipsis");
    }

    let name = path.rsplit('/').next().unwrap_or(path);
    if name.is_empty() {
        return Err("has no file name");
    }
    let has_extension = name
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty());
    let allowed = name.starts_with('.')
        || EXTENSIONLESS_NAMES
            .iter()
            .any(|known| known.eq_ignore_ascii_case(name));
    if !has_extension && !allowed {
        return Err("has no file extension");
    }
    Ok(())
}
