//! Step contract and dependency validation

use crate::error::StepError;
use keel_plan::{Action, Step, StepId};
use std::collections::HashSet;

/// Phrases that mark an instruction meant for a human rather than a machine
pub const HUMAN_MARKERS: &[&str] = &["manually", "by hand", "manual step"];

/// Check that a step carries the fields its action requires
///
/// # Errors
/// `CONTRACT_VIOLATION` when the path or command is missing or blank, or
/// when it contains a human-instruction marker
pub fn validate_contract(step: &Step) -> Result<(), StepError> {
    let (field, value) = match step.action {
        Action::Read | Action::Write | Action::Delete => ("path", step.path.as_deref()),
        Action::Run => ("command", step.command.as_deref()),
    };

    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(StepError::contract(step, format!("requires a {field}")));
    }
    if let Some(marker) = human_marker(value) {
        return Err(StepError::contract(
            step,
            format!("{field} '{value}' is an instruction for a human ('{marker}'), not an operation"),
        ));
    }
    Ok(())
}

/// Check that every dependency of `step` has completed
///
/// # Errors
/// `DEPENDENCY_VIOLATION` listing the dependencies not in `completed`
pub fn validate_dependencies(step: &Step, completed: &HashSet<StepId>) -> Result<(), StepError> {
    let missing: Vec<StepId> = step
        .depends_on
        .iter()
        .filter(|dep| !completed.contains(*dep))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StepError::Dependency {
            step: step.id.clone(),
            missing,
        })
    }
}

fn human_marker(value: &str) -> Option<&'static str> {
    let lowered = value.to_lowercase();
    HUMAN_MARKERS.iter().copied().find(|m| lowered.contains(m))
}
