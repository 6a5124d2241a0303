//! Aggregate result of a plan run

use indexmap::IndexMap;
use keel_plan::{StepId, StepResult};
use serde::{Deserialize, Serialize};

/// Outcome of executing a whole plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Every executed step succeeded
    pub success: bool,
    /// Number of steps that succeeded
    pub completed_steps: usize,
    /// Terminal result per step, in execution order
    pub results: IndexMap<StepId, StepResult>,
    /// Wall-clock time of the run
    pub total_duration_ms: u64,
    /// First terminal failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Result of a run with nothing to do
    #[must_use]
    pub fn empty() -> Self {
        Self {
            success: true,
            completed_steps: 0,
            results: IndexMap::new(),
            total_duration_ms: 0,
            error: None,
        }
    }

    /// Results that failed
    pub fn failures(&self) -> impl Iterator<Item = &StepResult> + '_ {
        self.results.values().filter(|r| !r.success)
    }

    /// Warnings collected across all steps
    pub fn warnings(&self) -> impl Iterator<Item = &str> + '_ {
        self.results
            .values()
            .flat_map(|r| r.warnings.iter().map(String::as_str))
    }

    /// Result of one step, if it ran
    #[must_use]
    pub fn step(&self, id: &StepId) -> Option<&StepResult> {
        self.results.get(id)
    }
}
