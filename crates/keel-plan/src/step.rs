//! Core types for plans
//!
//! Defines the entities shared by the builder and the engine:
//! - Step identifiers and actions
//! - Steps with their declared dependencies
//! - Plans, their status and per-step results
//! - Advisory strategy switches surfaced after a failure

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use ulid::Ulid;

/// Outcome recorded when a step carries no explicit expectation
pub const DEFAULT_EXPECTED_OUTCOME: &str = "Step completed";

/// Step identifier (`step_<n>`), unique within a plan
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    /// Identifier for the 1-based position `n`
    #[inline]
    #[must_use]
    pub fn from_index(n: usize) -> Self {
        Self(format!("step_{n}"))
    }

    /// Wrap an already formatted identifier
    #[inline]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Unique plan identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Ulid);

impl PlanId {
    /// Generate new plan ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The operation a step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Read an existing file
    Read,
    /// Create or overwrite a file
    Write,
    /// Run an external command
    Run,
    /// Delete a path
    Delete,
}

impl Action {
    /// Parse a raw action value; anything unrecognized becomes `Read`
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "write" => Action::Write,
            "run" => Action::Run,
            "delete" => Action::Delete,
            _ => Action::Read,
        }
    }

    /// Lowercase name as it appears in plans
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Run => "run",
            Action::Delete => "delete",
        }
    }

    /// Whether this action needs a target path
    #[inline]
    #[must_use]
    pub fn requires_path(&self) -> bool {
        !matches!(self, Action::Run)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Unique id within the plan
    pub id: StepId,
    /// Position assigned by the generator (display only)
    pub sequence_number: u32,
    /// Operation to perform
    pub action: Action,
    /// Target path for read/write/delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Command line for run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Inline payload for write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Human-readable summary, never empty
    pub description: String,
    /// Steps that must complete first
    #[serde(default)]
    pub depends_on: BTreeSet<StepId>,
    /// What success looks like
    pub expected_outcome: String,
}

impl Step {
    /// Create a step with no target, command or dependencies
    #[must_use]
    pub fn new(position: usize, action: Action, description: impl Into<String>) -> Self {
        Self {
            id: StepId::from_index(position),
            sequence_number: u32::try_from(position).unwrap_or(u32::MAX),
            action,
            path: None,
            command: None,
            content: None,
            description: description.into(),
            depends_on: BTreeSet::new(),
            expected_outcome: DEFAULT_EXPECTED_OUTCOME.to_string(),
        }
    }

    /// Set the target path
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the command line
    #[inline]
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the inline write payload
    #[inline]
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Add a dependency
    #[inline]
    #[must_use]
    pub fn depends_on(mut self, id: impl Into<StepId>) -> Self {
        self.depends_on.insert(id.into());
        self
    }

    /// The path or command this step targets, for messages
    #[must_use]
    pub fn target(&self) -> &str {
        match self.action {
            Action::Run => self.command.as_deref().unwrap_or(""),
            _ => self.path.as_deref().unwrap_or(""),
        }
    }
}

impl From<String> for StepId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Built, not yet run
    Pending,
    /// Run in progress
    Executing,
    /// Every step finished without an unrecoverable error
    Completed,
    /// At least one step failed terminally
    Failed,
}

/// Alternate action proposed after a classified failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SuggestedAction {
    /// Create the file instead of reading it
    Write,
    /// Scaffold the file with a project init command
    Init {
        /// Command that creates the file
        command: String,
    },
}

/// Advisory recovery attached to a failed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySwitch {
    /// What to do instead
    pub action: SuggestedAction,
    /// Why it probably helps
    pub rationale: String,
}

/// Terminal result of one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Step this result belongs to
    pub step_id: StepId,
    /// Whether the step succeeded
    pub success: bool,
    /// File text for reads, a summary for other actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Terminal error, for failed steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time spent across all attempts
    pub duration_ms: u64,
    /// Attempts beyond the first
    pub retry_count: u32,
    /// Advisory recovery, never applied automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<StrategySwitch>,
    /// Advisory content review findings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl StepResult {
    /// Successful result
    #[must_use]
    pub fn succeeded(step_id: StepId, output: Option<String>) -> Self {
        Self {
            step_id,
            success: true,
            output,
            error: None,
            duration_ms: 0,
            retry_count: 0,
            suggestion: None,
            warnings: Vec::new(),
        }
    }

    /// Failed result
    #[must_use]
    pub fn failed(step_id: StepId, error: impl Into<String>) -> Self {
        Self {
            step_id,
            success: false,
            output: None,
            error: Some(error.into()),
            duration_ms: 0,
            retry_count: 0,
            suggestion: None,
            warnings: Vec::new(),
        }
    }

    /// Set elapsed time and retries
    #[inline]
    #[must_use]
    pub fn timed(mut self, duration_ms: u64, retry_count: u32) -> Self {
        self.duration_ms = duration_ms;
        self.retry_count = retry_count;
        self
    }
}

/// Ordered, validated steps for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Unique plan id
    pub id: PlanId,
    /// Steps in execution order
    pub steps: Vec<Step>,
    /// Lifecycle state
    pub status: PlanStatus,
    /// Terminal result per step, in execution order
    #[serde(default)]
    pub results: IndexMap<StepId, StepResult>,
}

impl Plan {
    /// Wrap already ordered steps in a pending plan
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            id: PlanId::new(),
            steps,
            status: PlanStatus::Pending,
            results: IndexMap::new(),
        }
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Look up a step by id
    #[must_use]
    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.id == id)
    }

    /// Ids in plan order
    pub fn step_ids(&self) -> impl Iterator<Item = &StepId> + '_ {
        self.steps.iter().map(|s| &s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_normalizes_unknown_to_read() {
        assert_eq!(Action::normalize("WRITE"), Action::Write);
        assert_eq!(Action::normalize(" run "), Action::Run);
        assert_eq!(Action::normalize("delete"), Action::Delete);
        assert_eq!(Action::normalize("create"), Action::Read);
        assert_eq!(Action::normalize(""), Action::Read);
    }

    #[test]
    fn step_id_format() {
        assert_eq!(StepId::from_index(3).as_str(), "step_3");
        assert_eq!(StepId::from_index(12).to_string(), "step_12");
    }

    #[test]
    fn step_builder_and_target() {
        let step = Step::new(1, Action::Run, "install").with_command("npm install");
        assert_eq!(step.target(), "npm install");
        assert_eq!(step.expected_outcome, DEFAULT_EXPECTED_OUTCOME);

        let step = Step::new(2, Action::Write, "write").with_path("src/a.ts").depends_on("step_1");
        assert_eq!(step.target(), "src/a.ts");
        assert!(step.depends_on.contains(&StepId::from("step_1")));
    }

    #[test]
    fn plan_starts_pending_with_empty_results() {
        let plan = Plan::new(vec![Step::new(1, Action::Read, "look")]);
        assert_eq!(plan.status, PlanStatus::Pending);
        assert!(plan.results.is_empty());
        assert_eq!(plan.len(), 1);
        assert!(plan.step(&StepId::from_index(1)).is_some());
    }

    #[test]
    fn step_serializes_camel_case() {
        let step = Step::new(1, Action::Write, "create file")
            .with_path("src/a.ts")
            .depends_on("step_0");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "write");
        assert_eq!(json["sequenceNumber"], 1);
        assert_eq!(json["dependsOn"][0], "step_0");
        assert!(json.get("command").is_none());
    }
}
