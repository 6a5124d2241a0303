//! Error types for plan building
//!
//! Every variant is fatal for the whole plan: building either yields a
//! complete, ordered plan or one of these.

use crate::session::GenerationError;
use crate::step::StepId;

/// Plan construction failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Model output could not be read as a JSON array of steps
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// A dependency names a step that does not exist
    #[error("MISSING_DEPENDENCY: {step} depends on unknown {missing}")]
    MissingDependency {
        /// Step declaring the dependency
        step: StepId,
        /// Unknown dependency id
        missing: StepId,
    },

    /// A step depends on itself
    #[error("SELF_DEPENDENCY: {0} depends on itself")]
    SelfDependency(StepId),

    /// The dependency graph has a cycle
    #[error("CIRCULAR_DEPENDENCY: cycle between {}", format_cycle(.cycle))]
    CircularDependency {
        /// Members of one cycle, in input order
        cycle: Vec<StepId>,
    },

    /// The generation backend did not return a plan
    #[error("GENERATION_ERROR: {0}")]
    Generation(#[from] GenerationError),
}

impl PlanError {
    /// Create parse error
    #[inline]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Stable classification code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "PARSE_ERROR",
            Self::MissingDependency { .. } => "MISSING_DEPENDENCY",
            Self::SelfDependency(_) => "SELF_DEPENDENCY",
            Self::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            Self::Generation(_) => "GENERATION_ERROR",
        }
    }
}

fn format_cycle(cycle: &[StepId]) -> String {
    cycle
        .iter()
        .map(StepId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
