//! Error types for plan execution
//!
//! Provides error handling for:
//! - Contract, dependency, path and greenfield violations (deterministic)
//! - Backend, command and generation failures (retryable)
//! - Rejected generated content (retryable, content is regenerated)
//! - Configuration loading

use crate::backend::BackendError;
use keel_plan::{GenerationError, StepId};
use std::path::PathBuf;

/// Failure of a single step attempt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// Step lacks a field its action requires, or carries a human instruction
    #[error("CONTRACT_VIOLATION: {step} ({action}) {reason}")]
    Contract {
        /// Offending step
        step: StepId,
        /// Action of the step
        action: &'static str,
        /// What is wrong
        reason: String,
    },

    /// A dependency has not completed
    #[error("DEPENDENCY_VIOLATION: {step} requires {} which did not complete", join_ids(.missing))]
    Dependency {
        /// Step that cannot run
        step: StepId,
        /// Dependencies that did not complete
        missing: Vec<StepId>,
    },

    /// Path is malformed
    #[error("PATH_VIOLATION: '{path}' {reason}")]
    Path {
        /// Sanitized path
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// Read attempted in a workspace with no files
    #[error("GREENFIELD_VIOLATION: cannot read '{path}' in an empty workspace")]
    Greenfield {
        /// Path that was to be read
        path: String,
    },

    /// Backend operation failed
    #[error("BACKEND_ERROR: {0}")]
    Backend(#[from] BackendError),

    /// Command exited unsuccessfully
    #[error("COMMAND_FAILED: '{command}' exited with {exit_code}: {stderr}")]
    CommandFailed {
        /// Command line as run
        command: String,
        /// Process exit status
        exit_code: i32,
        /// Captured standard error
        stderr: String,
    },

    /// Content generation failed
    #[error("GENERATION_ERROR: {0}")]
    Generation(#[from] GenerationError),

    /// Generated content failed validation
    #[error("CONTENT_REJECTED: '{path}': {}", .issues.join("; "))]
    ContentRejected {
        /// Path the content was meant for
        path: String,
        /// Critical review issues
        issues: Vec<String>,
    },
}

impl StepError {
    /// Create contract violation
    #[inline]
    pub fn contract(step: &keel_plan::Step, reason: impl Into<String>) -> Self {
        Self::Contract {
            step: step.id.clone(),
            action: step.action.as_str(),
            reason: reason.into(),
        }
    }

    /// Create path violation
    #[inline]
    pub fn path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Path {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Stable classification code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Contract { .. } => "CONTRACT_VIOLATION",
            Self::Dependency { .. } => "DEPENDENCY_VIOLATION",
            Self::Path { .. } => "PATH_VIOLATION",
            Self::Greenfield { .. } => "GREENFIELD_VIOLATION",
            Self::Backend(_) => "BACKEND_ERROR",
            Self::CommandFailed { .. } => "COMMAND_FAILED",
            Self::Generation(_) => "GENERATION_ERROR",
            Self::ContentRejected { .. } => "CONTENT_REJECTED",
        }
    }

    /// Check if another attempt could succeed
    ///
    /// Violations are deterministic; backend errors are retryable unless
    /// their code is unrecoverable.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend(e) => !e.code.is_unrecoverable(),
            Self::CommandFailed { .. } | Self::Generation(_) | Self::ContentRejected { .. } => true,
            Self::Contract { .. }
            | Self::Dependency { .. }
            | Self::Path { .. }
            | Self::Greenfield { .. } => false,
        }
    }

    /// Check if this is a plan-level violation rather than a runtime failure
    #[inline]
    #[must_use]
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            Self::Contract { .. } | Self::Dependency { .. } | Self::Path { .. } | Self::Greenfield { .. }
        )
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid configuration
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn join_ids(ids: &[StepId]) -> String {
    ids.iter().map(StepId::as_str).collect::<Vec<_>>().join(", ")
}
