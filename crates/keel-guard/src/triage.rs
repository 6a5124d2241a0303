//! Issue triage
//!
//! Splits issue messages into blocking (critical) and advisory (suggestion)
//! buckets by the markers they contain. Critical markers are checked first,
//! and a message with no marker at all is treated as critical.

use serde::{Deserialize, Serialize};

/// Substrings that make an issue blocking
pub const CRITICAL_MARKERS: &[&str] = &[
    "missing import",
    "syntax error",
    "framework rule violation",
    "code fence",
    "prose",
];

/// Substrings that make an issue advisory
pub const SUGGESTION_MARKERS: &[&str] = &["consider", "prefer", "recommend"];

/// Bucket an issue message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueClass {
    /// Blocks the write
    Critical,
    /// Reported as a warning
    Suggestion,
}

/// Classify one message (case-insensitive)
#[must_use]
pub fn classify(message: &str) -> IssueClass {
    let lowered = message.to_lowercase();
    if CRITICAL_MARKERS.iter().any(|m| lowered.contains(m)) {
        IssueClass::Critical
    } else if SUGGESTION_MARKERS.iter().any(|m| lowered.contains(m)) {
        IssueClass::Suggestion
    } else {
        IssueClass::Critical
    }
}

/// Issues split by class, each in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triage {
    /// Issues that block the write
    pub critical: Vec<String>,
    /// Advisory issues reported as warnings
    pub suggestions: Vec<String>,
}

impl Triage {
    /// Split messages into critical issues and suggestions
    pub fn split<I, S>(issues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut triage = Self::default();
        for issue in issues {
            let issue = issue.into();
            match classify(&issue) {
                IssueClass::Critical => triage.critical.push(issue),
                IssueClass::Suggestion => triage.suggestions.push(issue),
            }
        }
        triage
    }

    /// Whether any issue blocks the write
    #[inline]
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        !self.critical.is_empty()
    }

    /// Whether nothing was found
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.critical.is_empty() && self.suggestions.is_empty()
    }
}
