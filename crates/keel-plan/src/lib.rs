//! Keel Plan - Step model and plan building
//!
//! Turns loosely-structured model output into a validated plan:
//! - Extracts the JSON step array from fenced or prose-wrapped replies
//! - Normalizes actions, paths, descriptions and dependencies
//! - Orders steps so every dependency runs first, rejecting cycles
//!
//! # Example
//!
//! ```rust,ignore
//! use keel_plan::parse_plan;
//!
//! let plan = parse_plan(r#"[{"action": "read", "path": "src/app.ts", "description": "inspect"}]"#)?;
//! assert_eq!(plan.steps[0].id.as_str(), "step_1");
//! ```

#![warn(unreachable_pub)]

pub mod builder;
pub mod error;
pub mod extract;
pub mod graph;
pub mod normalize;
pub mod prompt;
pub mod session;
pub mod step;

// Re-exports for convenience
pub use builder::{parse_plan, PlanBuilder};
pub use error::PlanError;
pub use session::{GenerationError, GenerationSession, OfflineSession};
pub use step::{
    Action, Plan, PlanId, PlanStatus, Step, StepId, StepResult, StrategySwitch, SuggestedAction,
    DEFAULT_EXPECTED_OUTCOME,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with plans
    pub use crate::{
        parse_plan, Action, GenerationSession, Plan, PlanBuilder, PlanError, PlanStatus, Step,
        StepId, StepResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
