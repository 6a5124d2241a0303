//! Plan builder
//!
//! Converts raw model output into a validated, dependency-ordered [`Plan`]:
//! extraction → normalization → dependency normalization → assembly →
//! graph validation and ordering. Any failure rejects the whole plan.

use crate::error::PlanError;
use crate::extract::extract_array;
use crate::graph::order_steps;
use crate::normalize::normalize_records;
use crate::prompt::planning_prompt;
use crate::session::{GenerationError, GenerationSession};
use crate::step::Plan;

/// Parse raw model output into an ordered plan
///
/// # Errors
/// `PARSE_ERROR`, `MISSING_DEPENDENCY`, `SELF_DEPENDENCY` or
/// `CIRCULAR_DEPENDENCY`; there is never a partial plan.
pub fn parse_plan(raw: &str) -> Result<Plan, PlanError> {
    let records = extract_array(raw)?;
    let steps = normalize_records(&records);
    tracing::debug!(
        records = records.len(),
        kept = steps.len(),
        "normalized plan records"
    );

    let ordered = order_steps(steps)?;
    Ok(Plan::new(ordered))
}

/// Builds plans by asking a generation session
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanBuilder;

impl PlanBuilder {
    /// Create new plan builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Turn a natural-language request into an ordered plan
    ///
    /// # Errors
    /// `GENERATION_ERROR` if the session fails or replies with nothing,
    /// otherwise any error of [`parse_plan`].
    pub async fn build_plan(
        &self,
        session: &mut dyn GenerationSession,
        request: &str,
    ) -> Result<Plan, PlanError> {
        tracing::info!("Building plan for request");

        let reply = session.send_message(&planning_prompt(request)).await?;
        if reply.trim().is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }

        match parse_plan(&reply) {
            Ok(plan) => {
                tracing::info!(plan_id = %plan.id, steps = plan.len(), "Plan built");
                Ok(plan)
            }
            Err(e) => {
                tracing::error!(code = e.code(), "Plan rejected: {}", e);
                Err(e)
            }
        }
    }
}
