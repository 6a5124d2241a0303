//! Execution observers
//!
//! Hooks are called synchronously from the engine loop and return nothing,
//! so an observer can never stall or alter a run.

use crate::result::ExecutionResult;
use keel_plan::{Plan, Step, StepResult};

/// Receives progress notifications during a run
///
/// Every hook defaults to a no-op.
pub trait ExecutionObserver: Send + Sync {
    /// Plan entered `Executing`
    fn on_plan_start(&self, _plan: &Plan) {}

    /// An attempt of `step` is starting (1-based)
    fn on_step_start(&self, _step: &Step, _attempt: u32) {}

    /// `step` reached its terminal result
    fn on_step_end(&self, _step: &Step, _result: &StepResult) {}

    /// Free-form progress message
    fn on_message(&self, _message: &str) {}

    /// Plan reached `Completed` or `Failed`
    fn on_plan_end(&self, _plan: &Plan, _result: &ExecutionResult) {}
}

/// Forwards notifications to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_plan_start(&self, plan: &Plan) {
        tracing::info!(plan_id = %plan.id, steps = plan.len(), "Plan started");
    }

    fn on_step_start(&self, step: &Step, attempt: u32) {
        tracing::info!(
            step = %step.id,
            action = %step.action,
            target = step.target(),
            attempt,
            "Step started"
        );
    }

    fn on_step_end(&self, step: &Step, result: &StepResult) {
        if result.success {
            tracing::info!(step = %step.id, duration_ms = result.duration_ms, "Step completed");
        } else {
            tracing::warn!(
                step = %step.id,
                retries = result.retry_count,
                error = result.error.as_deref().unwrap_or_default(),
                "Step failed"
            );
        }
        for warning in &result.warnings {
            tracing::warn!(step = %step.id, "{}", warning);
        }
    }

    fn on_message(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn on_plan_end(&self, plan: &Plan, result: &ExecutionResult) {
        tracing::info!(
            plan_id = %plan.id,
            status = ?plan.status,
            completed = result.completed_steps,
            duration_ms = result.total_duration_ms,
            "Plan finished"
        );
    }
}
