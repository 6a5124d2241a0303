//! Execution engine
//!
//! Runs an ordered plan one step at a time. Each step passes through:
//! 1. Path sanitization
//! 2. Contract and dependency validation
//! 3. Pre-flight checks
//! 4. Execution against the backend (write content validated first)
//! 5. Strategy suggestion and bounded retry on failure
//!
//! Violations fail a step immediately; runtime failures are retried up to
//! `max_retries` times.

use crate::backend::{Backend, ErrorCode};
use crate::config::EngineConfig;
use crate::contract::{validate_contract, validate_dependencies};
use crate::error::StepError;
use crate::observer::ExecutionObserver;
use crate::preflight::preflight;
use crate::prompt::{content_prompt, unwrap_content};
use crate::recovery::suggest_strategy;
use crate::reorder::reorder_writes;
use crate::result::ExecutionResult;
use crate::sanitize::{relativize, sanitize_path};
use indexmap::IndexMap;
use keel_guard::ContentGuard;
use keel_guard::contract::normalize_path;
use keel_plan::{Action, GenerationSession, Plan, PlanStatus, Step, StepId, StepResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Mutable state of one plan run
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Steps that succeeded
    pub completed: HashSet<StepId>,
    /// Workspace had no files and nothing has been written yet
    pub greenfield: bool,
    /// Content written during this run, by normalized path
    pub written: HashMap<String, String>,
}

impl RunState {
    /// Create state for a new run
    #[inline]
    #[must_use]
    pub fn new(greenfield: bool) -> Self {
        Self {
            greenfield,
            ..Self::default()
        }
    }
}

/// Successful outcome of one attempt
#[derive(Debug, Clone, Default)]
struct Outcome {
    output: Option<String>,
    warnings: Vec<String>,
}

/// Sequential plan executor
pub struct ExecutionEngine {
    config: EngineConfig,
    backend: Arc<dyn Backend>,
    guard: ContentGuard,
    observers: Vec<Arc<dyn ExecutionObserver>>,
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl ExecutionEngine {
    /// Create engine over a backend
    #[must_use]
    pub fn new(config: EngineConfig, backend: Arc<dyn Backend>) -> Self {
        Self {
            config,
            backend,
            guard: ContentGuard::new(),
            observers: Vec::new(),
        }
    }

    /// With an additional observer
    #[inline]
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// With a custom content guard
    #[inline]
    #[must_use]
    pub fn with_guard(mut self, guard: ContentGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute every step of `plan`
    ///
    /// Resets `session` once, runs the steps in order and stores the terminal
    /// result of each executed step on the plan. Never fails as a whole;
    /// step failures are reported in the result.
    pub async fn execute_plan(
        &mut self,
        plan: &mut Plan,
        session: &mut dyn GenerationSession,
    ) -> ExecutionResult {
        let started = Instant::now();
        plan.status = PlanStatus::Executing;
        session.reset();
        self.notify(|o| o.on_plan_start(plan));

        let steps = if self.config.reorder_writes {
            reorder_writes(plan.steps.clone())
        } else {
            plan.steps.clone()
        };

        let greenfield = if steps.is_empty() {
            false
        } else {
            match self.backend.is_empty(".").await {
                Ok(empty) => empty,
                Err(e) => {
                    tracing::warn!("Could not inspect workspace, assuming it is not empty: {}", e);
                    false
                }
            }
        };
        if greenfield {
            self.notify(|o| o.on_message("Workspace is empty; reads are disabled until the first write"));
        }

        let mut state = RunState::new(greenfield);
        let mut results: IndexMap<StepId, StepResult> = IndexMap::new();
        let mut first_error: Option<String> = None;

        for step in &steps {
            let result = self.run_step(step, &mut state, session).await;
            self.notify(|o| o.on_step_end(step, &result));

            let failed = !result.success;
            if failed && first_error.is_none() {
                first_error = Some(format!(
                    "{}: {}",
                    step.id,
                    result.error.as_deref().unwrap_or("failed")
                ));
            }
            results.insert(step.id.clone(), result);

            if failed && !self.config.continue_on_error {
                tracing::error!(step = %step.id, "Stopping plan after failed step");
                break;
            }
        }

        let success = first_error.is_none();
        let result = ExecutionResult {
            success,
            completed_steps: state.completed.len(),
            results: results.clone(),
            total_duration_ms: elapsed_ms(started),
            error: first_error,
        };

        plan.results = results;
        plan.status = if success {
            PlanStatus::Completed
        } else {
            PlanStatus::Failed
        };
        self.notify(|o| o.on_plan_end(plan, &result));
        result
    }

    /// Run one step with retries, producing its terminal result
    ///
    /// Marks the step completed in `state` on success.
    pub async fn run_step(
        &self,
        step: &Step,
        state: &mut RunState,
        session: &mut dyn GenerationSession,
    ) -> StepResult {
        let started = Instant::now();
        let mut attempts: Vec<String> = Vec::new();
        let mut previous_error: Option<String> = None;
        let mut retries = 0u32;

        loop {
            self.notify(|o| o.on_step_start(step, retries + 1));

            match self
                .execute_step(step, state, session, previous_error.as_deref())
                .await
            {
                Ok(outcome) => {
                    state.completed.insert(step.id.clone());
                    let mut result = StepResult::succeeded(step.id.clone(), outcome.output)
                        .timed(elapsed_ms(started), retries);
                    result.warnings = outcome.warnings;
                    return result;
                }
                Err(err) => {
                    let suggestion = suggest_strategy(step, &err);
                    attempts.push(format!("attempt {}: {}", retries + 1, err));

                    if !err.is_retryable() || retries >= self.config.max_retries {
                        tracing::warn!(step = %step.id, code = err.code(), "Step failed: {}", err);
                        let message = if attempts.len() == 1 {
                            err.to_string()
                        } else {
                            attempts.join("; ")
                        };
                        let mut result = StepResult::failed(step.id.clone(), message)
                            .timed(elapsed_ms(started), retries);
                        result.suggestion = suggestion;
                        return result;
                    }

                    if let Some(switch) = &suggestion {
                        self.notify(|o| {
                            o.on_message(&format!("{}: suggestion: {}", step.id, switch.rationale));
                        });
                    }
                    tracing::debug!(step = %step.id, attempt = retries + 1, "Retrying after: {}", err);
                    previous_error = Some(err.to_string());
                    retries += 1;
                }
            }
        }
    }

    /// Run one attempt of a step
    async fn execute_step(
        &self,
        step: &Step,
        state: &mut RunState,
        session: &mut dyn GenerationSession,
        previous_error: Option<&str>,
    ) -> Result<Outcome, StepError> {
        let step = self.sanitized(step);
        validate_contract(&step)?;
        validate_dependencies(&step, &state.completed)?;
        preflight(&step, state.greenfield)?;

        match step.action {
            Action::Read => {
                let path = target_path(&step)?;
                let text = self.backend.read_file(path).await?;
                Ok(Outcome {
                    output: Some(text),
                    ..Outcome::default()
                })
            }
            Action::Write => self.write(&step, state, session, previous_error).await,
            Action::Run => {
                let command = step.command.as_deref().unwrap_or_default().trim();
                let output = self.backend.run(command).await?;
                if !output.success() {
                    return Err(StepError::CommandFailed {
                        command: command.to_string(),
                        exit_code: output.exit_code,
                        stderr: output.stderr.trim().to_string(),
                    });
                }
                Ok(Outcome {
                    output: Some(output.stdout),
                    ..Outcome::default()
                })
            }
            Action::Delete => {
                let path = target_path(&step)?;
                match self.backend.delete(path).await {
                    Ok(()) => Ok(Outcome {
                        output: Some(format!("deleted {path}")),
                        ..Outcome::default()
                    }),
                    Err(e) if e.code == ErrorCode::NotFound => {
                        tracing::debug!(path, "Delete target already absent");
                        Ok(Outcome {
                            output: Some(format!("{path} already absent")),
                            ..Outcome::default()
                        })
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    async fn write(
        &self,
        step: &Step,
        state: &mut RunState,
        session: &mut dyn GenerationSession,
        previous_error: Option<&str>,
    ) -> Result<Outcome, StepError> {
        let path = target_path(step)?;
        let content = match &step.content {
            Some(content) => content.clone(),
            None => {
                let reply = session
                    .send_message(&content_prompt(step, path, previous_error))
                    .await?;
                if reply.trim().is_empty() {
                    return Err(keel_plan::GenerationError::EmptyResponse.into());
                }
                unwrap_content(&reply)
            }
        };

        let mut warnings = Vec::new();
        if self.config.validate_content {
            let review = self.guard.review(path, &content, &state.written);
            if review.is_blocking() {
                return Err(StepError::ContentRejected {
                    path: path.to_string(),
                    issues: review.triage.critical,
                });
            }
            warnings = review.triage.suggestions;
        }

        if let Some((parent, _)) = path.rsplit_once('/') {
            if !parent.is_empty() {
                self.backend.create_dir_all(parent).await?;
            }
        }
        self.backend.write_file(path, &content).await?;

        state.greenfield = false;
        let bytes = content.len();
        state.written.insert(normalize_path(path), content);
        Ok(Outcome {
            output: Some(format!("wrote {bytes} bytes to {path}")),
            warnings,
        })
    }

    /// Copy of `step` with its path relativized and sanitized
    fn sanitized(&self, step: &Step) -> Step {
        match step.path.as_deref() {
            Some(raw) => {
                let clean = sanitize_path(&relativize(
                    &self.config.workspace_root,
                    &sanitize_path(raw),
                ));
                if clean != raw {
                    tracing::debug!(step = %step.id, raw, clean = clean.as_str(), "Sanitized path");
                }
                step.clone().with_path(clean)
            }
            None => step.clone(),
        }
    }

    fn notify(&self, event: impl Fn(&dyn ExecutionObserver)) {
        for observer in &self.observers {
            event(observer.as_ref());
        }
    }
}

fn target_path(step: &Step) -> Result<&str, StepError> {
    step.path
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| StepError::contract(step, "requires a path"))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
