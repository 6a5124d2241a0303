//! Testing utilities for Keel workspace
//!
//! Shared test doubles and fixtures:
//! - [`MemoryBackend`]: in-memory files with injectable failures
//! - [`ScriptedSession`]: generation session replaying queued replies
//! - step and plan fixtures

#![allow(missing_docs)]

use async_trait::async_trait;
use keel_engine::{Backend, BackendError, CommandOutput, ErrorCode};
use keel_plan::{Action, GenerationError, GenerationSession, Plan, Step};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Injected failure for one path or command
#[derive(Debug, Clone)]
struct Failure {
    code: ErrorCode,
    /// Remaining failing calls; `None` fails forever
    remaining: Option<u32>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
    failures: HashMap<String, Failure>,
    outputs: HashMap<String, VecDeque<CommandOutput>>,
    commands: Vec<String>,
    writes: Vec<String>,
}

impl MemoryState {
    fn take_failure(&mut self, key: &str) -> Option<BackendError> {
        let failure = self.failures.get_mut(key)?;
        match &mut failure.remaining {
            Some(0) => return None,
            Some(n) => *n -= 1,
            None => {}
        }
        Some(BackendError::new(failure.code, key, "injected failure"))
    }

    fn is_dir(&self, path: &str) -> bool {
        let prefix = format!("{path}/");
        self.dirs.contains(path) || self.files.keys().any(|f| f.starts_with(&prefix))
    }
}

/// In-memory [`Backend`]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// With an existing file
    #[must_use]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.lock().files.insert(key(path), content.to_string());
        self
    }

    /// Every operation on `path` (or run of `command`) fails with `code`
    #[must_use]
    pub fn failing(self, path: &str, code: ErrorCode) -> Self {
        self.lock().failures.insert(
            key(path),
            Failure {
                code,
                remaining: None,
            },
        );
        self
    }

    /// The next `times` operations on `path` fail with `code`
    #[must_use]
    pub fn failing_times(self, path: &str, code: ErrorCode, times: u32) -> Self {
        self.lock().failures.insert(
            key(path),
            Failure {
                code,
                remaining: Some(times),
            },
        );
        self
    }

    /// Queue the output of the next run of `command`
    #[must_use]
    pub fn with_command_output(self, command: &str, output: CommandOutput) -> Self {
        self.lock()
            .outputs
            .entry(command.to_string())
            .or_default()
            .push_back(output);
        self
    }

    /// Current content of a file
    pub fn file(&self, path: &str) -> Option<String> {
        self.lock().files.get(&key(path)).cloned()
    }

    /// Whether a file exists
    pub fn exists(&self, path: &str) -> bool {
        self.lock().files.contains_key(&key(path))
    }

    /// Whether a directory was created or holds files
    pub fn has_dir(&self, path: &str) -> bool {
        self.lock().is_dir(&key(path))
    }

    /// Commands run so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    /// Paths written so far, in order
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn key(path: &str) -> String {
    let mut path = path.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_end_matches('/').to_string()
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn read_file(&self, path: &str) -> Result<String, BackendError> {
        let path = key(path);
        let mut state = self.lock();
        if let Some(err) = state.take_failure(&path) {
            return Err(err);
        }
        if state.is_dir(&path) {
            return Err(BackendError::new(ErrorCode::IsADirectory, path, "is a directory"));
        }
        state
            .files
            .get(&path)
            .cloned()
            .ok_or_else(|| BackendError::new(ErrorCode::NotFound, path, "No such file or directory"))
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), BackendError> {
        let path = key(path);
        let mut state = self.lock();
        if let Some(err) = state.take_failure(&path) {
            return Err(err);
        }
        if state.is_dir(&path) {
            return Err(BackendError::new(ErrorCode::IsADirectory, path, "is a directory"));
        }
        state.writes.push(path.clone());
        state.files.insert(path, content.to_string());
        Ok(())
    }

    async fn create_dir_all(&self, path: &str) -> Result<(), BackendError> {
        let path = key(path);
        let mut state = self.lock();
        if let Some(err) = state.take_failure(&path) {
            return Err(err);
        }
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            state.dirs.insert(current.clone());
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let path = key(path);
        let mut state = self.lock();
        if let Some(err) = state.take_failure(&path) {
            return Err(err);
        }
        if state.files.remove(&path).is_some() {
            return Ok(());
        }
        if state.is_dir(&path) {
            let prefix = format!("{path}/");
            state.files.retain(|f, _| !f.starts_with(&prefix));
            state.dirs.retain(|d| d != &path && !d.starts_with(&prefix));
            return Ok(());
        }
        Err(BackendError::new(ErrorCode::NotFound, path, "No such file or directory"))
    }

    async fn run(&self, command: &str) -> Result<CommandOutput, BackendError> {
        let mut state = self.lock();
        state.commands.push(command.to_string());
        if let Some(err) = state.take_failure(command) {
            return Err(err);
        }
        Ok(state
            .outputs
            .get_mut(command)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default())
    }

    async fn is_empty(&self, dir: &str) -> Result<bool, BackendError> {
        let dir = key(dir);
        let state = self.lock();
        if dir.is_empty() || dir == "." {
            return Ok(state.files.is_empty() && state.dirs.is_empty());
        }
        let prefix = format!("{dir}/");
        Ok(!state.files.keys().any(|f| f.starts_with(&prefix))
            && !state.dirs.iter().any(|d| d.starts_with(&prefix)))
    }
}

/// Generation session replaying queued replies
///
/// Runs out of replies with `GenerationError::Failed`.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    replies: VecDeque<Result<String, GenerationError>>,
    prompts: Vec<String>,
    resets: usize,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    #[must_use]
    pub fn with_reply(mut self, reply: &str) -> Self {
        self.replies.push_back(Ok(reply.to_string()));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn with_error(mut self, error: GenerationError) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    /// Prompts received so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Number of `reset` calls
    pub fn reset_count(&self) -> usize {
        self.resets
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

#[async_trait]
impl GenerationSession for ScriptedSession {
    async fn send_message(&mut self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.push(prompt.to_string());
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Failed("no scripted reply left".to_string())))
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

pub fn read_step(n: usize, path: &str) -> Step {
    Step::new(n, Action::Read, format!("read {path}")).with_path(path)
}

pub fn write_step(n: usize, path: &str, content: &str) -> Step {
    Step::new(n, Action::Write, format!("write {path}"))
        .with_path(path)
        .with_content(content)
}

/// Write step whose content comes from the generation session
pub fn generated_write_step(n: usize, path: &str) -> Step {
    Step::new(n, Action::Write, format!("write {path}")).with_path(path)
}

pub fn run_step(n: usize, command: &str) -> Step {
    Step::new(n, Action::Run, format!("run {command}")).with_command(command)
}

pub fn delete_step(n: usize, path: &str) -> Step {
    Step::new(n, Action::Delete, format!("delete {path}")).with_path(path)
}

pub fn plan_of(steps: Vec<Step>) -> Plan {
    Plan::new(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_files_and_dirs() {
        let backend = MemoryBackend::new().with_file("src/a.ts", "a");
        assert!(!backend.is_empty(".").await.unwrap());
        assert!(backend.is_empty("lib").await.unwrap());
        assert_eq!(backend.read_file("./src/a.ts").await.unwrap(), "a");
        assert_eq!(
            backend.read_file("src").await.unwrap_err().code,
            ErrorCode::IsADirectory
        );

        backend.delete("src").await.unwrap();
        assert!(!backend.exists("src/a.ts"));
        assert_eq!(backend.delete("src").await.unwrap_err().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn injected_failures_run_out() {
        let backend = MemoryBackend::new()
            .with_file("a.ts", "a")
            .failing_times("a.ts", ErrorCode::TimedOut, 1);
        assert_eq!(backend.read_file("a.ts").await.unwrap_err().code, ErrorCode::TimedOut);
        assert_eq!(backend.read_file("a.ts").await.unwrap(), "a");
    }

    #[tokio::test]
    async fn scripted_session_counts() {
        let mut session = ScriptedSession::new().with_reply("one");
        session.reset();
        assert_eq!(session.send_message("p1").await.unwrap(), "one");
        assert!(session.send_message("p2").await.is_err());
        assert_eq!(session.reset_count(), 1);
        assert_eq!(session.prompts(), ["p1".to_string(), "p2".to_string()]);
    }
}
