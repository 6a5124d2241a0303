//! File and command backend
//!
//! The engine never touches the filesystem directly. Every operation goes
//! through a [`Backend`], which reports failures as classified
//! [`BackendError`]s so recovery can reason about them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// Classification of a backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// Path does not exist
    NotFound,
    /// Access refused, or the path escapes the root
    PermissionDenied,
    /// File operation on a directory
    IsADirectory,
    /// Target already exists
    AlreadyExists,
    /// Command exceeded its timeout
    TimedOut,
    /// Anything else
    Other,
}

impl ErrorCode {
    /// Map an I/O error kind
    #[must_use]
    pub fn from_io(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            io::ErrorKind::TimedOut => Self::TimedOut,
            _ => Self::Other,
        }
    }

    /// Short name used in messages
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::IsADirectory => "is a directory",
            Self::AlreadyExists => "already exists",
            Self::TimedOut => "timed out",
            Self::Other => "io error",
        }
    }

    /// Failures no retry or alternate strategy can fix
    #[inline]
    #[must_use]
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::IsADirectory)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified backend failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code} at '{path}': {message}")]
pub struct BackendError {
    /// Failure class
    pub code: ErrorCode,
    /// Path or command that failed
    pub path: String,
    /// Underlying error text
    pub message: String,
}

impl BackendError {
    /// Create backend error
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classify an I/O error for `path`
    #[must_use]
    pub fn from_io(path: &str, err: &io::Error) -> Self {
        Self::new(ErrorCode::from_io(err.kind()), path, err.to_string())
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Exit status; -1 when the process was killed by a signal
    pub exit_code: i32,
}

impl CommandOutput {
    /// Whether the command exited with status 0
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// File and command operations against a project tree
///
/// Paths are relative to the backend's root.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read a whole file as text
    async fn read_file(&self, path: &str) -> Result<String, BackendError>;

    /// Create or replace a file
    async fn write_file(&self, path: &str, content: &str) -> Result<(), BackendError>;

    /// Create a directory and its parents
    async fn create_dir_all(&self, path: &str) -> Result<(), BackendError>;

    /// Remove a file or directory tree
    async fn delete(&self, path: &str) -> Result<(), BackendError>;

    /// Run a shell command in the root
    async fn run(&self, command: &str) -> Result<CommandOutput, BackendError>;

    /// Whether a directory has no entries (a missing directory counts as empty)
    async fn is_empty(&self, dir: &str) -> Result<bool, BackendError>;
}

/// Entries ignored when deciding whether a workspace is empty
const IGNORED_ENTRIES: &[&str] = &[".git"];

/// Backend over the local filesystem and shell
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    timeout: Option<Duration>,
}

impl LocalBackend {
    /// Create backend rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            timeout: None,
        }
    }

    /// With command timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path inside the root
    fn resolve(&self, path: &str) -> Result<PathBuf, BackendError> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(BackendError::new(
                ErrorCode::PermissionDenied,
                path,
                "path escapes the workspace root",
            ));
        }
        Ok(self.root.join(relative))
    }

    async fn reject_directory(&self, path: &str, full: &Path) -> Result<(), BackendError> {
        match tokio::fs::metadata(full).await {
            Ok(meta) if meta.is_dir() => Err(BackendError::new(
                ErrorCode::IsADirectory,
                path,
                "expected a file, found a directory",
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn read_file(&self, path: &str) -> Result<String, BackendError> {
        let full = self.resolve(path)?;
        self.reject_directory(path, &full).await?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| BackendError::from_io(path, &e))
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), BackendError> {
        let full = self.resolve(path)?;
        self.reject_directory(path, &full).await?;
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| BackendError::from_io(path, &e))
    }

    async fn create_dir_all(&self, path: &str) -> Result<(), BackendError> {
        let full = self.resolve(path)?;
        tokio::fs::create_dir_all(&full)
            .await
            .map_err(|e| BackendError::from_io(path, &e))
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let full = self.resolve(path)?;
        let meta = tokio::fs::metadata(&full)
            .await
            .map_err(|e| BackendError::from_io(path, &e))?;
        let removed = if meta.is_dir() {
            tokio::fs::remove_dir_all(&full).await
        } else {
            tokio::fs::remove_file(&full).await
        };
        removed.map_err(|e| BackendError::from_io(path, &e))
    }

    async fn run(&self, command: &str) -> Result<CommandOutput, BackendError> {
        let mut cmd = shell(command);
        cmd.current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| BackendError::from_io(command, &e))?;
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    BackendError::new(
                        ErrorCode::TimedOut,
                        command,
                        format!("command exceeded {}s", limit.as_secs()),
                    )
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| BackendError::from_io(command, &e))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn is_empty(&self, dir: &str) -> Result<bool, BackendError> {
        let full = self.resolve(dir)?;
        let mut entries = match tokio::fs::read_dir(&full).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(BackendError::from_io(dir, &e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BackendError::from_io(dir, &e))?
        {
            let name = entry.file_name();
            if !IGNORED_ENTRIES.iter().any(|ignored| name == *ignored) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(unix)]
fn shell(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
