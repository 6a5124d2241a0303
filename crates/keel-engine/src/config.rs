//! Engine configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Execution engine configuration
///
/// Loadable from TOML; every field is optional there and falls back to
/// [`EngineConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Additional attempts after a retryable failure
    pub max_retries: u32,
    /// Keep running later steps after a terminal failure
    pub continue_on_error: bool,
    /// Move store writes ahead of the components that use them
    pub reorder_writes: bool,
    /// Validate generated content before writing it
    pub validate_content: bool,
    /// Command timeout in seconds (`None` waits forever)
    pub command_timeout_secs: Option<u64>,
    /// Project root all step paths are relative to
    pub workspace_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            continue_on_error: false,
            reorder_writes: true,
            validate_content: true,
            command_timeout_secs: Some(300),
            workspace_root: PathBuf::from("."),
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` on invalid TOML or unknown keys
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Read` if the file cannot be read, `ConfigError::Parse`
    /// if it is not valid configuration
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With max retries
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// With continue-on-error policy
    #[inline]
    #[must_use]
    pub fn with_continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    /// With write reordering
    #[inline]
    #[must_use]
    pub fn with_reorder_writes(mut self, enabled: bool) -> Self {
        self.reorder_writes = enabled;
        self
    }

    /// With content validation
    #[inline]
    #[must_use]
    pub fn with_validate_content(mut self, enabled: bool) -> Self {
        self.validate_content = enabled;
        self
    }

    /// With command timeout
    #[inline]
    #[must_use]
    pub fn with_command_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.command_timeout_secs = secs;
        self
    }

    /// With workspace root
    #[inline]
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Command timeout as a duration
    #[inline]
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_retries, 2);
        assert!(!config.continue_on_error);
        assert!(config.reorder_writes);
        assert!(config.validate_content);
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.workspace_root, PathBuf::from("."));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("max_retries = 5\ncontinue_on_error = true\n").unwrap();
        assert_eq!(config.max_retries, 5);
        assert!(config.continue_on_error);
        assert!(config.reorder_writes);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = EngineConfig::from_toml_str("retries = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "workspace_root = \"/srv/app\"\ncommand_timeout_secs = 10").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.workspace_root, PathBuf::from("/srv/app"));
        assert_eq!(config.command_timeout_secs, Some(10));

        let missing = EngineConfig::load("/nonexistent/keel.toml").unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn builders_chain() {
        let config = EngineConfig::new()
            .with_max_retries(0)
            .with_reorder_writes(false)
            .with_command_timeout_secs(None);
        assert_eq!(config.max_retries, 0);
        assert!(!config.reorder_writes);
        assert_eq!(config.command_timeout(), None);
    }
}
