//! Keel Engine - Guarded plan execution
//!
//! Executes ordered plans step by step against a [`Backend`]:
//! - **Sanitization**: model-decorated paths are cleaned before use
//! - **Validation**: contracts, dependencies and pre-flight path checks
//! - **Guarding**: generated content is reviewed before it is written
//! - **Recovery**: bounded retries and advisory strategy switches
//!
//! # Architecture
//!
//! ```text
//! Plan → reorder → [sanitize → validate → preflight → execute → review] → ExecutionResult
//!                           ↑_____________ retry ______________↓
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use keel_engine::{EngineConfig, ExecutionEngine, LocalBackend};
//! use keel_plan::{parse_plan, OfflineSession};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::default();
//! let backend = Arc::new(LocalBackend::new(&config.workspace_root));
//! let mut engine = ExecutionEngine::new(config, backend);
//! let mut plan = parse_plan(raw)?;
//! let result = engine.execute_plan(&mut plan, &mut OfflineSession).await;
//! ```

#![warn(unreachable_pub)]

pub mod backend;
pub mod config;
pub mod contract;
pub mod engine;
pub mod error;
pub mod observer;
pub mod preflight;
pub mod prompt;
pub mod recovery;
pub mod reorder;
pub mod result;
pub mod sanitize;

// Re-exports for convenience
pub use backend::{Backend, BackendError, CommandOutput, ErrorCode, LocalBackend};
pub use config::EngineConfig;
pub use engine::{ExecutionEngine, RunState};
pub use error::{ConfigError, StepError};
pub use observer::{ExecutionObserver, TracingObserver};
pub use result::ExecutionResult;
pub use sanitize::sanitize_path;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running plans
    pub use crate::{
        Backend, EngineConfig, ExecutionEngine, ExecutionObserver, ExecutionResult, LocalBackend,
        StepError, TracingObserver,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
