//! Keel command line
//!
//! `keel plan` prints the ordered plan parsed from a model reply; `keel run`
//! executes it against a local workspace and prints the aggregate result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keel_engine::{EngineConfig, ExecutionEngine, LocalBackend, TracingObserver};
use keel_plan::{parse_plan, OfflineSession};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "keel", version, about = "Build and run file operation plans")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a raw model reply and print the ordered plan as JSON
    Plan {
        /// File holding the reply, or `-` for stdin
        file: PathBuf,
    },
    /// Parse a raw model reply and execute it
    Run {
        /// File holding the reply, or `-` for stdin
        file: PathBuf,

        /// Project root (overrides the config file)
        #[arg(long)]
        root: Option<PathBuf>,

        /// TOML engine configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep running after a step fails
        #[arg(long)]
        continue_on_error: bool,

        /// Retries after a retryable failure
        #[arg(long)]
        max_retries: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Plan { file } => {
            let plan = parse_plan(&read_input(&file)?)
                .with_context(|| format!("invalid plan in {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            file,
            root,
            config,
            continue_on_error,
            max_retries,
        } => {
            let mut settings = match &config {
                Some(path) => EngineConfig::load(path)?,
                None => EngineConfig::default(),
            };
            if let Some(root) = root {
                settings = settings.with_workspace_root(root);
            }
            if continue_on_error {
                settings = settings.with_continue_on_error(true);
            }
            if let Some(max_retries) = max_retries {
                settings = settings.with_max_retries(max_retries);
            }

            let mut plan = parse_plan(&read_input(&file)?)
                .with_context(|| format!("invalid plan in {}", file.display()))?;
            tracing::info!(
                root = %settings.workspace_root.display(),
                steps = plan.len(),
                "Running plan"
            );

            let backend = LocalBackend::new(&settings.workspace_root)
                .with_timeout(settings.command_timeout());
            let mut engine = ExecutionEngine::new(settings, Arc::new(backend))
                .with_observer(Arc::new(TracingObserver));
            let result = engine.execute_plan(&mut plan, &mut OfflineSession).await;

            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read plan from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "keel",
            "run",
            "plan.json",
            "--root",
            "/srv/app",
            "--continue-on-error",
            "--max-retries",
            "0",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                file,
                root,
                continue_on_error,
                max_retries,
                config,
            } => {
                assert_eq!(file, PathBuf::from("plan.json"));
                assert_eq!(root, Some(PathBuf::from("/srv/app")));
                assert!(continue_on_error);
                assert_eq!(max_retries, Some(0));
                assert!(config.is_none());
            }
            Command::Plan { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn plan_accepts_stdin_marker() {
        let cli = Cli::try_parse_from(["keel", "plan", "-"]).unwrap();
        assert!(matches!(cli.command, Command::Plan { file } if file == Path::new("-")));
    }

    #[test]
    fn reads_plan_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plan.json");
        std::fs::write(&file, "[]").unwrap();
        assert_eq!(read_input(&file).unwrap(), "[]");
        assert!(read_input(&dir.path().join("missing.json")).is_err());
    }
}
