//! Tests for the filesystem backend.
//!
//! Each test works in its own temporary directory.

use keel_engine::{Backend, EngineConfig, ErrorCode, ExecutionEngine, LocalBackend};
use keel_plan::OfflineSession;
use keel_test_utils::{delete_step, plan_of, read_step, write_step};
use std::sync::Arc;
use std::time::Duration;

/// Files round-trip and directories are reported as such.
#[tokio::test]
async fn files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(dir.path());

    assert!(backend.is_empty(".").await.unwrap());
    backend.create_dir_all("src/store").await.unwrap();
    backend.write_file("src/store/cart.ts", "export {};\n").await.unwrap();

    assert!(!backend.is_empty(".").await.unwrap());
    assert_eq!(backend.read_file("src/store/cart.ts").await.unwrap(), "export {};\n");
    assert_eq!(
        backend.read_file("src/store").await.unwrap_err().code,
        ErrorCode::IsADirectory
    );
    assert_eq!(
        backend.read_file("src/missing.ts").await.unwrap_err().code,
        ErrorCode::NotFound
    );

    backend.delete("src").await.unwrap();
    assert_eq!(backend.delete("src").await.unwrap_err().code, ErrorCode::NotFound);
}

/// A missing root counts as an empty workspace.
#[tokio::test]
async fn missing_root_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(dir.path().join("not-created"));
    assert!(backend.is_empty(".").await.unwrap());
}

/// Paths may not leave the root.
#[tokio::test]
async fn escaping_paths_are_denied() {
    let dir = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(dir.path());
    let err = backend.write_file("../outside.txt", "x").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
}

#[cfg(unix)]
#[tokio::test]
async fn commands_capture_output() {
    let dir = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(dir.path());

    let ok = backend.run("echo hello").await.unwrap();
    assert!(ok.success());
    assert_eq!(ok.stdout.trim(), "hello");

    let failed = backend.run("echo oops >&2; exit 3").await.unwrap();
    assert_eq!(failed.exit_code, 3);
    assert_eq!(failed.stderr.trim(), "oops");
}

#[cfg(unix)]
#[tokio::test]
async fn commands_time_out() {
    let dir = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(dir.path()).with_timeout(Some(Duration::from_millis(100)));
    let err = backend.run("sleep 5").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TimedOut);
}

/// The engine writes, reads and deletes real files.
#[tokio::test]
async fn engine_over_local_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default().with_workspace_root(dir.path());
    let backend = Arc::new(LocalBackend::new(dir.path()));
    let mut engine = ExecutionEngine::new(config, backend);

    let absolute = dir.path().join("src/lib/util.ts");
    let mut plan = plan_of(vec![
        write_step(1, &absolute.to_string_lossy(), "export const util = 1;\n"),
        read_step(2, "src/lib/util.ts").depends_on("step_1"),
        delete_step(3, "src/lib/util.ts").depends_on("step_2"),
    ]);

    let outcome = engine.execute_plan(&mut plan, &mut OfflineSession).await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.completed_steps, 3);
    assert!(dir.path().join("src/lib").is_dir());
    assert!(!absolute.exists());
}
