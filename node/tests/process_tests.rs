// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![cfg(unix)]

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use snapcheck_node::errors::HarnessError;
use snapcheck_node::process::ProcessController;

const POLL: Duration = Duration::from_millis(20);

#[tokio::test]
async fn test_stop_terminates_and_observes_exit() {
    let mut process = ProcessController::spawn(Path::new("sleep"), &[OsString::from("30")], POLL).unwrap();
    assert!(process.id().is_some());
    assert!(process.is_running().unwrap());

    let status = tokio::time::timeout(Duration::from_secs(10), process.stop())
        .await
        .expect("stop should return once the process is gone")
        .unwrap();

    assert!(!status.success());
    assert!(!process.is_running().unwrap());
    assert_eq!(process.exit_status(), Some(status));
}

#[tokio::test]
async fn test_stop_after_natural_exit_returns_recorded_status() {
    let mut process = ProcessController::spawn(Path::new("true"), &[], POLL).unwrap();

    while process.is_running().unwrap() {
        tokio::time::sleep(POLL).await;
    }

    let status = process.stop().await.unwrap();
    assert!(status.success());
    // A second stop is a no-op.
    assert_eq!(process.stop().await.unwrap(), status);
}

#[tokio::test]
async fn test_spawn_missing_binary_is_process_error() {
    let result = ProcessController::spawn(Path::new("/nonexistent/opera-node"), &[], POLL);
    assert!(matches!(result, Err(HarnessError::Process(_))));
}
