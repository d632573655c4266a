//! End-to-end supervisor runs against a scripted fake worker.

#![cfg(unix)]

use std::time::Duration;

use winfr_bridge::decode::OutputEncoding;
use winfr_bridge::endpoint::{FilesystemKind, TargetEndpoint};
use winfr_bridge::filters::FilterSet;
use winfr_bridge::job::{compile, ScanMode};
use winfr_bridge::options::RecoveryOptions;
use winfr_bridge::session::{RecoverySession, SessionStatus, SessionStore};
use winfr_bridge::supervisor::{ProcessSupervisor, WorkerSpec};
use winfr_bridge::{projector, JobDescriptor, SupervisorError};

fn write_worker_script(dir: &std::path::Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-worker.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}

fn job_for(destination: &str) -> JobDescriptor {
    let source = TargetEndpoint::volume("E:", Some(FilesystemKind::Ntfs));
    let dest = TargetEndpoint::directory(destination);
    compile(
        Some(&source),
        Some(&dest),
        ScanMode::Regular,
        RecoveryOptions::default(),
        &FilterSet::default(),
    )
    .unwrap()
}

fn supervisor_for(script: String) -> ProcessSupervisor {
    ProcessSupervisor::new(
        SessionStore::new(),
        WorkerSpec {
            program: script,
            encoding: OutputEncoding::Utf8,
        },
    )
}

async fn wait_terminal(supervisor: &ProcessSupervisor) -> RecoverySession {
    for _ in 0..500 {
        if let Some(session) = supervisor.store().snapshot() {
            if session.status.is_terminal() {
                return session;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("worker did not reach a terminal state in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn successful_run_drives_session_to_completed() {
    let workdir = tempfile::tempdir().unwrap();
    let script = write_worker_script(
        workdir.path(),
        r#"echo "Pass 1: Scanning disk"
echo "30% complete"
echo "Pass 2: Recovering files"
echo "60% complete"
echo "Saving files to Recovery_20250114_193022"
echo "Files recovered: 4"
exit 0"#,
    );

    let destination = workdir.path().join("out");
    let supervisor = supervisor_for(script);
    supervisor
        .start(job_for(destination.to_str().unwrap()))
        .unwrap();

    let session = wait_terminal(&supervisor).await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.progress, 100.0);
    assert_eq!(
        session.output_subpath.as_deref(),
        Some("Recovery_20250114_193022")
    );
    assert!(session
        .logs
        .iter()
        .any(|line| line == "Files recovered: 4"));
    assert!(session
        .logs
        .iter()
        .any(|line| line.starts_with("Command: ")));
    assert_eq!(projector::recovered_file_count(&session.logs), 4);
    assert!(destination.is_dir());
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_worker_lands_in_error_with_exit_code_logged() {
    let workdir = tempfile::tempdir().unwrap();
    let script = write_worker_script(
        workdir.path(),
        r#"echo "Pass 1: Scanning disk"
exit 2"#,
    );

    let destination = workdir.path().join("out");
    let supervisor = supervisor_for(script);
    supervisor
        .start(job_for(destination.to_str().unwrap()))
        .unwrap();

    let session = wait_terminal(&supervisor).await;
    assert_eq!(session.status, SessionStatus::Error);
    assert!(session
        .logs
        .iter()
        .any(|line| line == "Recovery process exited with code: 2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn second_start_is_rejected_while_active() {
    let workdir = tempfile::tempdir().unwrap();
    let script = write_worker_script(workdir.path(), "sleep 10");

    let destination = workdir.path().join("out");
    let supervisor = supervisor_for(script);
    supervisor
        .start(job_for(destination.to_str().unwrap()))
        .unwrap();

    let second = supervisor.start(job_for(destination.to_str().unwrap()));
    assert!(matches!(second, Err(SupervisorError::AlreadyRunning)));

    supervisor.cancel().unwrap();
    wait_terminal(&supervisor).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_kills_worker_and_marks_aborted() {
    let workdir = tempfile::tempdir().unwrap();
    let script = write_worker_script(
        workdir.path(),
        r#"echo "Pass 1: Scanning disk"
echo "10% complete"
sleep 10"#,
    );

    let destination = workdir.path().join("out");
    let supervisor = supervisor_for(script);
    supervisor
        .start(job_for(destination.to_str().unwrap()))
        .unwrap();

    // Let the first lines arrive before pulling the plug.
    tokio::time::sleep(Duration::from_millis(200)).await;
    supervisor.cancel().unwrap();

    let session = wait_terminal(&supervisor).await;
    assert_eq!(session.status, SessionStatus::Aborted);
    assert!(session
        .logs
        .iter()
        .any(|line| line == "! OPERATION ABORTED BY USER !"));

    // A second cancel on the finished session is a harmless no-op.
    supervisor.cancel().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_without_any_session_reports_not_running() {
    let supervisor = supervisor_for("/bin/true".to_string());
    assert!(matches!(
        supervisor.cancel(),
        Err(SupervisorError::NotRunning)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn spawn_failure_lands_session_in_error() {
    let workdir = tempfile::tempdir().unwrap();
    let destination = workdir.path().join("out");
    let supervisor = supervisor_for("/definitely/not/a/worker".to_string());

    let result = supervisor.start(job_for(destination.to_str().unwrap()));
    assert!(matches!(result, Err(SupervisorError::Spawn { .. })));

    let session = wait_terminal(&supervisor).await;
    assert_eq!(session.status, SessionStatus::Error);
}
