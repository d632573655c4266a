//! Event interpreter: folds the worker's event stream into the session.
//!
//! One pump task per session consumes the channel in order, making the
//! interpreter the sole writer of the [`SessionStore`]. Readers take
//! snapshots concurrently and never block ingestion.

use std::time::Instant;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::session::{SessionStatus, SessionStore, WorkerEvent};

#[derive(Debug, Clone)]
pub struct EventInterpreter {
    store: SessionStore,
}

impl EventInterpreter {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Drain the channel until every sender is dropped (worker teardown).
    pub async fn run(self, mut events: UnboundedReceiver<WorkerEvent>) {
        while let Some(event) = events.recv().await {
            self.apply(event);
        }
        debug!("event channel closed, interpreter done");
    }

    /// Fold one event into the live session.
    pub fn apply(&self, event: WorkerEvent) {
        self.store.with_session(|session| match event {
            WorkerEvent::Log { message } => {
                session.logs.push(message);
            }
            WorkerEvent::Progress { progress } => {
                apply_progress(session, progress);
            }
            WorkerEvent::Status { status, progress } => {
                // Terminal states are sticky: a late status event from a
                // worker pipe can never resurrect a finished session.
                if session.status.is_terminal() {
                    debug!(?status, "ignoring status event after terminal state");
                    return;
                }
                session.status = status;
                if status.is_terminal() {
                    session.finished_at = Some(Instant::now());
                }
                apply_progress(session, progress);
            }
            WorkerEvent::Path { path } => {
                // Last writer wins: the worker refines the subpath as the
                // run proceeds.
                session.output_subpath = Some(path);
            }
        });
    }
}

/// Progress rule shared by progress and status events: absent samples are
/// ignored, present ones are clamped to 0-100 and never move backwards.
fn apply_progress(session: &mut crate::session::RecoverySession, progress: Option<f64>) {
    if let Some(value) = progress {
        let clamped = value.clamp(0.0, 100.0);
        if clamped > session.progress {
            session.progress = clamped;
        }
    }
}

/// Classify terminal status for a finished worker: user cancellation is an
/// abort, everything else that failed is an error.
pub fn terminal_status(cancelled: bool, success: bool) -> SessionStatus {
    if cancelled {
        SessionStatus::Aborted
    } else if success {
        SessionStatus::Completed
    } else {
        SessionStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_session() -> (SessionStore, EventInterpreter) {
        let store = SessionStore::new();
        store.reset();
        let interpreter = EventInterpreter::new(store.clone());
        (store, interpreter)
    }

    #[test]
    fn test_logs_append_in_order_without_dedup() {
        let (store, interpreter) = store_with_session();
        for message in ["one", "two", "two", "three"] {
            interpreter.apply(WorkerEvent::Log {
                message: message.to_string(),
            });
        }
        let session = store.snapshot().unwrap();
        assert_eq!(session.logs, vec!["one", "two", "two", "three"]);
    }

    #[test]
    fn test_absent_progress_ignored() {
        let (store, interpreter) = store_with_session();
        interpreter.apply(WorkerEvent::Progress { progress: Some(40.0) });
        interpreter.apply(WorkerEvent::Progress { progress: None });
        assert_eq!(store.snapshot().unwrap().progress, 40.0);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let (store, interpreter) = store_with_session();
        interpreter.apply(WorkerEvent::Progress { progress: Some(50.0) });
        interpreter.apply(WorkerEvent::Progress { progress: Some(35.0) });
        assert_eq!(store.snapshot().unwrap().progress, 50.0);

        interpreter.apply(WorkerEvent::Progress { progress: Some(75.0) });
        assert_eq!(store.snapshot().unwrap().progress, 75.0);
    }

    #[test]
    fn test_progress_clamped() {
        let (store, interpreter) = store_with_session();
        interpreter.apply(WorkerEvent::Progress {
            progress: Some(130.0),
        });
        assert_eq!(store.snapshot().unwrap().progress, 100.0);
    }

    #[test]
    fn test_status_carries_progress() {
        let (store, interpreter) = store_with_session();
        interpreter.apply(WorkerEvent::Status {
            status: SessionStatus::Recovering,
            progress: Some(62.0),
        });
        let session = store.snapshot().unwrap();
        assert_eq!(session.status, SessionStatus::Recovering);
        assert_eq!(session.progress, 62.0);
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let (store, interpreter) = store_with_session();
        interpreter.apply(WorkerEvent::Status {
            status: SessionStatus::Error,
            progress: None,
        });
        interpreter.apply(WorkerEvent::Status {
            status: SessionStatus::Completed,
            progress: Some(100.0),
        });
        let session = store.snapshot().unwrap();
        assert_eq!(session.status, SessionStatus::Error);
        assert!(session.finished_at.is_some());
    }

    #[test]
    fn test_path_last_writer_wins() {
        let (store, interpreter) = store_with_session();
        interpreter.apply(WorkerEvent::Path {
            path: "Recovery_20250114_190000".to_string(),
        });
        interpreter.apply(WorkerEvent::Path {
            path: "Recovery_20250114_190000\\Images".to_string(),
        });
        assert_eq!(
            store.snapshot().unwrap().output_subpath.as_deref(),
            Some("Recovery_20250114_190000\\Images")
        );
    }

    #[test]
    fn test_terminal_classification() {
        assert_eq!(terminal_status(true, false), SessionStatus::Aborted);
        assert_eq!(terminal_status(true, true), SessionStatus::Aborted);
        assert_eq!(terminal_status(false, true), SessionStatus::Completed);
        assert_eq!(terminal_status(false, false), SessionStatus::Error);
    }
}
