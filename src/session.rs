//! Session state: the single mutable record of one recovery run.
//!
//! At most one live session exists per supervisor. The event interpreter
//! is the only writer; every other component reads cloned snapshots.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Lifecycle states of a recovery session.
///
/// Scanning and Recovering are active; Completed, Aborted and Error are
/// terminal and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scanning,
    Recovering,
    Completed,
    Aborted,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Aborted | SessionStatus::Error
        )
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

/// One event from the worker's output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "lowercase")]
pub enum WorkerEvent {
    /// Free-text output line, appended to the session log verbatim.
    Log { message: String },
    /// Progress sample; absent values are ignored rather than zeroed.
    Progress { progress: Option<f64> },
    /// Status transition, optionally carrying a progress sample.
    Status {
        status: SessionStatus,
        progress: Option<f64>,
    },
    /// Resolved output subpath (e.g. `Recovery_20250114_193022`);
    /// last writer wins since the worker may refine it mid-run.
    Path { path: String },
}

/// Mutable state of the current (or most recent) recovery run.
#[derive(Debug, Clone)]
pub struct RecoverySession {
    pub status: SessionStatus,
    /// 0-100, monotonically non-decreasing within one session.
    pub progress: f64,
    /// Ordered, append-only worker output.
    pub logs: Vec<String>,
    /// Subpath under the destination where the worker writes, once known.
    pub output_subpath: Option<String>,
    pub started_at: Instant,
    /// Set when a terminal status is entered; freezes the elapsed clock.
    pub finished_at: Option<Instant>,
}

impl RecoverySession {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Scanning,
            progress: 0.0,
            logs: Vec::new(),
            output_subpath: None,
            started_at: Instant::now(),
            finished_at: None,
        }
    }
}

impl Default for RecoverySession {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, injectable holder for the active session.
///
/// Cheap to clone (an `Arc` inside). Mutation is crate-private so the
/// single-writer discipline of the interpreter cannot be bypassed from
/// outside.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<RecoverySession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session, if one has ever started.
    pub fn snapshot(&self) -> Option<RecoverySession> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// True while the session is non-terminal.
    pub fn is_active(&self) -> bool {
        self.snapshot()
            .map(|session| session.status.is_active())
            .unwrap_or(false)
    }

    /// Install a fresh session, discarding the previous one.
    pub(crate) fn reset(&self) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(RecoverySession::new());
    }

    /// Run one mutation against the live session. No-op when no session
    /// exists.
    pub(crate) fn with_session<F>(&self, mutate: F)
    where
        F: FnOnce(&mut RecoverySession),
    {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(session) = guard.as_mut() {
            mutate(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Aborted.is_terminal());
        assert!(SessionStatus::Error.is_terminal());
        assert!(SessionStatus::Scanning.is_active());
        assert!(SessionStatus::Recovering.is_active());
    }

    #[test]
    fn test_store_starts_empty() {
        let store = SessionStore::new();
        assert!(store.snapshot().is_none());
        assert!(!store.is_active());
    }

    #[test]
    fn test_reset_installs_fresh_session() {
        let store = SessionStore::new();
        store.reset();
        store.with_session(|session| {
            session.progress = 55.0;
            session.logs.push("old".to_string());
        });

        store.reset();
        let session = store.snapshot().unwrap();
        assert_eq!(session.status, SessionStatus::Scanning);
        assert_eq!(session.progress, 0.0);
        assert!(session.logs.is_empty());
        assert!(session.output_subpath.is_none());
    }

    #[test]
    fn test_worker_event_wire_shape() {
        let event = WorkerEvent::Status {
            status: SessionStatus::Recovering,
            progress: Some(62.5),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"status\""));
        assert!(json.contains("\"recovering\""));
    }
}
