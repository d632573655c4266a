//! Session projector: derives display values from session snapshots.
//!
//! Pure with respect to the session: everything here works on cloned
//! snapshots, so a slow or stalled frontend can never back-pressure the
//! interpreter.

use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use regex::Regex;

use crate::session::RecoverySession;

lazy_static! {
    static ref FILES_RECOVERED_RE: Regex =
        Regex::new(r"(?i)Files recovered:\s+(\d+)").expect("files recovered regex");
}

/// Display-side progress smoother.
///
/// Ticked on a fixed cadence (the frontend uses 100ms), it eases the shown
/// value toward the session's actual progress instead of jumping, and
/// creeps slightly ahead between worker samples so long gaps still look
/// alive.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothedProgress {
    shown: f64,
}

impl SmoothedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f64 {
        self.shown
    }

    /// Advance one tick against the latest snapshot and return the value
    /// to display.
    pub fn tick(&mut self, session: &RecoverySession) -> f64 {
        let actual = session.progress;

        if session.status == crate::session::SessionStatus::Completed {
            self.shown = 100.0;
            return self.shown;
        }

        if self.shown < actual {
            // Ease toward the real value, never slower than 0.1 per tick.
            let step = ((actual - self.shown) * 0.1).max(0.1);
            self.shown = (self.shown + step).min(actual);
        } else if session.status.is_active() && self.shown < actual + 0.9 {
            // Idle creep while the worker is quiet, capped just below the
            // next whole percent so the bar never overtakes reality.
            self.shown = (self.shown + 0.015).min(100.0);
        }

        self.shown
    }
}

/// Wall-clock duration of a session.
///
/// Runs while the session is active and freezes at the instant a terminal
/// status was entered.
pub fn elapsed(session: &RecoverySession) -> Duration {
    let end = session.finished_at.unwrap_or_else(Instant::now);
    end.saturating_duration_since(session.started_at)
}

/// Count of recovered files derived from the session log.
///
/// The worker's explicit `Files recovered: N` summaries are authoritative;
/// the largest one wins. Only when no summary exists do per-file `[OK]`
/// lines serve as an estimate.
pub fn recovered_file_count(logs: &[String]) -> u64 {
    let mut reported: Option<u64> = None;
    for line in logs {
        if let Some(caps) = FILES_RECOVERED_RE.captures(line) {
            if let Ok(count) = caps[1].parse::<u64>() {
                reported = Some(reported.map_or(count, |prev| prev.max(count)));
            }
        }
    }
    if let Some(count) = reported {
        return count;
    }
    logs.iter().filter(|line| line.contains("[OK]")).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;

    fn session(status: SessionStatus, progress: f64) -> RecoverySession {
        let mut session = RecoverySession::new();
        session.status = status;
        session.progress = progress;
        session
    }

    fn logs(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_completed_snaps_to_full() {
        let mut smoothed = SmoothedProgress::new();
        smoothed.tick(&session(SessionStatus::Scanning, 30.0));
        let shown = smoothed.tick(&session(SessionStatus::Completed, 87.0));
        assert_eq!(shown, 100.0);
    }

    #[test]
    fn test_eases_toward_actual_without_overshoot() {
        let mut smoothed = SmoothedProgress::new();
        let target = session(SessionStatus::Recovering, 60.0);
        let first = smoothed.tick(&target);
        assert!(first > 0.0 && first < 60.0);

        let mut last = first;
        for _ in 0..200 {
            last = smoothed.tick(&target);
            assert!(last <= 60.0 + 0.9 + f64::EPSILON);
        }
        assert!(last >= 60.0);
    }

    #[test]
    fn test_minimum_step() {
        let mut smoothed = SmoothedProgress::new();
        // Tiny gap still moves at least 0.1 per tick (capped at the target).
        let near = session(SessionStatus::Scanning, 0.2);
        assert_eq!(smoothed.tick(&near), 0.1);
        assert_eq!(smoothed.tick(&near), 0.2);
    }

    #[test]
    fn test_creep_only_while_active() {
        let mut aborted = SmoothedProgress::new();
        let shown = aborted.tick(&session(SessionStatus::Aborted, 0.0));
        assert_eq!(shown, 0.0);

        let mut active = SmoothedProgress::new();
        let quiet = session(SessionStatus::Scanning, 0.0);
        let first = active.tick(&quiet);
        assert_eq!(first, 0.015);
        for _ in 0..1000 {
            active.tick(&quiet);
        }
        // Creep is capped just below the next percent.
        assert!(active.value() < 0.9 + f64::EPSILON);
    }

    #[test]
    fn test_elapsed_freezes_at_finish() {
        let mut session = RecoverySession::new();
        session.finished_at = Some(session.started_at + Duration::from_secs(42));
        assert_eq!(elapsed(&session), Duration::from_secs(42));
    }

    #[test]
    fn test_explicit_count_takes_maximum() {
        let count = recovered_file_count(&logs(&[
            "Files recovered: 3",
            "Files recovered: 7",
            "Files recovered: 5",
        ]));
        assert_eq!(count, 7);
    }

    #[test]
    fn test_explicit_count_beats_ok_lines() {
        let count = recovered_file_count(&logs(&[
            "[OK] photo1.jpg",
            "[OK] photo2.jpg",
            "files RECOVERED:   12",
        ]));
        assert_eq!(count, 12);
    }

    #[test]
    fn test_ok_lines_used_as_fallback() {
        let count = recovered_file_count(&logs(&[
            "Scanning drive...",
            "[OK] report.pdf",
            "[OK] invoice.xlsx",
        ]));
        assert_eq!(count, 2);
    }

    #[test]
    fn test_empty_log_counts_zero() {
        assert_eq!(recovered_file_count(&[]), 0);
    }
}
