//! Process supervisor: owns the lifecycle of at most one worker process.
//!
//! `start` validates, resets the session, spawns the worker and wires
//! three tasks: two pipe readers that turn output into [`WorkerEvent`]s
//! and a waiter that reaps the child and classifies its exit. Cancellation
//! is cooperative from the caller's side: `cancel` signals the waiter,
//! which kills the child and deterministically lands the session in
//! Aborted.

use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::decode::{LineDecoder, OutputEncoding};
use crate::error::{Result, SupervisorError};
use crate::interpreter::{terminal_status, EventInterpreter};
use crate::invocation::worker_args;
use crate::job::JobDescriptor;
use crate::session::{SessionStatus, SessionStore, WorkerEvent};

/// Exit code of an access violation (0xC0000005), winfr's known crash
/// signature on exFAT extensive scans.
const ACCESS_VIOLATION_EXIT: i32 = -1073741819;

/// Recent-line window used to drop output winfr mirrors on both pipes.
const DEDUP_WINDOW: usize = 10;

const READ_BUF_SIZE: usize = 4096;

lazy_static! {
    static ref PROGRESS_RE: Regex = Regex::new(r"(\d+)%").expect("progress regex");
    static ref PASS_RE: Regex =
        Regex::new(r"(?i)pass\s*(1|2|scanning|recovering)").expect("pass regex");
    static ref PATH_RE: Regex = Regex::new(r"Recovery_\d{8}_\d{6}").expect("path regex");
}

/// Which worker binary to run and how to decode its pipes.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub program: String,
    pub encoding: OutputEncoding,
}

impl Default for WorkerSpec {
    fn default() -> Self {
        Self {
            program: "winfr".to_string(),
            encoding: OutputEncoding::Utf16Le,
        }
    }
}

/// Read-only handle to a started session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    store: SessionStore,
    destination: String,
}

impl SessionHandle {
    pub fn snapshot(&self) -> Option<crate::session::RecoverySession> {
        self.store.snapshot()
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}

struct ActiveJob {
    cancel: oneshot::Sender<()>,
}

pub struct ProcessSupervisor {
    store: SessionStore,
    spec: WorkerSpec,
    active: Arc<Mutex<Option<ActiveJob>>>,
}

impl ProcessSupervisor {
    pub fn new(store: SessionStore, spec: WorkerSpec) -> Self {
        Self {
            store,
            spec,
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Launch the worker for one compiled job.
    ///
    /// Rejects with [`SupervisorError::AlreadyRunning`] while a session is
    /// non-terminal; otherwise resets the session and returns as soon as
    /// the child is spawned.
    pub fn start(&self, job: JobDescriptor) -> Result<SessionHandle> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if active.is_some() || self.store.is_active() {
            return Err(SupervisorError::AlreadyRunning);
        }

        let args = worker_args(&job);

        // Pre-create the destination; winfr crashes on a missing directory.
        std::fs::create_dir_all(&job.destination)?;

        self.store.reset();
        let (event_tx, event_rx) = unbounded_channel::<WorkerEvent>();
        let interpreter = EventInterpreter::new(self.store.clone());
        tokio::spawn(interpreter.run(event_rx));

        send(&event_tx, WorkerEvent::Status {
            status: SessionStatus::Scanning,
            progress: Some(0.0),
        });
        send(&event_tx, log_event(format!(
            "Command: {} {}",
            self.spec.program,
            args.join(" ")
        )));
        for ignored in job.ignored_filters() {
            send(&event_tx, log_event(format!(
                "Filter `{}` is not supported in signature mode and will be ignored",
                ignored
            )));
        }
        send(&event_tx, log_event("Starting recovery process...".to_string()));

        let mut command = Command::new(&self.spec.program);
        command
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        command.creation_flags(0x08000000); // CREATE_NO_WINDOW

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                // Land the session in a terminal state so a retry is not
                // blocked by a phantom active run.
                send(&event_tx, log_event(format!(
                    "Failed to launch {}: {}",
                    self.spec.program, source
                )));
                send(&event_tx, WorkerEvent::Status {
                    status: SessionStatus::Error,
                    progress: None,
                });
                return Err(SupervisorError::Spawn {
                    program: self.spec.program.clone(),
                    source,
                });
            }
        };

        info!(program = %self.spec.program, destination = %job.destination, "worker spawned");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let dedup = Arc::new(Mutex::new(VecDeque::with_capacity(DEDUP_WINDOW)));

        let stdout_task = stdout.map(|pipe| {
            let parser = LineParser::new(self.spec.encoding, event_tx.clone(), dedup.clone(), false);
            tokio::spawn(parser.consume(pipe))
        });
        let stderr_task = stderr.map(|pipe| {
            let parser = LineParser::new(self.spec.encoding, event_tx.clone(), dedup.clone(), true);
            tokio::spawn(parser.consume(pipe))
        });

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        *active = Some(ActiveJob { cancel: cancel_tx });

        let active_slot = self.active.clone();
        tokio::spawn(async move {
            let mut cancelled = false;
            let exit = tokio::select! {
                status = child.wait() => status,
                _ = &mut cancel_rx => {
                    cancelled = true;
                    if let Err(err) = child.start_kill() {
                        warn!(%err, "failed to kill worker");
                    }
                    child.wait().await
                }
            };

            // Let the pipes drain so the terminal status lands after the
            // final log lines.
            if let Some(task) = stdout_task {
                let _ = task.await;
            }
            if let Some(task) = stderr_task {
                let _ = task.await;
            }

            let success = exit.as_ref().map(|status| status.success()).unwrap_or(false);
            let status = terminal_status(cancelled, success);
            match status {
                SessionStatus::Aborted => {
                    send(&event_tx, WorkerEvent::Status {
                        status: SessionStatus::Aborted,
                        progress: None,
                    });
                    send(&event_tx, log_event("! OPERATION ABORTED BY USER !".to_string()));
                }
                SessionStatus::Completed => {
                    send(&event_tx, WorkerEvent::Status {
                        status: SessionStatus::Completed,
                        progress: Some(100.0),
                    });
                    send(&event_tx, log_event(
                        "Recovery operation completed successfully.".to_string(),
                    ));
                }
                _ => {
                    send(&event_tx, WorkerEvent::Status {
                        status: SessionStatus::Error,
                        progress: None,
                    });
                    match exit {
                        Ok(exit_status) => {
                            let code = exit_status.code().unwrap_or(-1);
                            for line in crash_diagnostics(code) {
                                send(&event_tx, log_event(line));
                            }
                        }
                        Err(err) => {
                            send(&event_tx, log_event(format!(
                                "Failed to wait for process: {}",
                                err
                            )));
                        }
                    }
                }
            }

            let mut slot = active_slot
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *slot = None;
        });

        Ok(SessionHandle {
            store: self.store.clone(),
            destination: job.destination,
        })
    }

    /// Request cancellation of the active worker.
    ///
    /// A terminal session makes this a no-op success; with no session at
    /// all it reports [`SupervisorError::NotRunning`].
    pub fn cancel(&self) -> Result<()> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match active.take() {
            Some(job) => {
                // A closed receiver means the waiter already finished; the
                // session is terminal either way.
                let _ = job.cancel.send(());
                info!("cancellation requested");
                Ok(())
            }
            None => match self.store.snapshot() {
                Some(session) if session.status.is_terminal() => Ok(()),
                _ => Err(SupervisorError::NotRunning),
            },
        }
    }
}

fn send(tx: &UnboundedSender<WorkerEvent>, event: WorkerEvent) {
    // The receiver only drops after the waiter exits; late sends are moot.
    let _ = tx.send(event);
}

fn log_event(message: String) -> WorkerEvent {
    WorkerEvent::Log { message }
}

/// Diagnostic log lines for a failed exit, with a remediation hint for
/// the known exFAT access-violation crash.
fn crash_diagnostics(code: i32) -> Vec<String> {
    if code == ACCESS_VIOLATION_EXIT {
        vec![
            "CRASH DETECTED: worker encountered an Access Violation (0xC0000005).".to_string(),
            "This is a known winfr bug when scanning exFAT drives in Extensive mode.".to_string(),
            "--- TROUBLESHOOTING ---".to_string(),
            "1. Run a health check on the source drive (chkdsk <drive>: /f).".to_string(),
            "2. Check the Microsoft Store for 'Windows File Recovery' updates.".to_string(),
            "3. Disable 'Keep Both' in Advanced Options to reduce file conflicts.".to_string(),
        ]
    } else {
        vec![format!("Recovery process exited with code: {}", code)]
    }
}

/// Scan phase inferred from worker output; weights raw percentages so the
/// two winfr passes map onto one 0-100 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanPhase {
    Scanning,
    Recovering,
}

/// Turns one pipe's bytes into worker events.
struct LineParser {
    decoder: LineDecoder,
    events: UnboundedSender<WorkerEvent>,
    /// Shared across both pipes: winfr mirrors some lines on stdout and
    /// stderr.
    recent: Arc<Mutex<VecDeque<String>>>,
    is_stderr: bool,
    phase: ScanPhase,
}

impl LineParser {
    fn new(
        encoding: OutputEncoding,
        events: UnboundedSender<WorkerEvent>,
        recent: Arc<Mutex<VecDeque<String>>>,
        is_stderr: bool,
    ) -> Self {
        Self {
            decoder: LineDecoder::new(encoding),
            events,
            recent,
            is_stderr,
            phase: ScanPhase::Scanning,
        }
    }

    async fn consume<R>(mut self, mut pipe: R)
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut buffer = [0u8; READ_BUF_SIZE];
        loop {
            match pipe.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => {
                    for line in self.decoder.feed(&buffer[..n]) {
                        self.handle_line(&line);
                    }
                }
                Err(err) => {
                    warn!(%err, "worker pipe read failed");
                    break;
                }
            }
        }
        if let Some(line) = self.decoder.finish() {
            self.handle_line(&line);
        }
    }

    fn handle_line(&mut self, line: &str) {
        if self.is_stderr {
            // stderr carries no progress; it is log-only.
            if self.should_log(line) {
                send(&self.events, log_event(format!("[stderr] {}", line)));
            }
            return;
        }

        if let Some(caps) = PASS_RE.captures(line) {
            let pass = caps[1].to_lowercase();
            self.phase = if pass == "1" || pass == "scanning" {
                ScanPhase::Scanning
            } else {
                ScanPhase::Recovering
            };
        }

        let mut is_progress = false;
        if let Some(caps) = PROGRESS_RE.captures(line) {
            if let Ok(raw) = caps[1].parse::<f64>() {
                is_progress = true;
                // Pass 1 covers 0-50, pass 2 covers 50-100.
                let weighted = match self.phase {
                    ScanPhase::Scanning => raw * 0.5,
                    ScanPhase::Recovering => 50.0 + raw * 0.5,
                };
                let weighted = weighted.min(100.0);
                let status = match self.phase {
                    ScanPhase::Scanning => SessionStatus::Scanning,
                    ScanPhase::Recovering => SessionStatus::Recovering,
                };
                send(&self.events, WorkerEvent::Progress {
                    progress: Some(weighted),
                });
                send(&self.events, WorkerEvent::Status {
                    status,
                    progress: Some(weighted),
                });
            }
        }

        if let Some(found) = PATH_RE.find(line) {
            send(&self.events, WorkerEvent::Path {
                path: found.as_str().to_string(),
            });
        }

        // Raw percentage ticks would flood the log.
        if !is_progress && self.should_log(line) {
            send(&self.events, log_event(line.to_string()));
        }
    }

    fn should_log(&self, line: &str) -> bool {
        let mut recent = self
            .recent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if recent.iter().any(|seen| seen == line) {
            return false;
        }
        if recent.len() >= DEDUP_WINDOW {
            recent.pop_front();
        }
        recent.push_back(line.to_string());
        true
    }
}
