//! Orchestration core for the Windows File Recovery (winfr) command line.
//!
//! winfr does the actual on-disk carving; this crate makes it drivable
//! from a frontend:
//! - Option validation with mode-conflict resolution
//! - Compilation of selections into an immutable job descriptor
//! - Worker process supervision with cooperative cancellation
//! - UTF-16LE pipe decoding and output interpretation
//! - A single-writer session store with snapshot reads
//! - Display projections: smoothed progress, elapsed time, file counts
//! - Post-run enumeration of recovered files

pub mod cli;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod filters;
pub mod host;
pub mod interpreter;
pub mod invocation;
pub mod job;
pub mod options;
pub mod orchestrator;
pub mod projector;
pub mod results;
pub mod session;
pub mod supervisor;

// Re-export commonly used types
pub use endpoint::{FilesystemKind, TargetEndpoint, VolumeCatalog, VolumeInfo};
pub use error::{ConfigError, Result, SupervisorError};
pub use filters::{FilterPreset, FilterSet, FilterToken};
pub use job::{compile, JobDescriptor, ScanMode, DRIVE_ROOT_SUBDIR};
pub use options::{OptionChange, OptionOutcome, RecoveryOptions};
pub use orchestrator::{Orchestrator, RecoveryRequest};
pub use projector::{elapsed, recovered_file_count, SmoothedProgress};
pub use results::{scan_recovered_files, FileCategory, RecoveredFile};
pub use session::{RecoverySession, SessionStatus, SessionStore, WorkerEvent};
pub use supervisor::{ProcessSupervisor, SessionHandle, WorkerSpec};
