//! Orchestrator facade: the one entry point a frontend talks to.
//!
//! Accepts loosely-typed requests (plain strings and bools, the shape a
//! UI naturally produces), validates and compiles them into a
//! [`JobDescriptor`], and drives the supervisor. All state flows back out
//! as session snapshots.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::endpoint::{FilesystemKind, TargetEndpoint, VolumeCatalog, VolumeInfo};
use crate::error::{ConfigError, Result};
use crate::filters::FilterSet;
use crate::host::{HostServices, SystemHost, SystemVolumeCatalog};
use crate::job::{self, JobDescriptor, ScanMode};
use crate::options::RecoveryOptions;
use crate::results::{self, RecoveredFile};
use crate::session::{RecoverySession, SessionStore};
use crate::supervisor::{ProcessSupervisor, SessionHandle, WorkerSpec};

/// One recovery request as a frontend submits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecoveryRequest {
    pub source: String,
    pub destination: String,
    /// "regular" or "extensive"; anything else falls back to regular.
    pub mode: String,
    pub filters: Vec<String>,
    pub segment_mode: bool,
    pub signature_mode: bool,
    pub recover_non_deleted: bool,
    pub keep_both: bool,
    pub auto_accept: bool,
    pub recover_system_files: bool,
    pub keep_all_extensions: bool,
    /// Filesystem label of the source, when the frontend knows it.
    pub source_fs: Option<String>,
    pub verbose_mode: bool,
}

impl RecoveryRequest {
    /// Compile the request into an immutable job descriptor.
    pub fn compile(&self) -> std::result::Result<JobDescriptor, ConfigError> {
        let source_fs = self
            .source_fs
            .as_deref()
            .and_then(FilesystemKind::parse);
        let source = if self.source.trim().is_empty() {
            None
        } else {
            Some(TargetEndpoint::volume(self.source.clone(), source_fs))
        };
        let destination = if self.destination.trim().is_empty() {
            None
        } else {
            Some(TargetEndpoint::directory(self.destination.clone()))
        };

        let mode = ScanMode::parse(&self.mode);
        let options = RecoveryOptions {
            segment_mode: self.segment_mode,
            signature_mode: self.signature_mode,
            recover_non_deleted: self.recover_non_deleted,
            keep_both: self.keep_both,
            auto_accept: self.auto_accept,
            recover_system_files: self.recover_system_files,
            keep_all_extensions: self.keep_all_extensions,
            verbose_mode: self.verbose_mode,
        };
        let filters = FilterSet::from_raw(self.filters.iter().map(String::as_str));

        job::compile(source.as_ref(), destination.as_ref(), mode, options, &filters)
    }
}

/// Facade over the supervisor, host shell and volume catalog.
pub struct Orchestrator {
    supervisor: ProcessSupervisor,
    host: Arc<dyn HostServices>,
    catalog: Arc<dyn VolumeCatalog>,
}

impl Orchestrator {
    /// Production wiring: real worker, real shell, real disk list.
    pub fn new() -> Self {
        Self::with_parts(
            WorkerSpec::default(),
            Arc::new(SystemHost),
            Arc::new(SystemVolumeCatalog),
        )
    }

    pub fn with_parts(
        spec: WorkerSpec,
        host: Arc<dyn HostServices>,
        catalog: Arc<dyn VolumeCatalog>,
    ) -> Self {
        Self {
            supervisor: ProcessSupervisor::new(SessionStore::new(), spec),
            host,
            catalog,
        }
    }

    pub fn list_volumes(&self) -> Vec<VolumeInfo> {
        self.catalog.list_volumes()
    }

    /// Compile and start one recovery run.
    pub fn start_recovery(&self, request: &RecoveryRequest) -> Result<SessionHandle> {
        let job = request.compile()?;
        info!(source = %job.source.identity(), destination = %job.destination, "starting recovery");
        self.supervisor.start(job)
    }

    pub fn cancel_recovery(&self) -> Result<()> {
        self.supervisor.cancel()
    }

    /// Snapshot of the current session for polling frontends.
    pub fn snapshot(&self) -> Option<RecoverySession> {
        self.supervisor.store().snapshot()
    }

    pub fn scan_recovered_files(&self, destination: &str) -> Result<Vec<RecoveredFile>> {
        results::scan_recovered_files(destination)
    }

    pub fn reveal_path(&self, path: &str) -> Result<()> {
        self.host.reveal(path)
    }

    pub fn check_health(&self, drive: &str) -> Result<String> {
        self.host.check_health(drive)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RecoveryRequest {
        RecoveryRequest {
            source: "E:".to_string(),
            destination: "D:\\rescued".to_string(),
            mode: "regular".to_string(),
            filters: vec!["Images".to_string(), ".docx".to_string()],
            segment_mode: false,
            signature_mode: false,
            recover_non_deleted: false,
            keep_both: true,
            auto_accept: true,
            recover_system_files: false,
            keep_all_extensions: false,
            source_fs: Some("NTFS".to_string()),
            verbose_mode: true,
        }
    }

    #[test]
    fn test_request_compiles_to_descriptor() {
        let job = request().compile().unwrap();
        assert_eq!(job.source.identity(), "E:");
        assert_eq!(job.destination, "D:\\rescued");
        assert_eq!(job.mode, ScanMode::Regular);
        assert_eq!(job.filters.len(), 2);
    }

    #[test]
    fn test_unknown_mode_falls_back_to_regular() {
        let mut req = request();
        req.mode = "turbo".to_string();
        let job = req.compile().unwrap();
        assert_eq!(job.mode, ScanMode::Regular);
    }

    #[test]
    fn test_non_ntfs_source_forces_extensive() {
        let mut req = request();
        req.source_fs = Some("exFAT".to_string());
        let job = req.compile().unwrap();
        assert_eq!(job.mode, ScanMode::Extensive);
    }

    #[test]
    fn test_missing_source_rejected() {
        let mut req = request();
        req.source = "  ".to_string();
        assert_eq!(req.compile(), Err(ConfigError::MissingSource));
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_string(&request()).unwrap();
        assert!(json.contains("\"segment_mode\":false"));
        assert!(json.contains("\"source_fs\":\"NTFS\""));

        let parsed: RecoveryRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.source, "E:");
    }
}
