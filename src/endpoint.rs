//! Source and destination endpoints.
//!
//! An endpoint is either a mounted volume (drive letter plus filesystem
//! metadata) or a plain directory picked through a folder dialog. Volume
//! enumeration itself lives in the host shell; this module only defines the
//! shapes the orchestrator consumes.

use serde::{Deserialize, Serialize};

/// Filesystem kind of a volume, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilesystemKind {
    Ntfs,
    Fat32,
    ExFat,
    Other,
}

impl FilesystemKind {
    /// Parse the free-text filesystem label the host reports ("NTFS",
    /// "exFAT", ...). Empty or unrecognized labels map to `Other`.
    pub fn parse(label: &str) -> Option<FilesystemKind> {
        if label.trim().is_empty() {
            return None;
        }
        Some(match label.trim().to_ascii_uppercase().as_str() {
            "NTFS" => FilesystemKind::Ntfs,
            "FAT32" | "FAT" => FilesystemKind::Fat32,
            "EXFAT" => FilesystemKind::ExFat,
            _ => FilesystemKind::Other,
        })
    }

    pub fn is_ntfs(self) -> bool {
        matches!(self, FilesystemKind::Ntfs)
    }

    pub fn is_exfat(self) -> bool {
        matches!(self, FilesystemKind::ExFat)
    }
}

/// A recovery source or destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetEndpoint {
    /// A mounted volume such as `D:`. The filesystem is `None` when the
    /// host could not determine it.
    Volume {
        id: String,
        filesystem: Option<FilesystemKind>,
    },
    /// An arbitrary directory path.
    Directory { path: String },
}

impl TargetEndpoint {
    pub fn volume(id: impl Into<String>, filesystem: Option<FilesystemKind>) -> Self {
        TargetEndpoint::Volume {
            id: id.into(),
            filesystem,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        TargetEndpoint::Directory { path: path.into() }
    }

    /// The identity used for same-endpoint checks and worker arguments.
    pub fn identity(&self) -> &str {
        match self {
            TargetEndpoint::Volume { id, .. } => id,
            TargetEndpoint::Directory { path } => path,
        }
    }

    /// Filesystem kind when known; directories never report one.
    pub fn filesystem(&self) -> Option<FilesystemKind> {
        match self {
            TargetEndpoint::Volume { filesystem, .. } => *filesystem,
            TargetEndpoint::Directory { .. } => None,
        }
    }

    /// True for a bare drive-root identity such as `D:`.
    pub fn is_drive_root(&self) -> bool {
        let id = self.identity();
        id.len() == 2
            && id.ends_with(':')
            && id.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
    }
}

/// Display metadata for one mounted volume, as the host shell reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeInfo {
    /// Drive identity, e.g. "C:".
    pub id: String,
    /// Volume label, or a generic name when the label is empty.
    pub label: String,
    /// Filesystem label as reported ("NTFS", "exFAT", ...).
    pub fs: String,
    /// Total capacity in bytes.
    pub total_bytes: u64,
    /// Used space in bytes.
    pub used_bytes: u64,
    /// True for the operating system volume.
    pub is_system: bool,
}

impl VolumeInfo {
    pub fn endpoint(&self) -> TargetEndpoint {
        TargetEndpoint::volume(self.id.clone(), FilesystemKind::parse(&self.fs))
    }
}

/// Volume enumeration seam. The real implementation belongs to the host
/// shell; tests supply a fixed list.
pub trait VolumeCatalog: Send + Sync {
    fn list_volumes(&self) -> Vec<VolumeInfo>;
}
