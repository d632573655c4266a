//! Job compilation: user selections into one immutable descriptor.

use serde::{Deserialize, Serialize};

use crate::endpoint::TargetEndpoint;
use crate::error::ConfigError;
use crate::filters::FilterSet;
use crate::options::RecoveryOptions;

/// Subdirectory appended when the destination is a bare drive root, so the
/// worker never writes into the root of a volume.
pub const DRIVE_ROOT_SUBDIR: &str = "WinfrRecovery";

/// Scan depth requested by the user.
///
/// `Regular` only works against NTFS; compilation forces `Extensive` for
/// any source with a known non-NTFS filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Regular,
    Extensive,
}

impl ScanMode {
    pub fn parse(label: &str) -> ScanMode {
        if label.eq_ignore_ascii_case("extensive") {
            ScanMode::Extensive
        } else {
            ScanMode::Regular
        }
    }
}

/// Fully resolved configuration for one recovery run.
///
/// Produced once at job submission and never mutated afterwards; the
/// process supervisor owns it for the job's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub source: TargetEndpoint,
    /// Normalized destination path (drive roots already extended with
    /// [`DRIVE_ROOT_SUBDIR`]).
    pub destination: String,
    pub mode: ScanMode,
    pub options: RecoveryOptions,
    pub filters: FilterSet,
}

impl JobDescriptor {
    /// Filter tokens a signature-mode invocation will drop. Recorded here
    /// so the supervisor can warn before spawning.
    pub fn ignored_filters(&self) -> Vec<String> {
        if !self.options.signature_mode {
            return Vec::new();
        }
        self.filters
            .signature_incompatible()
            .map(|token| token.as_str().to_string())
            .collect()
    }
}

/// Compile user selections into a [`JobDescriptor`].
///
/// Pure transformation: the same inputs always produce the same descriptor.
pub fn compile(
    source: Option<&TargetEndpoint>,
    destination: Option<&TargetEndpoint>,
    mode: ScanMode,
    options: RecoveryOptions,
    filters: &FilterSet,
) -> Result<JobDescriptor, ConfigError> {
    let source = source.ok_or(ConfigError::MissingSource)?;
    let destination = destination.ok_or(ConfigError::MissingDestination)?;

    if source.identity() == destination.identity() {
        return Err(ConfigError::SameEndpoint(source.identity().to_string()));
    }

    let dest_path = if destination.is_drive_root() {
        format!("{}\\{}", destination.identity(), DRIVE_ROOT_SUBDIR)
    } else {
        destination.identity().to_string()
    };

    // Regular mode is meaningless off NTFS; an unknown filesystem is given
    // the benefit of the doubt.
    let mode = match source.filesystem() {
        Some(fs) if !fs.is_ntfs() => ScanMode::Extensive,
        _ => mode,
    };

    Ok(JobDescriptor {
        source: source.clone(),
        destination: dest_path,
        mode,
        options,
        filters: filters.clone(),
    })
}
