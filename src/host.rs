//! Host shell integration: volume enumeration, file manager reveal and
//! drive health checks.
//!
//! Everything here touches the operating system, so it sits behind traits
//! the orchestrator consumes; tests substitute fixed catalogs and recording
//! hosts.

use std::process::Command;

use tracing::debug;

use crate::endpoint::{VolumeCatalog, VolumeInfo};
use crate::error::{Result, SupervisorError};

/// Shell actions the orchestrator delegates to the host.
pub trait HostServices: Send + Sync {
    /// Open the platform file manager at `path`.
    fn reveal(&self, path: &str) -> Result<()>;

    /// Run a read-only health check against a drive and return its report.
    fn check_health(&self, drive: &str) -> Result<String>;
}

/// The real host: `explorer`/`xdg-open` for reveal, `chkdsk` for health.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostServices for SystemHost {
    fn reveal(&self, path: &str) -> Result<()> {
        debug!(%path, "revealing path");
        let program = if cfg!(windows) { "explorer" } else { "xdg-open" };
        Command::new(program)
            .arg(path)
            .spawn()
            .map_err(|err| SupervisorError::Host(err.to_string()))?;
        Ok(())
    }

    fn check_health(&self, drive: &str) -> Result<String> {
        // chkdsk wants the colon-terminated drive form.
        let mut target = drive.to_string();
        if !target.ends_with(':') {
            target.push(':');
        }

        let mut command = Command::new("chkdsk");
        command.arg(&target);
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(0x08000000); // CREATE_NO_WINDOW
        }

        let output = command
            .output()
            .map_err(|err| SupervisorError::Host(err.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stderr.is_empty() && output.status.code() != Some(0) {
            return Err(SupervisorError::Host(stderr));
        }
        Ok(stdout)
    }
}

/// Live volume catalog backed by the system disk list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemVolumeCatalog;

impl VolumeCatalog for SystemVolumeCatalog {
    fn list_volumes(&self) -> Vec<VolumeInfo> {
        let disks = sysinfo::Disks::new_with_refreshed_list();
        let mut volumes: Vec<VolumeInfo> = Vec::new();

        for disk in disks.list() {
            let mount = disk.mount_point().to_string_lossy().into_owned();
            let first = match mount.chars().next() {
                Some(c) if c.is_ascii_alphabetic() => c,
                _ => continue,
            };

            let id = format!("{}:", first.to_ascii_uppercase());
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());

            let label = {
                let name = disk.name().to_string_lossy().into_owned();
                if name.is_empty() {
                    "Local Disk".to_string()
                } else {
                    name
                }
            };

            volumes.push(VolumeInfo {
                id: id.clone(),
                label,
                fs: disk.file_system().to_string_lossy().into_owned(),
                total_bytes: total,
                used_bytes: used,
                // The OS volume is the one winfr refuses as a destination
                // default; C: by convention.
                is_system: id == "C:",
            });
        }

        // System drive first, then by letter.
        volumes.sort_by(|a, b| b.is_system.cmp(&a.is_system).then_with(|| a.id.cmp(&b.id)));
        volumes
    }
}
