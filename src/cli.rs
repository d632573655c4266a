use clap::Parser;

use crate::options::RecoveryOptions;
use crate::orchestrator::RecoveryRequest;

/// winfr-bridge - orchestration front end for Windows File Recovery
#[derive(Parser, Debug, Clone)]
#[command(name = "winfr-bridge")]
#[command(version = "0.1.0")]
#[command(about = "Supervised recovery runs over the winfr command-line engine", long_about = None)]
pub struct Args {
    /// Source volume to scan (e.g. "E:")
    #[arg(value_name = "SOURCE", default_value = "")]
    pub source: String,

    /// Destination directory for recovered files
    #[arg(value_name = "DEST", default_value = "")]
    pub destination: String,

    /// Scan mode: regular or extensive
    #[arg(long = "mode", default_value = "regular")]
    pub mode: String,

    /// File filter: a preset (Images, Documents, Videos, Audio, Archives),
    /// an extension (".docx") or a glob ("*invoice*"); repeatable
    #[arg(short = 'n', long = "filter", value_name = "FILTER")]
    pub filters: Vec<String>,

    /// Segment scan: parse NTFS record segments (implies extensive)
    #[arg(long = "segment")]
    pub segment: bool,

    /// Signature scan: recover by file-type signature (implies extensive)
    #[arg(long = "signature")]
    pub signature: bool,

    /// Also recover files that were never deleted
    #[arg(long = "non-deleted")]
    pub non_deleted: bool,

    /// Overwrite conflicting files instead of keeping both copies
    #[arg(long = "no-keep-both")]
    pub no_keep_both: bool,

    /// Let the worker prompt instead of auto-accepting
    #[arg(long = "no-auto-accept")]
    pub no_auto_accept: bool,

    /// Include system files in the recovery
    #[arg(long = "system-files")]
    pub system_files: bool,

    /// Keep all file extensions, including unrecognized ones
    #[arg(long = "all-extensions")]
    pub all_extensions: bool,

    /// Disable verbose worker output
    #[arg(long = "quiet-worker")]
    pub quiet_worker: bool,

    /// Filesystem of the source, when known (NTFS, FAT32, exFAT)
    #[arg(long = "source-fs", value_name = "FS")]
    pub source_fs: Option<String>,

    /// List mounted volumes and exit
    #[arg(long = "list-volumes")]
    pub list_volumes: bool,

    /// Worker binary to run
    #[arg(long = "worker", default_value = "winfr")]
    pub worker: String,
}

impl Args {
    /// Validate the arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.list_volumes {
            return Ok(());
        }

        if self.source.trim().is_empty() {
            return Err("SOURCE is required (e.g. \"E:\")".to_string());
        }
        if self.destination.trim().is_empty() {
            return Err("DEST is required".to_string());
        }
        if self.segment && self.signature {
            return Err("--segment and --signature are mutually exclusive".to_string());
        }
        match self.mode.to_lowercase().as_str() {
            "regular" | "extensive" => Ok(()),
            other => Err(format!(
                "unknown mode `{}` (expected regular or extensive)",
                other
            )),
        }
    }

    /// Build the recovery request this invocation describes.
    pub fn to_request(&self) -> RecoveryRequest {
        let defaults = RecoveryOptions::default();
        RecoveryRequest {
            source: self.source.clone(),
            destination: self.destination.clone(),
            mode: self.mode.to_lowercase(),
            filters: self.filters.clone(),
            segment_mode: self.segment,
            signature_mode: self.signature,
            recover_non_deleted: self.non_deleted,
            keep_both: defaults.keep_both && !self.no_keep_both && !self.signature,
            auto_accept: defaults.auto_accept && !self.no_auto_accept,
            recover_system_files: self.system_files,
            keep_all_extensions: self.all_extensions,
            source_fs: self.source_fs.clone(),
            verbose_mode: defaults.verbose_mode && !self.quiet_worker && !self.signature,
        }
    }
}
