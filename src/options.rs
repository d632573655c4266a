//! Recovery option toggles and the compatibility rules between them.
//!
//! winfr treats several of its switches as mutually exclusive: segment
//! scans (/r) and signature scans (/x) cannot run together, and /x refuses
//! /o:b and /v. Options are only ever mutated through [`RecoveryOptions::apply`]
//! so every stored set is consistent by construction.

use serde::{Deserialize, Serialize};

/// The independent boolean switches a job can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecoveryOptions {
    /// Segment scan (/r): reads remaining file record segments. NTFS only.
    pub segment_mode: bool,
    /// Signature scan (/x): header-based carving for FAT/exFAT media.
    pub signature_mode: bool,
    /// Recover non-deleted but inaccessible files (/u).
    pub recover_non_deleted: bool,
    /// Rename on collision instead of overwriting (/o:b).
    pub keep_both: bool,
    /// Auto-accept interactive prompts (/a).
    pub auto_accept: bool,
    /// Attempt recovery of system files (/k).
    pub recover_system_files: bool,
    /// Disable the default extension exclusion list (/e).
    pub keep_all_extensions: bool,
    /// Sector-by-sector logging (/v); needed for accurate progress.
    pub verbose_mode: bool,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self {
            segment_mode: false,
            signature_mode: false,
            recover_non_deleted: false,
            keep_both: true,
            auto_accept: true,
            recover_system_files: false,
            keep_all_extensions: false,
            verbose_mode: true,
        }
    }
}

/// A single toggle request against one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionChange {
    SegmentMode(bool),
    SignatureMode(bool),
    RecoverNonDeleted(bool),
    KeepBoth(bool),
    AutoAccept(bool),
    RecoverSystemFiles(bool),
    KeepAllExtensions(bool),
    VerboseMode(bool),
}

/// Result of applying a change: the normalized set plus an optional
/// human-readable notice naming the options that were switched off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionOutcome {
    pub options: RecoveryOptions,
    pub notice: Option<String>,
}

impl RecoveryOptions {
    /// Apply one toggle and narrow the result toward a consistent set.
    ///
    /// Pure: returns the new set, never rejects. The notice is display-only.
    pub fn apply(self, change: OptionChange) -> OptionOutcome {
        let mut next = self;
        let mut disabled: Vec<&str> = Vec::new();
        let mut mode_label: Option<&str> = None;

        match change {
            OptionChange::SegmentMode(value) => {
                next.segment_mode = value;
                if value && next.signature_mode {
                    next.signature_mode = false;
                    disabled.push("Signature");
                    mode_label = Some("Segment");
                }
            }
            OptionChange::SignatureMode(value) => {
                next.signature_mode = value;
                if value {
                    if next.segment_mode {
                        next.segment_mode = false;
                        disabled.push("Segment");
                    }
                    if next.keep_both {
                        next.keep_both = false;
                        disabled.push("Keep Both");
                    }
                    if next.verbose_mode {
                        next.verbose_mode = false;
                        disabled.push("Verbose");
                    }
                    if !disabled.is_empty() {
                        mode_label = Some("Signature");
                    }
                }
            }
            OptionChange::RecoverNonDeleted(value) => next.recover_non_deleted = value,
            OptionChange::KeepBoth(value) => next.keep_both = value,
            OptionChange::AutoAccept(value) => next.auto_accept = value,
            OptionChange::RecoverSystemFiles(value) => next.recover_system_files = value,
            OptionChange::KeepAllExtensions(value) => next.keep_all_extensions = value,
            OptionChange::VerboseMode(value) => next.verbose_mode = value,
        }

        let notice = mode_label.map(|mode| {
            let list = disabled
                .iter()
                .map(|name| format!("{} disabled", name))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Switched to {} mode ({})", mode, list)
        });

        OptionOutcome { options: next, notice }
    }

    /// Defaults recommended when the source filesystem is known.
    ///
    /// NTFS sources favor segment scans; anything else only works with
    /// signature scans, which in turn force keep-both and verbose off.
    pub fn recommended_for_fs(self, is_ntfs: bool) -> RecoveryOptions {
        if is_ntfs {
            self.apply(OptionChange::SegmentMode(true)).options
        } else {
            self.apply(OptionChange::SignatureMode(true)).options
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_disables_conflicts() {
        let options = RecoveryOptions {
            segment_mode: true,
            keep_both: true,
            verbose_mode: true,
            ..RecoveryOptions::default()
        };

        let outcome = options.apply(OptionChange::SignatureMode(true));
        assert!(outcome.options.signature_mode);
        assert!(!outcome.options.segment_mode);
        assert!(!outcome.options.keep_both);
        assert!(!outcome.options.verbose_mode);

        let notice = outcome.notice.unwrap();
        assert!(notice.contains("Segment disabled"));
        assert!(notice.contains("Keep Both disabled"));
        assert!(notice.contains("Verbose disabled"));
    }

    #[test]
    fn test_segment_disables_signature() {
        let options = RecoveryOptions {
            signature_mode: true,
            keep_both: false,
            verbose_mode: false,
            ..RecoveryOptions::default()
        };

        let outcome = options.apply(OptionChange::SegmentMode(true));
        assert!(outcome.options.segment_mode);
        assert!(!outcome.options.signature_mode);
        assert_eq!(
            outcome.notice.as_deref(),
            Some("Switched to Segment mode (Signature disabled)")
        );
    }

    #[test]
    fn test_unconflicted_toggle_is_passthrough() {
        let options = RecoveryOptions::default();
        let outcome = options.apply(OptionChange::RecoverSystemFiles(true));
        assert!(outcome.options.recover_system_files);
        assert!(outcome.notice.is_none());

        let expected = RecoveryOptions {
            recover_system_files: true,
            ..options
        };
        assert_eq!(outcome.options, expected);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let start = RecoveryOptions {
            segment_mode: true,
            keep_both: true,
            verbose_mode: true,
            ..RecoveryOptions::default()
        };

        let first = start.apply(OptionChange::SignatureMode(true));
        let second = first.options.apply(OptionChange::SignatureMode(true));
        assert_eq!(first.options, second.options);
        assert!(second.notice.is_none());
    }

    #[test]
    fn test_system_files_independent_of_signature() {
        // /k and /e have no documented conflict with /x; they survive the switch.
        let options = RecoveryOptions {
            recover_system_files: true,
            keep_all_extensions: true,
            ..RecoveryOptions::default()
        };
        let outcome = options.apply(OptionChange::SignatureMode(true));
        assert!(outcome.options.recover_system_files);
        assert!(outcome.options.keep_all_extensions);
    }

    #[test]
    fn test_recommended_defaults() {
        let ntfs = RecoveryOptions::default().recommended_for_fs(true);
        assert!(ntfs.segment_mode);
        assert!(!ntfs.signature_mode);

        let exfat = RecoveryOptions::default().recommended_for_fs(false);
        assert!(exfat.signature_mode);
        assert!(!exfat.segment_mode);
        assert!(!exfat.keep_both);
        assert!(!exfat.verbose_mode);
    }
}
