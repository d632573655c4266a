//! Worker argument construction.
//!
//! Translates a [`JobDescriptor`] into the winfr argument vector. The flag
//! layout follows the winfr manual: positional source and destination, one
//! mode switch, one switch per enabled option, then filter arguments.

use crate::filters::FilterToken;
use crate::job::{JobDescriptor, ScanMode};

/// Build the full argument vector for one worker invocation.
pub fn worker_args(job: &JobDescriptor) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    args.push(job.source.identity().to_string());

    // winfr requires a trailing separator on the destination.
    let mut dest = job.destination.clone();
    if !dest.ends_with('\\') && !dest.ends_with('/') {
        dest.push('\\');
    }
    args.push(dest);

    // Modes are mutually exclusive; segment (/r) and signature (/x) are
    // deep scans that run on top of /extensive.
    if job.options.signature_mode {
        args.push("/extensive".to_string());
        args.push("/x".to_string());
    } else if job.options.segment_mode {
        args.push("/extensive".to_string());
        args.push("/r".to_string());
    } else if job.mode == ScanMode::Extensive {
        args.push("/extensive".to_string());
    } else {
        args.push("/regular".to_string());
    }

    if job.options.auto_accept {
        args.push("/a".to_string());
    }

    if job.options.keep_both && !job.options.signature_mode {
        // /o:b is known to crash winfr on exFAT volumes, and is strictly
        // incompatible with /x.
        let is_exfat = job
            .source
            .filesystem()
            .is_some_and(|fs| fs.is_exfat());
        if !is_exfat {
            args.push("/o:b".to_string());
        }
    }

    if job.options.recover_non_deleted {
        args.push("/u".to_string());
    }
    if job.options.recover_system_files {
        args.push("/k".to_string());
    }
    if job.options.keep_all_extensions {
        args.push("/e".to_string());
    }
    if job.options.verbose_mode && !job.options.signature_mode {
        // /v is documented as incompatible with /x in some winfr versions.
        args.push("/v".to_string());
    }

    if job.options.signature_mode {
        push_signature_filters(job, &mut args);
    } else {
        push_name_filters(job, &mut args);
    }

    args
}

/// Signature mode uses /y: file-type groups; free-form tokens are omitted.
fn push_signature_filters(job: &JobDescriptor, args: &mut Vec<String>) {
    let mut groups: Vec<&str> = Vec::new();
    for token in job.filters.tokens() {
        if let FilterToken::Preset(preset) = token {
            groups.extend(preset.signature_groups());
        }
    }

    if !groups.is_empty() {
        groups.sort_unstable();
        groups.dedup();
        args.push(format!("/y:{}", groups.join(",")));
    }
}

/// Regular/extensive/segment scans take /n filters; presets expand to
/// their extension glob tables.
fn push_name_filters(job: &JobDescriptor, args: &mut Vec<String>) {
    for token in job.filters.tokens() {
        match token {
            FilterToken::Preset(preset) => {
                for glob in preset.extension_globs() {
                    args.push("/n".to_string());
                    args.push((*glob).to_string());
                }
            }
            FilterToken::Pattern(pattern) => {
                args.push("/n".to_string());
                args.push(pattern.clone());
            }
        }
    }
}
