//! Filter tokens narrowing which files the worker recovers.
//!
//! A token is either a named preset (a curated category such as "Images")
//! or a free-form pattern: an extension glob (`*.png`), a directory
//! fragment (`\docs\`), or a name wildcard (`*invoice*`). Signature scans
//! only understand preset categories; free-form tokens are carried in the
//! descriptor but omitted from the invocation when signature mode is on.

use serde::{Deserialize, Serialize};

/// Curated file-type categories offered as quick filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterPreset {
    Images,
    Documents,
    Videos,
    Audio,
    Archives,
}

impl FilterPreset {
    pub fn parse(token: &str) -> Option<FilterPreset> {
        match token {
            "Images" => Some(FilterPreset::Images),
            "Documents" => Some(FilterPreset::Documents),
            "Videos" => Some(FilterPreset::Videos),
            "Audio" => Some(FilterPreset::Audio),
            "Archives" => Some(FilterPreset::Archives),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterPreset::Images => "Images",
            FilterPreset::Documents => "Documents",
            FilterPreset::Videos => "Videos",
            FilterPreset::Audio => "Audio",
            FilterPreset::Archives => "Archives",
        }
    }

    /// Extension globs this preset expands to for /n filtering.
    pub fn extension_globs(self) -> &'static [&'static str] {
        match self {
            FilterPreset::Images => &[
                "*.jpg", "*.jpeg", "*.png", "*.gif", "*.bmp", "*.webp", "*.heic", "*.raw",
            ],
            FilterPreset::Documents => &[
                "*.pdf", "*.doc", "*.docx", "*.xls", "*.xlsx", "*.ppt", "*.pptx", "*.txt",
                "*.rtf", "*.odt", "*.csv",
            ],
            FilterPreset::Videos => &[
                "*.mp4", "*.avi", "*.mkv", "*.mov", "*.wmv", "*.flv", "*.webm", "*.m4v",
            ],
            FilterPreset::Audio => &["*.mp3", "*.wav", "*.flac", "*.aac", "*.ogg", "*.wma", "*.m4a"],
            FilterPreset::Archives => &["*.zip", "*.rar", "*.7z", "*.tar", "*.gz", "*.bz2", "*.iso"],
        }
    }

    /// Signature-mode (/y:) group names this preset resolves to.
    pub fn signature_groups(self) -> &'static [&'static str] {
        match self {
            FilterPreset::Images => &["JPEG", "PNG"],
            FilterPreset::Documents => &["PDF", "ZIP"],
            FilterPreset::Videos => &["MPEG"],
            FilterPreset::Audio => &["MP3", "ASF"],
            FilterPreset::Archives => &["ZIP"],
        }
    }
}

/// One inclusion rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterToken {
    Preset(FilterPreset),
    Pattern(String),
}

impl FilterToken {
    /// Normalize a raw token: recognized preset names become presets, bare
    /// extensions (".png") become globs ("*.png"), everything else passes
    /// through trimmed.
    pub fn normalize(raw: &str) -> Option<FilterToken> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(preset) = FilterPreset::parse(trimmed) {
            return Some(FilterToken::Preset(preset));
        }
        let pattern = if trimmed.starts_with('.') && trimmed.len() > 1 {
            format!("*{}", trimmed)
        } else {
            trimmed.to_string()
        };
        Some(FilterToken::Pattern(pattern))
    }

    /// True when the token survives a signature-mode invocation.
    pub fn usable_in_signature_mode(&self) -> bool {
        matches!(self, FilterToken::Preset(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            FilterToken::Preset(preset) => preset.name(),
            FilterToken::Pattern(pattern) => pattern,
        }
    }
}

/// Ordered, deduplicated set of filter tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    tokens: Vec<FilterToken>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and collect raw tokens, preserving first-seen order.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = FilterSet::new();
        for token in raw {
            set.insert_raw(token.as_ref());
        }
        set
    }

    /// Insert a raw token; duplicates (after normalization) are ignored.
    /// Returns true when the token was added.
    pub fn insert_raw(&mut self, raw: &str) -> bool {
        match FilterToken::normalize(raw) {
            Some(token) if !self.tokens.contains(&token) => {
                self.tokens.push(token);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, raw: &str) {
        if let Some(token) = FilterToken::normalize(raw) {
            self.tokens.retain(|existing| *existing != token);
        }
    }

    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Tokens a signature-mode invocation would ignore.
    pub fn signature_incompatible(&self) -> impl Iterator<Item = &FilterToken> {
        self.tokens
            .iter()
            .filter(|token| !token.usable_in_signature_mode())
    }
}
