//! Client-side checks for imaging attachments before they are sent.

use serde::{Deserialize, Serialize};

use hmis_core::{DomainError, DomainResult};

pub const DEFAULT_MAX_SIZE_MB: u64 = 50;

pub const DEFAULT_ACCEPTED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCandidate {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default)]
    pub description: String,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Accepted types and size limit of an upload zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRules {
    accepted_types: Vec<String>,
    max_size_mb: u64,
}

impl Default for UploadRules {
    fn default() -> Self {
        Self {
            accepted_types: DEFAULT_ACCEPTED_TYPES.iter().map(|t| t.to_string()).collect(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
        }
    }
}

impl UploadRules {
    pub fn new(accepted_types: impl IntoIterator<Item = impl Into<String>>, max_size_mb: u64) -> Self {
        Self {
            accepted_types: accepted_types.into_iter().map(Into::into).collect(),
            max_size_mb,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }

    /// Type is checked before size; the first failure is reported.
    pub fn validate(&self, file: &UploadCandidate) -> DomainResult<()> {
        if !self.accepted_types.iter().any(|t| *t == file.mime_type) {
            return Err(DomainError::validation(format!(
                "Invalid file type. Accepted: {}",
                self.accepted_labels()
            )));
        }

        if file.size > self.max_size_bytes() {
            return Err(DomainError::validation(format!(
                "File too large. Maximum size: {}MB",
                self.max_size_mb
            )));
        }

        Ok(())
    }

    /// `"JPEG, PNG, PDF"`: subtype of each accepted MIME type, upper-cased.
    fn accepted_labels(&self) -> String {
        self.accepted_types
            .iter()
            .map(|t| t.split('/').nth(1).unwrap_or(t).to_uppercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Human-readable size in 1024 steps, at most two decimals, trailing zeros
/// dropped: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    // Halves round up; `{:.2}` alone would round 1.125 to even.
    let rounded = format!("{:.2}", (value * 100.0).round() / 100.0);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
