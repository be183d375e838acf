//! Structured radiology report stored as a single `result_notes` string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use hmis_core::ValueObject;

static FINDINGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*FINDINGS:\*\*\n([\s\S]*?)(?:\n\n\*\*IMPRESSION:|$)")
        .expect("findings pattern is valid")
});

static IMPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*IMPRESSION:\*\*\n([\s\S]*?)$")
        .expect("impression pattern is valid")
});

/// Findings and impression of an imaging study.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiologyReport {
    pub findings: String,
    pub impression: String,
}

impl ValueObject for RadiologyReport {}

impl RadiologyReport {
    pub fn new(findings: impl Into<String>, impression: impl Into<String>) -> Self {
        Self {
            findings: findings.into(),
            impression: impression.into(),
        }
    }

    /// A report can be submitted once either section has content.
    pub fn is_blank(&self) -> bool {
        self.findings.trim().is_empty() && self.impression.trim().is_empty()
    }

    /// `result_notes` text sent to the server.
    pub fn compose(&self) -> String {
        format!(
            "**FINDINGS:**\n{}\n\n**IMPRESSION:**\n{}",
            self.findings, self.impression
        )
    }

    /// Split stored notes back into sections.
    ///
    /// Each section is trimmed; a section that is absent or empty comes back
    /// as `None`. Notes not written by [`compose`](Self::compose) yield
    /// `(None, None)`.
    pub fn parse(notes: &str) -> ParsedReport {
        let section = |re: &Regex| {
            re.captures(notes)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        ParsedReport {
            findings: section(&FINDINGS),
            impression: section(&IMPRESSION),
        }
    }
}

/// Sections recovered from free-form notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedReport {
    pub findings: Option<String>,
    pub impression: Option<String>,
}

impl ParsedReport {
    /// Prefill for the report editor; missing sections become empty text.
    pub fn into_report(self) -> RadiologyReport {
        RadiologyReport {
            findings: self.findings.unwrap_or_default(),
            impression: self.impression.unwrap_or_default(),
        }
    }
}
