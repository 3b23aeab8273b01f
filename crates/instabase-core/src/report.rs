//! Lint report schema (stable v1)
//!
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};
use crate::schema::Table;

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of tables recognized
    pub tables: usize,

    /// Number of declared columns across all tables
    pub columns: usize,

    /// Total number of diagnostics
    pub total: usize,

    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// Check report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (RFC 3339)
    pub timestamp: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// Recognized tables
    pub tables: Vec<Table>,

    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Build a report from a parse result
    pub fn new(tables: Vec<Table>, diagnostics: Vec<Diagnostic>) -> Self {
        let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();

        let summary = ReportSummary {
            tables: tables.len(),
            columns: tables.iter().map(|t| t.columns.len()).sum(),
            total: diagnostics.len(),
            errors: count(Severity::Error),
            warnings: count(Severity::Warn),
            info: count(Severity::Info),
        };

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
            tables,
            diagnostics,
        }
    }

    /// Whether any diagnostic reached error severity
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
