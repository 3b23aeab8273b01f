//! Diagnostic codes for the schema DSL
//!
//! Parsing never fails: anything the parser cannot use is dropped. The
//! diagnostics here explain those omissions after the fact.
//!
//! IMPORTANT: Diagnostic codes are stable. Never rename or remove a code,
//! only add new ones.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Line structure
    /// Body line without a colon
    DslLineMissingColon,

    /// Body line whose key or value is empty after trimming
    DslEmptyKeyOrValue,

    // Block structure
    /// Block without the `shape: sql_table` directive
    DslBlockNotTable,

    /// Block body containing a nested `{`
    DslNestedBlock,

    /// Block opened with `{` but never closed
    DslUnterminatedBlock,

    // Naming
    /// Table name already used by an earlier block
    DslDuplicateTable,

    /// Column name repeated inside one table
    DslDuplicateColumn,

    // Types
    /// Column type outside the configured allow-list
    DslUnknownType,

    // Whole input
    /// No table was recognized in the input
    DslNoTables,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DslLineMissingColon => "DSL_LINE_MISSING_COLON",
            Self::DslEmptyKeyOrValue => "DSL_EMPTY_KEY_OR_VALUE",
            Self::DslBlockNotTable => "DSL_BLOCK_NOT_TABLE",
            Self::DslNestedBlock => "DSL_NESTED_BLOCK",
            Self::DslUnterminatedBlock => "DSL_UNTERMINATED_BLOCK",
            Self::DslDuplicateTable => "DSL_DUPLICATE_TABLE",
            Self::DslDuplicateColumn => "DSL_DUPLICATE_COLUMN",
            Self::DslUnknownType => "DSL_UNKNOWN_TYPE",
            Self::DslNoTables => "DSL_NO_TABLES",
        }
    }

    /// Severity used when no override is configured
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::DslLineMissingColon
            | Self::DslEmptyKeyOrValue
            | Self::DslNestedBlock
            | Self::DslUnterminatedBlock
            | Self::DslDuplicateTable => Severity::Warn,
            Self::DslBlockNotTable
            | Self::DslDuplicateColumn
            | Self::DslUnknownType
            | Self::DslNoTables => Severity::Info,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - input was partially ignored
    Warn,

    /// Error - only reachable through severity overrides
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Position in the DSL source (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Line-start table for turning byte offsets into [`Location`]s
///
/// Built in one pass over the text; each lookup is a binary search. Columns
/// count characters, so lines containing non-ASCII text are walked from
/// their start.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    /// Byte offset where each line starts, and whether the line is ASCII
    lines: Vec<(usize, bool)>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;

        for line in text.split('\n') {
            lines.push((start, line.is_ascii()));
            start += line.len() + 1;
        }

        Self { text, lines }
    }

    /// Location of a byte offset; offsets past the end clamp to the end
    pub fn location(&self, offset: usize) -> Location {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = self.lines.partition_point(|(start, _)| *start <= offset).max(1);
        let (start, ascii) = self.lines[line - 1];
        let column = if ascii {
            offset - start + 1
        } else {
            self.text[start..offset].chars().count() + 1
        };

        Location { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Source location (best-effort)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Block the diagnostic belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with the code's default severity
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            location: None,
            block: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the owning block
    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into());
        self
    }

    /// Override the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        assert_eq!(DiagnosticCode::DslLineMissingColon.as_str(), "DSL_LINE_MISSING_COLON");
        assert_eq!(DiagnosticCode::DslBlockNotTable.as_str(), "DSL_BLOCK_NOT_TABLE");
        assert_eq!(DiagnosticCode::DslNoTables.to_string(), "DSL_NO_TABLES");
    }

    #[test]
    fn serde_name_matches_as_str() {
        let json = serde_json::to_string(&DiagnosticCode::DslDuplicateTable).unwrap();
        assert_eq!(json, format!("\"{}\"", DiagnosticCode::DslDuplicateTable.as_str()));
    }

    #[test]
    fn line_index_locations() {
        let text = "Users: {\n  shape: sql_table\n  id\n}";
        let index = LineIndex::new(text);
        let offset = text.find("id").unwrap();

        assert_eq!(index.location(offset), Location::new(3, 3));
        assert_eq!(index.location(0), Location::new(1, 1));
        assert_eq!(index.location(text.find('}').unwrap()), Location::new(4, 1));
        assert_eq!(index.location(10_000), Location::new(4, 2));
    }

    #[test]
    fn line_index_newline_belongs_to_its_line() {
        let text = "ab\ncd";
        let index = LineIndex::new(text);

        assert_eq!(index.location(2), Location::new(1, 3));
        assert_eq!(index.location(3), Location::new(2, 1));
    }

    #[test]
    fn line_index_counts_characters() {
        let text = "ok\nÜnïcode: {";
        let index = LineIndex::new(text);
        let offset = text.find('{').unwrap();

        assert_eq!(index.location(offset), Location::new(2, 10));
        // Inside a multi-byte character: snaps back to its start
        assert_eq!(index.location(4), Location::new(2, 1));
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(DiagnosticCode::DslLineMissingColon, "Line has no colon")
            .with_location(Location::new(3, 3))
            .with_block("Users");

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("DSL_LINE_MISSING_COLON"));
        assert!(json.contains("warn"));
        assert!(json.contains("Users"));
    }
}
