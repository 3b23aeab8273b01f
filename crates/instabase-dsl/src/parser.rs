//! Schema DSL parser
//!
//! Turns block-structured text into [`Table`] records. Parsing is total:
//! lines and blocks that cannot be used are dropped, never reported as
//! errors. [`SchemaParser::parse_with_diagnostics`] additionally explains
//! every omission.

use instabase_core::{
    Column, Config, Diagnostic, DiagnosticCode, DuplicateTablePolicy, LineIndex, Location,
    ScanMode, Severity, SeverityThreshold, Table,
};
use std::collections::{HashMap, HashSet};
use crate::scanner::{BlockScanner, RawBlock};

/// Key of the line that marks a block as a relational table
pub const DIRECTIVE_KEY: &str = "shape";

/// Value of the line that marks a block as a relational table
pub const DIRECTIVE_VALUE: &str = "sql_table";

/// Tables plus the diagnostics explaining what was dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub tables: Vec<Table>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Classification of one logical body line
#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyLine {
    Directive,
    Column(Column),
    MissingColon,
    EmptyKeyOrValue,
}

impl BodyLine {
    /// Split on every colon: the first segment is the key, the rest is
    /// re-joined with `:` as the value. Segments are trimmed individually.
    fn classify(line: &str) -> Self {
        let parts: Vec<&str> = line.split(':').map(str::trim).collect();
        if parts.len() < 2 {
            return Self::MissingColon;
        }

        let key = parts[0];
        let value = parts[1..].join(":");
        let value = value.trim();

        if key == DIRECTIVE_KEY && value == DIRECTIVE_VALUE {
            Self::Directive
        } else if key.is_empty() || value.is_empty() {
            Self::EmptyKeyOrValue
        } else {
            Self::Column(Column::new(key, value))
        }
    }
}

/// A table found in the source, with the byte offset of its name
struct FoundTable {
    table: Table,
    name_offset: usize,
}

/// Schema DSL parser
///
/// Holds only immutable settings; one instance can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct SchemaParser {
    scanner: BlockScanner,
    duplicate_tables: DuplicateTablePolicy,
    allowed_types: HashSet<String>,
    severity: SeverityThreshold,
}

impl SchemaParser {
    /// Parser with the default settings (flat scanning, keep duplicates)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser from the `[parser]` and `[severity]` config sections
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_scan_mode(config.parser.scan_mode)
            .with_duplicate_policy(config.parser.duplicate_tables)
            .with_allowed_types(config.parser.allowed_types.iter().map(String::as_str))
            .with_severity(config.severity.clone())
    }

    pub fn with_scan_mode(mut self, mode: ScanMode) -> Self {
        self.scanner = BlockScanner::new(mode);
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicateTablePolicy) -> Self {
        self.duplicate_tables = policy;
        self
    }

    /// Restrict the type lint to these tokens (case-insensitive)
    pub fn with_allowed_types<'a>(mut self, types: impl IntoIterator<Item = &'a str>) -> Self {
        self.allowed_types = types.into_iter().map(|t| t.trim().to_lowercase()).collect();
        self
    }

    pub fn with_severity(mut self, severity: SeverityThreshold) -> Self {
        self.severity = severity;
        self
    }

    /// Extract the tables declared in `text`
    ///
    /// Skips all diagnostic work; use [`Self::parse_with_diagnostics`] to
    /// learn what was dropped.
    pub fn parse(&self, text: &str) -> Vec<Table> {
        self.run(text, None).tables
    }

    /// Extract the tables declared in `text` and explain what was skipped
    pub fn parse_with_diagnostics(&self, text: &str) -> ParseOutcome {
        let index = LineIndex::new(text);
        self.run(text, Some(&index))
    }

    /// Shared pipeline; diagnostics are produced only when `index` is given
    fn run(&self, text: &str, index: Option<&LineIndex<'_>>) -> ParseOutcome {
        let scan = self.scanner.scan(text);
        let mut diagnostics: Vec<Diagnostic> = match index {
            Some(index) => scan.issues.iter().map(|issue| issue.to_diagnostic(index)).collect(),
            None => Vec::new(),
        };
        let mut found = Vec::with_capacity(scan.blocks.len());

        for block in &scan.blocks {
            if let Some(table) = self.parse_block(block, index, &mut diagnostics) {
                found.push(FoundTable {
                    table,
                    name_offset: block.name_offset,
                });
            }
        }

        let tables = self.resolve_duplicates(found, index, &mut diagnostics);

        if tables.is_empty() && index.is_some() {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::DslNoTables,
                format!("No valid tables found. Use {DIRECTIVE_KEY}: {DIRECTIVE_VALUE}"),
            ));
        }

        for diag in &mut diagnostics {
            if let Some(severity) = self.severity.override_for(diag.code) {
                diag.severity = severity;
            }
        }

        tracing::debug!(
            scan_mode = ?self.scanner.mode(),
            blocks = scan.blocks.len(),
            tables = tables.len(),
            diagnostics = diagnostics.len(),
            "parsed schema DSL"
        );

        ParseOutcome { tables, diagnostics }
    }

    /// Interpret one block body; `None` when the directive is missing
    fn parse_block(
        &self,
        block: &RawBlock<'_>,
        index: Option<&LineIndex<'_>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Table> {
        let mut is_table = false;
        let mut columns: Vec<Column> = Vec::new();
        let mut block_diags = Vec::new();
        let mut seen = HashSet::new();

        for (offset, line) in logical_lines(block.body) {
            match (BodyLine::classify(line), index) {
                (BodyLine::Directive, _) => is_table = true,
                (BodyLine::Column(column), None) => columns.push(column),
                (BodyLine::Column(column), Some(index)) => {
                    let location = index.location(block.body_offset + offset);
                    if !seen.insert(column.name.clone()) {
                        block_diags.push(
                            Diagnostic::new(
                                DiagnosticCode::DslDuplicateColumn,
                                format!("Column '{}' is declared more than once", column.name),
                            )
                            .with_location(location)
                            .with_block(block.name),
                        );
                    }
                    if let Some(diag) = self.check_type(&column, block.name, location) {
                        block_diags.push(diag);
                    }
                    columns.push(column);
                }
                (BodyLine::MissingColon, index) => {
                    tracing::trace!(block = block.name, line, "skipping line without colon");
                    if let Some(index) = index {
                        block_diags.push(
                            Diagnostic::new(
                                DiagnosticCode::DslLineMissingColon,
                                format!("Line '{line}' has no ':' and was ignored"),
                            )
                            .with_location(index.location(block.body_offset + offset))
                            .with_block(block.name),
                        );
                    }
                }
                (BodyLine::EmptyKeyOrValue, index) => {
                    tracing::trace!(block = block.name, line, "skipping line with empty key or value");
                    if let Some(index) = index {
                        block_diags.push(
                            Diagnostic::new(
                                DiagnosticCode::DslEmptyKeyOrValue,
                                format!("Line '{line}' has an empty key or value and was ignored"),
                            )
                            .with_location(index.location(block.body_offset + offset))
                            .with_block(block.name),
                        );
                    }
                }
            }
        }

        if !is_table {
            if let Some(index) = index {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DslBlockNotTable,
                        format!(
                            "Block '{}' has no '{DIRECTIVE_KEY}: {DIRECTIVE_VALUE}' line and is not a table",
                            block.name
                        ),
                    )
                    .with_location(index.location(block.name_offset))
                    .with_block(block.name),
                );
            }
            return None;
        }

        diagnostics.extend(block_diags);
        Some(Table::from_columns(block.name, columns))
    }

    /// Type lint against the allow-list; arguments such as `(255)` are ignored
    fn check_type(&self, column: &Column, block: &str, location: Location) -> Option<Diagnostic> {
        if self.allowed_types.is_empty() {
            return None;
        }

        let base = column
            .column_type
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if self.allowed_types.contains(&base) {
            return None;
        }

        Some(
            Diagnostic::new(
                DiagnosticCode::DslUnknownType,
                format!(
                    "Column '{}' uses type '{}' which is not in the allowed list",
                    column.name, column.column_type
                ),
            )
            .with_location(location)
            .with_block(block),
        )
    }

    /// Apply the duplicate-table policy
    ///
    /// Repeats are a warning when every definition is kept and
    /// informational when the policy has already settled which one counts.
    fn resolve_duplicates(
        &self,
        found: Vec<FoundTable>,
        index: Option<&LineIndex<'_>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Table> {
        let (outcome, severity) = match self.duplicate_tables {
            DuplicateTablePolicy::KeepAll => ("both definitions are kept", Severity::Warn),
            DuplicateTablePolicy::FirstWins => ("this definition is ignored", Severity::Info),
            DuplicateTablePolicy::LastWins => ("it replaces the earlier definition", Severity::Info),
            DuplicateTablePolicy::Merge => {
                ("its columns are merged into the first definition", Severity::Info)
            }
        };

        // Output slot of the definition currently standing for each name
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut tables: Vec<Option<Table>> = Vec::with_capacity(found.len());

        for FoundTable { table, name_offset } in found {
            let Some(&slot) = slots.get(&table.name) else {
                slots.insert(table.name.clone(), tables.len());
                tables.push(Some(table));
                continue;
            };

            if let Some(index) = index {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DslDuplicateTable,
                        format!("Table '{}' is declared more than once; {outcome}", table.name),
                    )
                    .with_severity(severity)
                    .with_location(index.location(name_offset))
                    .with_block(table.name.as_str()),
                );
            }

            match self.duplicate_tables {
                DuplicateTablePolicy::KeepAll => tables.push(Some(table)),
                DuplicateTablePolicy::FirstWins => {}
                DuplicateTablePolicy::LastWins => {
                    // The last definition takes the position it appears at
                    tables[slot] = None;
                    slots.insert(table.name.clone(), tables.len());
                    tables.push(Some(table));
                }
                DuplicateTablePolicy::Merge => {
                    if let Some(first) = tables[slot].as_mut() {
                        first.columns.extend(table.columns);
                    }
                }
            }
        }

        tables.into_iter().flatten().collect()
    }
}

/// Parse `text` with the default settings
///
/// Equivalent to `SchemaParser::new().parse(text)`.
pub fn parse(text: &str) -> Vec<Table> {
    SchemaParser::new().parse(text)
}

/// Split a body on `\n` and `;`, yielding trimmed non-empty lines with
/// their byte offset inside the body
fn logical_lines(body: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut start = 0;
    body.split(['\n', ';'])
        .map(move |segment| {
            let offset = start;
            start += segment.len() + 1;
            let leading = segment.len() - segment.trim_start().len();
            (offset + leading, segment.trim())
        })
        .filter(|(_, line)| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_lines() {
        assert_eq!(BodyLine::classify("shape: sql_table"), BodyLine::Directive);
        assert_eq!(BodyLine::classify("shape :sql_table"), BodyLine::Directive);
        assert_eq!(BodyLine::classify("id: int"), BodyLine::Column(Column::new("id", "int")));
        assert_eq!(BodyLine::classify("orphan"), BodyLine::MissingColon);
        assert_eq!(BodyLine::classify(": int"), BodyLine::EmptyKeyOrValue);
        assert_eq!(BodyLine::classify("id:"), BodyLine::EmptyKeyOrValue);
    }

    #[test]
    fn directive_is_case_sensitive() {
        assert_eq!(
            BodyLine::classify("shape: SQL_TABLE"),
            BodyLine::Column(Column::new("shape", "SQL_TABLE"))
        );
        assert_eq!(
            BodyLine::classify("shape: rectangle"),
            BodyLine::Column(Column::new("shape", "rectangle"))
        );
    }

    #[test]
    fn extra_colons_are_rejoined() {
        assert_eq!(
            BodyLine::classify("created_at: timestamp : default now"),
            BodyLine::Column(Column::new("created_at", "timestamp:default now"))
        );
    }

    #[test]
    fn logical_lines_split_on_newline_and_semicolon() {
        let body = "\n  a: int; b: text\n\n ;c: x ";
        let lines: Vec<_> = logical_lines(body).collect();

        assert_eq!(lines, vec![(3, "a: int"), (11, "b: text"), (22, "c: x")]);
        for (offset, line) in lines {
            assert!(body[offset..].starts_with(line));
        }
    }

    #[test]
    fn type_lint_ignores_arguments_and_case() {
        let parser = SchemaParser::new().with_allowed_types(["int", "VARCHAR"]);
        let loc = Location::new(1, 1);

        assert!(parser.check_type(&Column::new("a", "INT"), "T", loc).is_none());
        assert!(parser.check_type(&Column::new("b", "varchar(255)"), "T", loc).is_none());

        let diag = parser.check_type(&Column::new("c", "jsonb"), "T", loc).unwrap();
        assert_eq!(diag.code, DiagnosticCode::DslUnknownType);
    }

    #[test]
    fn plain_run_collects_no_diagnostics() {
        let text = "T: { shape: sql_table; a: int; a: int; orphan }\nT: { shape: sql_table }\nN: { x }";
        let parser = SchemaParser::new().with_allowed_types(["text"]);

        let plain = parser.run(text, None);
        assert!(plain.diagnostics.is_empty());
        assert_eq!(plain.tables, parser.parse_with_diagnostics(text).tables);
    }

    #[test]
    fn type_lint_disabled_by_default() {
        let parser = SchemaParser::new();
        let column = Column::new("c", "anything_goes");
        assert!(parser.check_type(&column, "T", Location::new(1, 1)).is_none());
    }
}
