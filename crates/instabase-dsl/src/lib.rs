//! Schema DSL parsing
//!
//! This crate handles:
//! - Locating `<name>: { ... }` blocks in diagram-style text
//! - Recognizing blocks marked with `shape: sql_table` as tables
//! - Extracting `name: type` column lines in declaration order
//! - Explaining dropped input through diagnostics
//!
//! Parsing never fails. Input that cannot be interpreted is left out of
//! the result, so a half-typed document still yields every complete table.

pub mod scanner;
pub mod parser;

pub use scanner::{BlockScan, BlockScanner, RawBlock, ScanIssue};
pub use parser::{parse, ParseOutcome, SchemaParser, DIRECTIVE_KEY, DIRECTIVE_VALUE};
