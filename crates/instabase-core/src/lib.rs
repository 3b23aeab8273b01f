//! InstaBase Core
//!
//! Shared domain model for the schema DSL toolchain: parsed tables,
//! per-table vector flags, diagnostics, configuration and lint reports.
//! Diagnostic codes are part of the public API and must never be renamed.

pub mod diagnostic;
pub mod schema;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, LineIndex, Location, Severity};
pub use schema::{Column, Table, VectorFlags};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{
    Config, ConfigError, DuplicateTablePolicy, GeneratorConfig, ParserConfig, PromptConfig,
    ScanMode, SeverityThreshold,
};
