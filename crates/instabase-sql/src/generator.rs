//! `CREATE TABLE` rendering
//!
//! Output targets the single-file embedded database dialect: declared types
//! pass through upper-cased and unchecked, and vector-enabled tables gain a
//! libSQL `F32_BLOB` embedding column.

use instabase_core::{Column, Table, VectorFlags};

/// Returned when there is nothing to render
///
/// Starts with a SQL comment so it can never be mistaken for DDL.
pub const EMPTY_SCHEMA_PLACEHOLDER: &str = "-- No valid tables found.\n-- Use shape: sql_table";

/// Name of the synthetic vector column
pub const EMBEDDING_COLUMN: &str = "embedding";

/// Dimensions of the synthetic vector column
pub const EMBEDDING_DIMENSIONS: usize = 768;

/// Type token of the synthetic vector column
pub const EMBEDDING_TYPE: &str = "F32_BLOB(768)";

const INDENT: &str = "  ";

/// Renders parsed tables as SQL DDL
pub struct SqlGenerator;

impl SqlGenerator {
    /// Render one statement per table, separated by a blank line
    ///
    /// Returns [`EMPTY_SCHEMA_PLACEHOLDER`] when `tables` is empty.
    pub fn generate(tables: &[Table], flags: &VectorFlags) -> String {
        if tables.is_empty() {
            tracing::debug!("no tables to render, returning placeholder");
            return EMPTY_SCHEMA_PLACEHOLDER.to_string();
        }

        let sql = tables
            .iter()
            .map(|table| Self::create_table(table, flags.is_enabled(&table.name)))
            .collect::<Vec<_>>()
            .join("\n\n");

        tracing::debug!(
            tables = tables.len(),
            vector_tables = tables.iter().filter(|t| flags.is_enabled(&t.name)).count(),
            bytes = sql.len(),
            "rendered DDL"
        );

        sql
    }

    /// Render a single `CREATE TABLE` statement
    pub fn create_table(table: &Table, with_embedding: bool) -> String {
        let mut columns: Vec<String> = table.columns.iter().map(Self::column_definition).collect();

        if with_embedding {
            columns.push(format!("{INDENT}{EMBEDDING_COLUMN} {EMBEDDING_TYPE}"));
        }

        format!("CREATE TABLE {} (\n{}\n);", table.name, columns.join(",\n"))
    }

    /// Only the type is upper-cased; names keep their case
    fn column_definition(column: &Column) -> String {
        format!("{INDENT}{} {}", column.name, column.column_type.to_uppercase())
    }
}

/// Render `tables` as SQL, adding embedding columns where `flags` says so
///
/// Equivalent to [`SqlGenerator::generate`].
pub fn generate(tables: &[Table], flags: &VectorFlags) -> String {
    SqlGenerator::generate(tables, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tables_render_placeholder() {
        let sql = generate(&[], &VectorFlags::new());
        assert_eq!(sql, EMPTY_SCHEMA_PLACEHOLDER);
        assert!(sql.starts_with("--"));
        assert!(!sql.contains("CREATE TABLE"));
    }

    #[test]
    fn type_is_uppercased_name_is_not() {
        let table = Table::new("UserAccounts").with_column("emailAddress", "varChar(255)");
        assert_eq!(
            SqlGenerator::create_table(&table, false),
            "CREATE TABLE UserAccounts (\n  emailAddress VARCHAR(255)\n);"
        );
    }

    #[test]
    fn embedding_column_is_last() {
        let table = Table::new("Docs").with_column("id", "int");
        assert_eq!(
            SqlGenerator::create_table(&table, true),
            "CREATE TABLE Docs (\n  id INT,\n  embedding F32_BLOB(768)\n);"
        );
    }

    #[test]
    fn embedding_type_matches_dimensions() {
        assert_eq!(EMBEDDING_TYPE, format!("F32_BLOB({EMBEDDING_DIMENSIONS})"));
    }

    #[test]
    fn table_without_columns() {
        assert_eq!(SqlGenerator::create_table(&Table::new("T"), false), "CREATE TABLE T (\n\n);");
        assert_eq!(
            SqlGenerator::create_table(&Table::new("T"), true),
            "CREATE TABLE T (\n  embedding F32_BLOB(768)\n);"
        );
    }

    #[test]
    fn false_flag_means_no_embedding() {
        let tables = vec![Table::new("T").with_column("a", "int")];
        let flags = VectorFlags::new().with("T", false);
        assert!(!generate(&tables, &flags).contains(EMBEDDING_COLUMN));
    }
}
