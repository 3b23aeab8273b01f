//! Integration tests for DSL → SQL generation

use instabase_core::{Table, VectorFlags};
use instabase_dsl::parse;
use instabase_sql::{generate, EMBEDDING_COLUMN, EMPTY_SCHEMA_PLACEHOLDER};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

const USERS: &str = "Users: {\n  shape: sql_table\n  id: int\n  email: text\n}";

const TWO_TABLES: &str = "Users: {
  shape: sql_table
  id: int
  email: text
}

Posts: {
  shape: sql_table
  id: int
  title: text
}";

/// Parse generated SQL and return (table name, column names) per statement
fn parse_ddl(sql: &str) -> Vec<(String, Vec<String>)> {
    let statements = Parser::parse_sql(&SQLiteDialect {}, sql).unwrap();

    statements
        .into_iter()
        .map(|statement| match statement {
            Statement::CreateTable(create) => (
                create.name.to_string(),
                create.columns.iter().map(|c| c.name.value.clone()).collect(),
            ),
            other => panic!("unexpected statement: {other}"),
        })
        .collect()
}

#[test]
fn users_round_trip() {
    let sql = generate(&parse(USERS), &VectorFlags::new());

    assert_eq!(sql, "CREATE TABLE Users (\n  id INT,\n  email TEXT\n);");
}

#[test]
fn two_tables_with_vector_on_second() {
    let flags = VectorFlags::new().with("Posts", true);
    let sql = generate(&parse(TWO_TABLES), &flags);

    assert_eq!(
        sql,
        "CREATE TABLE Users (\n  id INT,\n  email TEXT\n);\n\n\
         CREATE TABLE Posts (\n  id INT,\n  title TEXT,\n  embedding F32_BLOB(768)\n);"
    );
}

#[test]
fn no_tables_renders_placeholder() {
    assert_eq!(generate(&[], &VectorFlags::new()), EMPTY_SCHEMA_PLACEHOLDER);

    let sql = generate(&parse("Server: { label: api }"), &VectorFlags::new());
    assert_eq!(sql, EMPTY_SCHEMA_PLACEHOLDER);
    assert!(!sql.contains("CREATE TABLE"));
}

#[test]
fn flags_for_unknown_tables_are_ignored() {
    let flags = VectorFlags::new().with("Comments", true);
    let sql = generate(&parse(USERS), &flags);

    assert!(!sql.contains(EMBEDDING_COLUMN));
}

#[test]
fn flags_from_toggle_map() {
    // Toggle state as a front end keeps it, keyed by table name
    let toggles = HashMap::from([
        ("Users".to_string(), false),
        ("Posts".to_string(), true),
    ]);
    let flags = VectorFlags::from(toggles);

    assert_eq!(flags, VectorFlags::new().with("Users", false).with("Posts", true));
    assert_eq!(
        generate(&parse(TWO_TABLES), &flags),
        generate(&parse(TWO_TABLES), &VectorFlags::from_iter(["Posts"]))
    );
}

#[test]
fn generation_is_deterministic() {
    let flags = VectorFlags::new().with("Users", true).with("Posts", false);

    let first = generate(&parse(TWO_TABLES), &flags);
    let second = generate(&parse(TWO_TABLES), &flags);

    assert_eq!(first, second);
}

#[test]
fn duplicate_tables_render_twice() {
    let tables = parse("T: { shape: sql_table; a: int }\nT: { shape: sql_table; b: text }");
    let sql = generate(&tables, &VectorFlags::new());

    assert_eq!(sql.matches("CREATE TABLE T (").count(), 2);
}

#[test]
fn generated_ddl_is_valid_sqlite() {
    let flags = VectorFlags::new().with("Posts", true);
    let sql = generate(&parse(TWO_TABLES), &flags);

    assert_eq!(
        parse_ddl(&sql),
        vec![
            ("Users".to_string(), vec!["id".to_string(), "email".to_string()]),
            (
                "Posts".to_string(),
                vec!["id".to_string(), "title".to_string(), "embedding".to_string()]
            ),
        ]
    );
}

#[test]
fn arbitrary_types_pass_through() {
    let tables = vec![Table::new("Events")
        .with_column("payload", "json")
        .with_column("happened", "timestamp")
        .with_column("score", "decimal(10, 2)")];

    let sql = generate(&tables, &VectorFlags::new());

    assert_eq!(
        sql,
        "CREATE TABLE Events (\n  payload JSON,\n  happened TIMESTAMP,\n  score DECIMAL(10, 2)\n);"
    );
    assert_eq!(parse_ddl(&sql).len(), 1);
}
