//! SQL generation
//!
//! Renders parsed tables as `CREATE TABLE` statements. Generation is a pure
//! function of the tables and the caller's vector flags: the same input
//! always produces byte-identical SQL.

pub mod generator;

pub use generator::{
    generate, SqlGenerator, EMBEDDING_COLUMN, EMBEDDING_DIMENSIONS, EMBEDDING_TYPE,
    EMPTY_SCHEMA_PLACEHOLDER,
};
