//! Values available to prompt templates

use instabase_core::{Table, VectorFlags};
use minijinja::Value as MinijinjaValue;
use serde::{Deserialize, Serialize};

/// Template context for prompt rendering
///
/// Templates see `sql`, `tables` and `vector_tables`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContext {
    /// Generated DDL, embedded verbatim
    pub sql: String,

    /// Parsed tables, for templates that list them
    pub tables: Vec<Table>,

    /// Names of tables that carry an embedding column
    pub vector_tables: Vec<String>,
}

impl PromptContext {
    /// Context holding only the SQL
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    /// Convert to MiniJinja value for rendering
    pub fn to_minijinja_value(&self) -> MinijinjaValue {
        MinijinjaValue::from_serialize(self)
    }
}

/// Builder for PromptContext
#[derive(Default)]
pub struct PromptContextBuilder {
    context: PromptContext,
}

impl PromptContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = sql.into();
        self
    }

    pub fn tables(mut self, tables: Vec<Table>) -> Self {
        self.context.tables = tables;
        self
    }

    /// Record the enabled tables; only names of parsed tables are kept
    /// when tables were set first
    pub fn vector_flags(mut self, flags: &VectorFlags) -> Self {
        self.context.vector_tables = if self.context.tables.is_empty() {
            flags.enabled_tables().into_iter().map(str::to_string).collect()
        } else {
            self.context
                .tables
                .iter()
                .filter(|t| flags.is_enabled(&t.name))
                .map(|t| t.name.clone())
                .collect()
        };
        self
    }

    pub fn build(self) -> PromptContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_tables_follow_table_order() {
        let flags = VectorFlags::new().with("B", true).with("A", true).with("Z", true);
        let context = PromptContextBuilder::new()
            .tables(vec![Table::new("B"), Table::new("C"), Table::new("A")])
            .vector_flags(&flags)
            .build();

        assert_eq!(context.vector_tables, vec!["B", "A"]);
    }

    #[test]
    fn vector_tables_without_tables() {
        let flags = VectorFlags::new().with("Posts", true).with("Users", false);
        let context = PromptContextBuilder::new().vector_flags(&flags).build();

        assert_eq!(context.vector_tables, vec!["Posts"]);
    }
}
