//! Table model produced by the DSL parser and consumed by the generators

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A column declared inside a `shape: sql_table` block
///
/// Both fields are raw tokens taken verbatim from the source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name (left of the first colon)
    pub name: String,

    /// Declared type, case as written
    #[serde(rename = "type")]
    pub column_type: String,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// A relational table recognized in the DSL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Table {
    /// Table name (block identifier)
    pub name: String,

    /// Columns in declaration order
    pub columns: Vec<Column>,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Create a table from columns
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Append a column
    pub fn with_column(mut self, name: impl Into<String>, column_type: impl Into<String>) -> Self {
        self.columns.push(Column::new(name, column_type));
        self
    }

    /// Find the first column with the given name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Per-table vector search toggles
///
/// Owned by the caller and passed by reference into generation. A table
/// that is absent from the set is treated as disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorFlags {
    flags: BTreeMap<String, bool>,
}

impl VectorFlags {
    /// Create an empty flag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag for a table
    pub fn set(&mut self, table: impl Into<String>, enabled: bool) -> &mut Self {
        self.flags.insert(table.into(), enabled);
        self
    }

    /// Builder-style variant of [`VectorFlags::set`]
    pub fn with(mut self, table: impl Into<String>, enabled: bool) -> Self {
        self.set(table, enabled);
        self
    }

    /// Whether the embedding column is enabled for a table
    pub fn is_enabled(&self, table: &str) -> bool {
        self.flags.get(table).copied().unwrap_or(false)
    }

    /// Names of the tables with the flag switched on
    pub fn enabled_tables(&self) -> Vec<&str> {
        self.flags
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<(String, bool)> for VectorFlags {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for VectorFlags {
    /// Every listed table is enabled
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(|name| (name.to_string(), true)).collect()
    }
}

impl From<std::collections::HashMap<String, bool>> for VectorFlags {
    fn from(map: std::collections::HashMap<String, bool>) -> Self {
        map.into_iter().collect()
    }
}

impl Extend<(String, bool)> for VectorFlags {
    fn extend<I: IntoIterator<Item = (String, bool)>>(&mut self, iter: I) {
        self.flags.extend(iter);
    }
}
