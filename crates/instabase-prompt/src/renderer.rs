//! Prompt rendering
//!
//! Wraps generated SQL in a natural-language request for a code-generation
//! assistant. The SQL is inserted verbatim: templates are rendered without
//! auto-escaping.

use minijinja::{Environment, Error as JinjaError};
use std::path::Path;
use crate::context::PromptContext;

/// Template used when no custom template is configured
pub const DEFAULT_TEMPLATE: &str = "I am building a new application using SQLite. \nHere is my database schema:\n\n```sql\n{{ sql }}\n```\n\nPlease generate the TypeScript types and a basic CRUD repository for this schema.";

/// Error during prompt rendering
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Invalid prompt template: {0}")]
    Template(String),

    #[error("Prompt render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Prompt template renderer
pub struct PromptRenderer {
    env: Environment<'static>,
    template: String,
}

impl PromptRenderer {
    /// Create a renderer for a custom template
    ///
    /// The template is compiled once here so syntax errors surface early.
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let env = Self::environment();
        let template = template.into();
        env.template_from_str(&template)
            .map_err(|e| PromptError::Template(Self::describe(&e)))?;

        Ok(Self { env, template })
    }

    /// Renderer for [`DEFAULT_TEMPLATE`]
    pub fn with_defaults() -> Self {
        Self {
            env: Self::environment(),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();

        // Wraps a value in a ```sql fence
        env.add_filter("sql_fence", |sql: String| -> String {
            format!("```sql\n{sql}\n```")
        });

        env
    }

    /// Load a custom template from a file
    pub fn from_file(path: &Path) -> Result<Self, PromptError> {
        let template = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded prompt template");
        Self::new(template)
    }

    /// Render the template with a full context
    pub fn render(&self, context: &PromptContext) -> Result<String, PromptError> {
        self.env
            .render_str(&self.template, context.to_minijinja_value())
            .map_err(|e| PromptError::Render(Self::describe(&e)))
    }

    /// Render the template with only `sql` set
    pub fn render_sql(&self, sql: &str) -> Result<String, PromptError> {
        self.render(&PromptContext::new(sql))
    }

    fn describe(error: &JinjaError) -> String {
        match error.detail() {
            Some(detail) => format!("{} ({})", error.kind(), detail),
            None => error.to_string(),
        }
    }
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::with_defaults()
    }
}
