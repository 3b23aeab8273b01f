//! Configuration schema (instabase.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::diagnostic::{DiagnosticCode, Severity};
use crate::schema::VectorFlags;

/// How blocks are located in the DSL text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// A block body ends at the first `}` after its `{`, nested or not
    #[default]
    Flat,

    /// Braces are depth-tracked; nested or unterminated blocks are rejected
    Strict,
}

/// What to do when two blocks declare the same table name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTablePolicy {
    /// Emit every occurrence as its own table
    #[default]
    KeepAll,

    /// Keep the first occurrence, drop later ones
    FirstWins,

    /// Keep the last occurrence, at the position of the last one
    LastWins,

    /// Append the columns of later occurrences to the first one
    Merge,
}

/// Parser settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub scan_mode: ScanMode,

    #[serde(default)]
    pub duplicate_tables: DuplicateTablePolicy,

    /// Accepted type tokens (case-insensitive). Empty disables the type lint.
    #[serde(default)]
    pub allowed_types: Vec<String>,
}

/// SQL generator settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Tables that get an embedding column unless overridden by the caller
    #[serde(default)]
    pub vector_tables: Vec<String>,
}

impl GeneratorConfig {
    /// Default vector flags from the configured table list
    pub fn vector_flags(&self) -> VectorFlags {
        self.vector_tables.iter().map(String::as_str).collect()
    }
}

/// Prompt template settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Custom template file, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_file: Option<PathBuf>,
}

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or the code's default
    pub fn get_severity(&self, code: DiagnosticCode) -> Severity {
        self.override_for(code).unwrap_or_else(|| code.default_severity())
    }

    /// Configured override for a code, if any
    pub fn override_for(&self, code: DiagnosticCode) -> Option<Severity> {
        self.overrides.get(code.as_str()).copied()
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            generator: GeneratorConfig::default(),
            prompt: PromptConfig::default(),
            severity: SeverityThreshold::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Default config file name looked up in the working directory
    pub const FILE_NAME: &'static str = "instabase.toml";

    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Resolve the prompt template path against the project root
    pub fn prompt_template_path(&self) -> Option<PathBuf> {
        self.prompt
            .template_file
            .as_ref()
            .map(|p| if p.is_relative() { self.project_root.join(p) } else { p.clone() })
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
