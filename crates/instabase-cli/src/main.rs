use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use instabase_core::{Config, Diagnostic, Report, Severity, Table, VectorFlags};
use instabase_dsl::SchemaParser;
use instabase_prompt::{PromptContextBuilder, PromptRenderer};
use instabase_sql::{SqlGenerator, EMBEDDING_COLUMN, EMBEDDING_TYPE};

/// InstaBase - turn diagram-style schema blocks into SQL tables
#[derive(Parser)]
#[command(name = "instabase")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: instabase.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Schema source plus vector toggles, shared by several commands
#[derive(Args)]
struct SchemaArgs {
    /// DSL file to read, or '-' for stdin
    input: PathBuf,

    /// Add an embedding column to this table (repeatable)
    #[arg(long = "vector", value_name = "TABLE")]
    vector: Vec<String>,

    /// Remove a table configured in generator.vector_tables (repeatable)
    #[arg(long = "no-vector", value_name = "TABLE")]
    no_vector: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate CREATE TABLE statements
    Sql {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Write SQL to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the tables recognized in the input
    Tables {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Print the table model as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a code-generation prompt embedding the SQL
    Prompt {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Custom MiniJinja template (overrides prompt.template_file)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Write the prompt to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report lines and blocks that the parser skipped
    Check {
        /// DSL file to read, or '-' for stdin
        input: PathBuf,

        /// Output file for report.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new(Config::FILE_NAME).exists() {
        Config::from_file(Path::new(Config::FILE_NAME))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if cli.verbose {
        eprintln!(
            "{} scan mode: {:?}, duplicate tables: {:?}",
            "Using".cyan(),
            config.parser.scan_mode,
            config.parser.duplicate_tables
        );
    }

    match cli.command {
        Commands::Sql { schema, output } => sql_command(&config, &schema, output.as_deref(), cli.verbose),
        Commands::Tables { schema, json } => tables_command(&config, &schema, json),
        Commands::Prompt { schema, template, output } => {
            prompt_command(&config, &schema, template.as_deref(), output.as_deref(), cli.verbose)
        }
        Commands::Check { input, output, markdown } => {
            let has_errors =
                check_command(&config, &input, output.as_deref(), markdown.as_deref(), cli.verbose)?;
            if has_errors {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// Log to stderr; RUST_LOG wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Read DSL text from a file or stdin
fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read schema from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read schema from {}", input.display()))
}

/// Config defaults overridden by command-line toggles
fn vector_flags(config: &Config, schema: &SchemaArgs) -> VectorFlags {
    let mut flags = config.generator.vector_flags();
    flags.extend(schema.vector.iter().map(|t| (t.clone(), true)));
    flags.extend(schema.no_vector.iter().map(|t| (t.clone(), false)));
    flags
}

fn load_tables(config: &Config, input: &Path) -> Result<Vec<Table>> {
    let text = read_input(input)?;
    Ok(SchemaParser::from_config(config).parse(&text))
}

/// Write to a file, or print when no file is given
fn emit(content: &str, output: Option<&Path>, verbose: bool) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{content}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if verbose {
                eprintln!("{} {}", "Saved to:".green(), path.display());
            }
        }
        None => println!("{content}"),
    }
    Ok(())
}

/// Sql command - render DDL
fn sql_command(config: &Config, schema: &SchemaArgs, output: Option<&Path>, verbose: bool) -> Result<()> {
    let tables = load_tables(config, &schema.input)?;
    let flags = vector_flags(config, schema);

    if verbose {
        eprintln!("{} {} tables", "Generating SQL for".cyan(), tables.len());
    }

    emit(&SqlGenerator::generate(&tables, &flags), output, verbose)
}

/// Tables command - preview of the parsed model
fn tables_command(config: &Config, schema: &SchemaArgs, json: bool) -> Result<()> {
    let tables = load_tables(config, &schema.input)?;
    let flags = vector_flags(config, schema);

    if json {
        println!("{}", serde_json::to_string_pretty(&tables_preview(&tables, &flags))?);
        return Ok(());
    }

    if tables.is_empty() {
        println!("{}", "No valid tables found. Use shape: sql_table".yellow());
        return Ok(());
    }

    for table in &tables {
        println!("{} {}", "■".bright_blue(), table.name.bold());
        let width = table
            .columns
            .iter()
            .map(|c| c.name.chars().count())
            .chain(std::iter::once(EMBEDDING_COLUMN.len()))
            .max()
            .unwrap_or_default();

        for column in &table.columns {
            println!("  {:<width$}  {}", column.name, column.column_type.to_uppercase().dimmed());
        }

        if flags.is_enabled(&table.name) {
            let name = format!("{EMBEDDING_COLUMN:<width$}");
            println!("  {}  {}", name.magenta(), EMBEDDING_TYPE.magenta());
        }
        println!();
    }

    Ok(())
}

/// JSON model for `tables --json`: each table with its vector toggle
fn tables_preview(tables: &[Table], flags: &VectorFlags) -> serde_json::Value {
    tables
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "columns": t.columns,
                "vector": flags.is_enabled(&t.name),
            })
        })
        .collect()
}

/// Prompt command - SQL wrapped in a code-generation prompt
fn prompt_command(
    config: &Config,
    schema: &SchemaArgs,
    template: Option<&Path>,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let tables = load_tables(config, &schema.input)?;
    let flags = vector_flags(config, schema);
    let sql = SqlGenerator::generate(&tables, &flags);

    let template_path = template.map(Path::to_path_buf).or_else(|| config.prompt_template_path());
    let renderer = match &template_path {
        Some(path) => {
            if verbose {
                eprintln!("{} {}", "Using prompt template:".cyan(), path.display());
            }
            PromptRenderer::from_file(path)?
        }
        None => PromptRenderer::default(),
    };

    let context = PromptContextBuilder::new()
        .sql(sql)
        .tables(tables)
        .vector_flags(&flags)
        .build();

    emit(&renderer.render(&context)?, output, verbose)
}

/// Check command - explain what the parser dropped
///
/// Returns whether any diagnostic reached error severity.
fn check_command(
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    markdown: Option<&Path>,
    verbose: bool,
) -> Result<bool> {
    let text = read_input(input)?;
    let outcome = SchemaParser::from_config(config).parse_with_diagnostics(&text);
    let report = Report::new(outcome.tables, outcome.diagnostics);

    if let Some(path) = output {
        report.save_to_file(path)?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(&report))?;
        if verbose {
            eprintln!("{} {}", "Markdown report saved to:".green(), md_path.display());
        }
    }

    print_report_summary(&report, &source_label(input));

    Ok(report.has_errors())
}

/// Name used for the input in diagnostic lines
fn source_label(input: &Path) -> String {
    if input == Path::new("-") {
        "<stdin>".to_string()
    } else {
        input.display().to_string()
    }
}

/// Print one `source:line:col` line per diagnostic, then a tally
fn print_report_summary(report: &Report, source: &str) {
    for diag in &report.diagnostics {
        println!("{}", diagnostic_line(source, diag));
    }

    let summary = &report.summary;
    let tally = format!(
        "{} tables, {} columns: {} errors, {} warnings, {} info",
        summary.tables, summary.columns, summary.errors, summary.warnings, summary.info
    );

    if summary.errors > 0 {
        println!("{}", tally.red().bold());
    } else if summary.warnings > 0 {
        println!("{}", tally.yellow());
    } else {
        println!("{}", tally.green());
    }
}

fn diagnostic_line(source: &str, diag: &Diagnostic) -> String {
    let severity = match diag.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warn => "warn".yellow().bold(),
        Severity::Info => "info".cyan(),
    };

    let position = match diag.location {
        Some(location) => format!("{source}:{location}"),
        None => source.to_string(),
    };

    let mut line = format!("{position}: {severity}[{}] {}", diag.code, diag.message);
    if let Some(block) = &diag.block {
        line.push_str(&format!(" (in `{block}`)"));
    }
    line
}

/// Generate markdown report
fn generate_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Schema Check Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Tables: {}\n", report.summary.tables));
    md.push_str(&format!("- Columns: {}\n", report.summary.columns));
    md.push_str(&format!("- Total diagnostics: {}\n", report.summary.total));
    md.push_str(&format!("- Errors: {}\n", report.summary.errors));
    md.push_str(&format!("- Warnings: {}\n", report.summary.warnings));
    md.push_str(&format!("- Info: {}\n", report.summary.info));
    md.push('\n');

    if !report.tables.is_empty() {
        md.push_str("## Tables\n\n");
        md.push_str("| Table | Columns |\n|---|---|\n");
        for table in &report.tables {
            md.push_str(&format!("| `{}` | {} |\n", table.name, table.column_names().join(", ")));
        }
        md.push('\n');
    }

    if report.diagnostics.is_empty() {
        md.push_str("✅ **No issues found!**\n");
    } else {
        md.push_str("## Diagnostics\n\n");

        for diag in &report.diagnostics {
            let severity_emoji = match diag.severity {
                Severity::Error => "❌",
                Severity::Warn => "⚠️",
                Severity::Info => "ℹ️",
            };

            md.push_str(&format!("### {} {} - {}\n\n", severity_emoji, diag.severity, diag.code));
            md.push_str(&format!("{}\n\n", diag.message));

            if let Some(loc) = &diag.location {
                md.push_str(&format!("**Location:** line {}, column {}\n\n", loc.line, loc.column));
            }

            if let Some(block) = &diag.block {
                md.push_str(&format!("**Block:** `{}`\n\n", block));
            }
        }
    }

    md
}
