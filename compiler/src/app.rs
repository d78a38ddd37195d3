//! Core application

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::filters::{FilterCompiler, Operator, parse_update_payload};
use crate::schema::{Catalog, TableSchema};

pub struct CoreApp {
    pub config: AppConfig,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self {
            config: AppConfig::load(&cli_config)?,
        };

        let output = match command {
            Commands::Operators => Self::list_operators(),
            Commands::Compile {
                table,
                filter,
                options,
            } => app.compile(&table, &filter, options)?,
            Commands::Update { table, payload } => app.update(&table, &payload)?,
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stderr keeps stdout machine-readable
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    fn compile(&self, table: &str, filter: &str, options_only: bool) -> Result<serde_json::Value> {
        let catalog = self.load_catalog()?;
        let schema = Self::table(&catalog, table)?;
        let compiler = FilterCompiler::new(&catalog)
            .with_hidden_properties(&catalog)
            .with_config(self.config.compiler.clone());

        let options = compiler
            .compile_json(&schema, filter)
            .map_err(Self::filter_error)?;
        if options_only {
            return Ok(serde_json::to_value(&options)?);
        }

        let (sql, params) = compiler
            .render_select(&schema, &options)
            .map_err(Self::filter_error)?;
        Ok(json!({ "sql": sql, "params": params.values, "with": options.with }))
    }

    fn update(&self, table: &str, payload: &str) -> Result<serde_json::Value> {
        let catalog = self.load_catalog()?;
        let schema = Self::table(&catalog, table)?;
        let compiler = FilterCompiler::new(&catalog).with_config(self.config.compiler.clone());

        let payload = parse_update_payload(payload, compiler.config())
            .map_err(Self::filter_error)?;
        let result = compiler
            .compile_update(&schema, &payload)
            .map_err(Self::filter_error)?;
        let (set_clause, params) = compiler.render_set_clause(&result);

        Ok(json!({
            "set": set_clause,
            "params": params.values,
            "flatFields": result.flat_fields,
            "mergeExpressionsByColumn": result.merge_expressions_by_column,
        }))
    }

    fn list_operators() -> serde_json::Value {
        let operators: Vec<serde_json::Value> = Operator::ALL
            .iter()
            .map(|op| {
                json!({
                    "name": op.canonical_name(),
                    "aliases": op.aliases(),
                    "operand": op.operand_description(),
                    "structural": op.is_structural(),
                })
            })
            .collect();
        serde_json::Value::Array(operators)
    }

    fn load_catalog(&self) -> Result<Catalog> {
        let path = self
            .config
            .catalog
            .as_deref()
            .context("No catalog configured (use --catalog or the config file)")?;
        Self::read_catalog(path)
    }

    fn read_catalog(path: &Path) -> Result<Catalog> {
        tracing::debug!(path = %path.display(), "Loading catalog");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file: {}", path.display()))
    }

    fn table(catalog: &Catalog, name: &str) -> Result<std::sync::Arc<TableSchema>> {
        catalog
            .table(name)
            .with_context(|| format!("Table '{}' not found in catalog", name))
    }

    /// Log the structured error body, keep the message for the exit path
    fn filter_error(error: crate::filters::FilterError) -> anyhow::Error {
        let body = error.to_body();
        tracing::debug!(
            code = body.message_code,
            status = body.status_code,
            "Filter compilation failed"
        );
        anyhow::anyhow!("{} ({})", body.message, body.message_code)
    }
}
