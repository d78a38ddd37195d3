use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_CATALOG, ENV_CONFIG, ENV_MAX_FILTER_BYTES, ENV_MAX_INCLUSION_DEPTH};

#[derive(Parser)]
#[command(name = "filterql")]
#[command(version, about = "Filter DSL to PostgreSQL compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Path to the catalog JSON file (tables, relations, hidden properties)
    #[arg(long, global = true, env = ENV_CATALOG)]
    pub catalog: Option<PathBuf>,

    /// Maximum accepted filter/payload JSON size in bytes
    #[arg(long, global = true, env = ENV_MAX_FILTER_BYTES)]
    pub max_filter_bytes: Option<usize>,

    /// Maximum relation inclusion nesting (unlimited when unset)
    #[arg(long, global = true, env = ENV_MAX_INCLUSION_DEPTH)]
    pub max_inclusion_depth: Option<usize>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile a filter and print the SELECT statement with its parameters
    Compile {
        /// Table to query
        #[arg(long, short = 't')]
        table: String,
        /// Filter JSON (object or string-encoded object)
        #[arg(long, short = 'f', default_value = "{}")]
        filter: String,
        /// Print the compiled query options instead of SQL
        #[arg(long)]
        options: bool,
    },
    /// Compile an update payload and print the SET clause with its parameters
    Update {
        /// Table to update
        #[arg(long, short = 't')]
        table: String,
        /// Update payload JSON object
        #[arg(long, short = 'p')]
        payload: String,
    },
    /// List registered filter operators
    Operators,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub max_filter_bytes: Option<usize>,
    pub max_inclusion_depth: Option<usize>,
}

/// Parse CLI arguments and return config and command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        catalog: cli.catalog,
        max_filter_bytes: cli.max_filter_bytes,
        max_inclusion_depth: cli.max_inclusion_depth,
    };
    (config, cli.command)
}
