use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{CONFIG_FILE_NAME, DEFAULT_MAX_FILTER_JSON_BYTES};

// =============================================================================
// Compiler Limits
// =============================================================================

/// Limits applied by the filter parser and the inclusion compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerConfig {
    /// Largest accepted filter or update JSON text, in bytes
    pub max_filter_json_bytes: usize,
    /// Deepest allowed relation inclusion; `None` leaves nesting to the caller
    pub max_inclusion_depth: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_filter_json_bytes: DEFAULT_MAX_FILTER_JSON_BYTES,
            max_inclusion_depth: None,
        }
    }
}

// =============================================================================
// File Config
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CompilerFileConfig {
    pub max_filter_json_bytes: Option<usize>,
    pub max_inclusion_depth: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// Relative paths are resolved against the config file's directory
    pub catalog: Option<PathBuf>,
    pub compiler: Option<CompilerFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Anchor relative paths to the directory holding `config_path`
    fn resolve_paths(&mut self, config_path: &Path) {
        if let Some(catalog) = self.catalog.take() {
            self.catalog = Some(match config_path.parent() {
                Some(dir) if catalog.is_relative() => dir.join(catalog),
                _ => catalog,
            });
        }
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Final Config
// =============================================================================

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub compiler: CompilerConfig,
    pub catalog: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let config_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let file_config = match config_path {
            Some(path) => {
                let mut file_config = FileConfig::load_from_file(&path)?;
                file_config.warn_unknown_fields();
                file_config.resolve_paths(&path);
                file_config
            }
            None => FileConfig::default(),
        };
        let file_compiler = file_config.compiler.unwrap_or_default();
        let defaults = CompilerConfig::default();

        let config = Self {
            compiler: CompilerConfig {
                max_filter_json_bytes: cli
                    .max_filter_bytes
                    .or(file_compiler.max_filter_json_bytes)
                    .unwrap_or(defaults.max_filter_json_bytes),
                max_inclusion_depth: cli
                    .max_inclusion_depth
                    .or(file_compiler.max_inclusion_depth)
                    .or(defaults.max_inclusion_depth),
            },
            catalog: cli.catalog.clone().or(file_config.catalog),
        };

        config.validate()?;
        tracing::debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.compiler.max_filter_json_bytes == 0 {
            anyhow::bail!("Configuration error: compiler.max_filter_json_bytes must be greater than 0");
        }
        if self.compiler.max_inclusion_depth == Some(0) {
            tracing::warn!("compiler.max_inclusion_depth is 0, every include will be rejected");
        }
        Ok(())
    }
}
