// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "filterql";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "filterql.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "FILTERQL_CONFIG";

/// Environment variable for the catalog file path
pub const ENV_CATALOG: &str = "FILTERQL_CATALOG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "FILTERQL_LOG";

// =============================================================================
// Compiler Limits
// =============================================================================

/// Environment variable for the filter JSON size limit in bytes
pub const ENV_MAX_FILTER_BYTES: &str = "FILTERQL_MAX_FILTER_BYTES";

/// Environment variable for the relation inclusion depth limit
pub const ENV_MAX_INCLUSION_DEPTH: &str = "FILTERQL_MAX_INCLUSION_DEPTH";

/// Default filter JSON size limit (64 KiB)
pub const DEFAULT_MAX_FILTER_JSON_BYTES: usize = 64 * 1024;
