//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseDriver, FolioConfig};
use crate::config::secret_string;
use crate::domain::errors::FolioError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`FolioConfig`]
/// 4. Applies `FOLIO_*` and legacy `DB_*`/`PORT` environment overrides
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read or parsed, a
/// referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use folio::config::loader::load_config;
///
/// let config = load_config("folio.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<FolioConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FolioError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        FolioError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let env = |name: &str| std::env::var(name).ok();
    let contents = substitute_env_vars(&contents, &env)?;

    let mut config: FolioConfig = toml::from_str(&contents)
        .map_err(|e| FolioError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config, &env)?;
    validate(config)
}

/// Builds the configuration from defaults and the environment only
///
/// This is the mode used when no configuration file is given: the connection
/// comes from `DB_DRIVER`, `DB_USER`, `DB_PASS`, `DB_HOST`, `DB_PORT`,
/// `DB_NAME` and the listen port from `PORT`.
///
/// # Errors
///
/// Returns a configuration error if a variable is malformed or validation fails.
pub fn load_config_from_env() -> Result<FolioConfig> {
    let mut config = FolioConfig::default();
    apply_env_overrides(&mut config, &|name: &str| std::env::var(name).ok())?;
    validate(config)
}

/// Loads from `path` when given, from the environment otherwise
pub fn load(path: Option<&Path>) -> Result<FolioConfig> {
    match path {
        Some(path) => load_config(path),
        None => load_config_from_env(),
    }
}

fn validate(config: FolioConfig) -> Result<FolioConfig> {
    config.validate().map_err(|e| {
        FolioError::Configuration(format!("Configuration validation failed: {e}"))
    })?;
    Ok(config)
}

/// Substitutes variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| FolioError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            lookup(var_name).unwrap_or_else(|| {
                if !missing_vars.iter().any(|v| v == var_name) {
                    missing_vars.push(var_name.to_string());
                }
                String::new()
            })
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(FolioError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_var<T>(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                FolioError::Configuration(format!("Invalid value '{raw}' for {name}: {e}"))
            })
        })
        .transpose()
}

/// Applies environment overrides
///
/// `FOLIO_<SECTION>_<KEY>` variables come first, then the legacy connection
/// variables, which win when both are set.
fn apply_env_overrides(
    config: &mut FolioConfig,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<()> {
    // Application overrides
    if let Some(val) = lookup("FOLIO_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Server overrides
    if let Some(val) = lookup("FOLIO_SERVER_HOST") {
        config.server.host = val;
    }
    if let Some(port) = parse_var(lookup, "FOLIO_SERVER_PORT")? {
        config.server.port = port;
    }
    if let Some(val) = lookup("FOLIO_SERVER_ROUTE_PREFIX") {
        config.server.route_prefix = val;
    }

    // Database overrides
    if let Some(driver) = parse_var::<DatabaseDriver>(lookup, "FOLIO_DATABASE_DRIVER")? {
        config.database.driver = driver;
    }
    if let Some(val) = lookup("FOLIO_DATABASE_USER") {
        config.database.user = val;
    }
    if let Some(val) = lookup("FOLIO_DATABASE_PASSWORD") {
        config.database.password = Some(secret_string(val));
    }
    if let Some(val) = lookup("FOLIO_DATABASE_HOST") {
        config.database.host = val;
    }
    if let Some(port) = parse_var(lookup, "FOLIO_DATABASE_PORT")? {
        config.database.port = port;
    }
    if let Some(val) = lookup("FOLIO_DATABASE_NAME") {
        config.database.name = val;
    }
    if let Some(max) = parse_var(lookup, "FOLIO_DATABASE_MAX_CONNECTIONS")? {
        config.database.max_connections = max;
    }

    // Export overrides
    if let Some(limit) = parse_var(lookup, "FOLIO_EXPORT_ROW_LIMIT")? {
        config.export.row_limit = limit;
    }
    if let Some(size) = parse_var(lookup, "FOLIO_EXPORT_FETCH_BATCH_SIZE")? {
        config.export.fetch_batch_size = size;
    }
    if let Some(val) = lookup("FOLIO_EXPORT_CATEGORIES") {
        config.export.categories = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().map_err(FolioError::Configuration))
            .collect::<Result<Vec<_>>>()?;
    }
    if let Some(val) = lookup("FOLIO_EXPORT_LINK_STYLE") {
        config.export.link_style = match val.to_lowercase().as_str() {
            "formula" => crate::domain::LinkStyle::Formula,
            "plain" => crate::domain::LinkStyle::Plain,
            other => {
                return Err(FolioError::Configuration(format!(
                    "Invalid link style '{other}'. Must be one of: formula, plain"
                )))
            }
        };
    }

    // Logging overrides
    if let Some(enabled) = parse_var(lookup, "FOLIO_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Some(val) = lookup("FOLIO_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    // Legacy connection variables
    if let Some(driver) = parse_var::<DatabaseDriver>(lookup, "DB_DRIVER")? {
        config.database.driver = driver;
    }
    if let Some(val) = lookup("DB_USER") {
        config.database.user = val;
    }
    if let Some(val) = lookup("DB_PASS") {
        config.database.password = Some(secret_string(val));
    }
    if let Some(val) = lookup("DB_HOST") {
        config.database.host = val;
    }
    if let Some(port) = parse_var(lookup, "DB_PORT")? {
        config.database.port = port;
    }
    if let Some(val) = lookup("DB_NAME") {
        config.database.name = val;
    }
    if let Some(port) = parse_var(lookup, "PORT")? {
        config.server.port = port;
    }

    Ok(())
}
