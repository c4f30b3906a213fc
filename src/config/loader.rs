//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::EpiExportConfig;
use super::secret::secret_string;
use crate::domain::errors::EpiError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into EpiExportConfig
/// 4. Applies environment variable overrides (EPIEXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, if parsing or substitution
/// fails, or if validation fails.
///
/// # Examples
///
/// ```no_run
/// use epiexport::config::loader::load_config;
///
/// let config = load_config("epiexport.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EpiExportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EpiError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        EpiError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut config = parse_config(&contents)?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        EpiError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Parses configuration text after `${VAR}` substitution, without overrides
/// or validation
pub fn parse_config(contents: &str) -> Result<EpiExportConfig> {
    let contents = substitute_env_vars(contents)?;

    toml::from_str(&contents)
        .map_err(|e| EpiError::Configuration(format!("Failed to parse TOML: {}", e)))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| EpiError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        // Comment lines are copied verbatim
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(EpiError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the EPIEXPORT_* prefix
///
/// Environment variables follow the pattern EPIEXPORT_<SECTION>_<KEY>,
/// for example EPIEXPORT_BACKEND_ENDPOINT or EPIEXPORT_EXPORT_PAGE_SIZE.
fn apply_env_overrides(config: &mut EpiExportConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("EPIEXPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Backend overrides
    if let Ok(val) = std::env::var("EPIEXPORT_BACKEND_ENDPOINT") {
        config.backend.endpoint = val;
    }
    if let Ok(val) = std::env::var("EPIEXPORT_BACKEND_URL_PREFIX") {
        config.backend.url_prefix = val;
    }
    if let Ok(val) = std::env::var("EPIEXPORT_BACKEND_TIMEOUT_SECONDS") {
        config.backend.timeout_seconds = parse_override("EPIEXPORT_BACKEND_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("EPIEXPORT_BACKEND_TLS_VERIFY") {
        config.backend.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("EPIEXPORT_BACKEND_API_TOKEN") {
        config.backend.api_token = Some(secret_string(val));
    }

    // Export overrides
    if let Ok(val) = std::env::var("EPIEXPORT_EXPORT_PAGE_SIZE") {
        config.export.page_size = parse_override("EPIEXPORT_EXPORT_PAGE_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("EPIEXPORT_EXPORT_THROTTLE_BASE_MS") {
        config.export.throttle_base_ms = parse_override("EPIEXPORT_EXPORT_THROTTLE_BASE_MS", &val)?;
    }
    if let Ok(val) = std::env::var("EPIEXPORT_EXPORT_BACKOFF_BASE_MS") {
        config.export.backoff_base_ms = parse_override("EPIEXPORT_EXPORT_BACKOFF_BASE_MS", &val)?;
    }
    if let Ok(val) = std::env::var("EPIEXPORT_EXPORT_MAX_RATE_LIMIT_RETRIES") {
        config.export.max_rate_limit_retries =
            Some(parse_override("EPIEXPORT_EXPORT_MAX_RATE_LIMIT_RETRIES", &val)?);
    }
    if let Ok(val) = std::env::var("EPIEXPORT_EXPORT_STOP_ON_EMPTY_PAGE") {
        config.export.stop_on_empty_page = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("EPIEXPORT_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("EPIEXPORT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("EPIEXPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("EPIEXPORT_LOGGING_JSON_CONSOLE") {
        config.logging.json_console = val.parse().unwrap_or(false);
    }

    Ok(())
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        EpiError::Configuration(format!("Invalid value '{value}' for {name}"))
    })
}
