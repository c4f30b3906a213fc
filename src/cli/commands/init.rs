//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "epiexport.toml")]
    pub output: String,

    /// Include comments explaining every option
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing epiexport configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set backend.endpoint in {}", self.output);
                println!("  2. If the backend needs a token, set EPIEXPORT_BACKEND_API_TOKEN");
                println!("     (or uncomment api_token and put it in a .env file)");
                println!("  3. Validate configuration: epiexport validate-config");
                println!("  4. Run export: epiexport export server://export-raw-data/ --total <rows>");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# epiexport configuration

[application]
log_level = "info"

[backend]
endpoint = "https://api.example.org/"
url_prefix = "server://"
timeout_seconds = 60
tls_verify = true
# api_token = "${EPIEXPORT_API_TOKEN}"

[export]
page_size = 3000
throttle_base_ms = 500
backoff_base_ms = 1000
stop_on_empty_page = true
output_dir = "."

[logging]
local_enabled = false
local_path = "/var/log/epiexport"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# epiexport configuration
#
# Values of the form ${VAR} are read from the environment (or a .env file).
# Any key can also be overridden with EPIEXPORT_<SECTION>_<KEY>, for example
# EPIEXPORT_BACKEND_ENDPOINT or EPIEXPORT_EXPORT_PAGE_SIZE.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error); --log-level takes precedence
log_level = "info"

# ============================================================================
# Dashboard Backend
# ============================================================================
[backend]
# Base URL that server:// resources resolve against. The rest of the resource
# path is appended as-is, so keep the trailing slash.
endpoint = "https://api.example.org/"

# Reserved prefix for backend-relative resources
url_prefix = "server://"

# Per-request timeout in seconds
timeout_seconds = 60

# TLS certificate verification
tls_verify = true

# Optional bearer token sent as "Authorization: Bearer <token>"
# api_token = "${EPIEXPORT_API_TOKEN}"

# ============================================================================
# Export Pipeline
# ============================================================================
[export]
# Rows requested per page (1-50000)
page_size = 3000

# Delay between successful pages is retry_budget^2 * throttle_base_ms
throttle_base_ms = 500

# Delay before retrying a 429 is retry_budget^2 * backoff_base_ms
backoff_base_ms = 1000

# Stop when a page comes back without rows, even if the expected total
# has not been reached
stop_on_empty_page = true

# Give up after this many consecutive 429 responses on one page
# (unset = keep retrying until cancelled)
# max_rate_limit_retries = 20

# Directory for artifacts when --output is not given
output_dir = "."

# ============================================================================
# Logging
# ============================================================================
[logging]
# Rotated JSON log files in addition to console output
local_enabled = false
local_path = "/var/log/epiexport"

# Rotation: daily, hourly or never
local_rotation = "daily"

# JSON console output instead of plain text
json_console = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_generated_configs_are_valid() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config = parse_config(&content).unwrap();
            config.validate().unwrap();
            assert_eq!(config.export.page_size, 3000);
            assert!(config.backend.api_token.is_none());
        }
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("epiexport.toml");
        fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_init_force_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("epiexport.toml");
        fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            with_examples: true,
            force: true,
        };

        assert_eq!(args.execute().await.unwrap(), EXIT_OK);
        assert!(fs::read_to_string(&path).unwrap().contains("[backend]"));
    }
}
