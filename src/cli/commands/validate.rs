//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the epiexport configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        match config.validate() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                println!();
                println!("Configuration Summary:");
                println!("  Log Level: {}", config.application.log_level);
                println!("  Backend Endpoint: {}", config.backend.endpoint);
                println!("  URL Prefix: {}", config.backend.url_prefix);
                println!("  Timeout: {}s", config.backend.timeout_seconds);
                println!("  TLS Verify: {}", config.backend.tls_verify);
                println!(
                    "  API Token: {}",
                    if config.backend.api_token.is_some() { "set" } else { "not set" }
                );
                println!("  Page Size: {}", config.export.page_size);
                println!("  Throttle Base: {}ms", config.export.throttle_base_ms);
                println!("  Backoff Base: {}ms", config.export.backoff_base_ms);
                println!(
                    "  Rate-limit Retries: {}",
                    config
                        .export
                        .max_rate_limit_retries
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "unlimited".to_string())
                );
                println!("  Stop On Empty Page: {}", config.export.stop_on_empty_page);
                println!("  Output Directory: {}", config.export.output_dir);
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(EXIT_CONFIG)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[backend]\nendpoint = \"https://api.example.org/\"").unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[backend]\nendpoint = \"https://api.example.org/\"\n\n[export]\npage_size = 0"
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }

    #[tokio::test]
    async fn test_missing_config() {
        let code = ValidateArgs {}
            .execute("/nonexistent/epiexport.toml")
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
