//! Export command implementation
//!
//! This module implements the `export` command: it pages through one dataset
//! on the dashboard backend and writes the rows to a CSV file.

use crate::adapters::backend::HttpPageFetcher;
use crate::cli::{EXIT_CANCELLED, EXIT_CONFIG, EXIT_EXPORT_FAILED, EXIT_FATAL, EXIT_OK};
use crate::config::{load_config, EpiExportConfig};
use crate::core::artifact::{self, ArtifactFormat};
use crate::core::export::{ExportOrchestrator, ExportOutcome, ExportSession};
use crate::domain::{QueryParams, QueryValue};
use crate::log_error_with_context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How often progress is printed while a run is in flight
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Resource to export, e.g. server://export-raw-data/
    pub url: String,

    /// Expected number of rows, from a prior count query
    #[arg(long)]
    pub total: u64,

    /// Query parameter, repeatable
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, QueryValue)>,

    /// Query parameters as a JSON object, applied before --param
    #[arg(long, value_name = "JSON")]
    pub params_json: Option<String>,

    /// Output file (default: <export.output_dir>/<resource>-<timestamp>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Artifact format: rows (single header, valid CSV) or raw (pages as received)
    #[arg(long, default_value_t = ArtifactFormat::Rows)]
    pub format: ArtifactFormat,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

fn parse_param(s: &str) -> Result<(String, QueryValue), String> {
    QueryParams::parse_pair(s)
}

impl ExportArgs {
    /// Query parameters from `--params-json` followed by `--param`
    pub fn query_params(&self) -> Result<QueryParams, String> {
        let mut params = match &self.params_json {
            Some(json) => {
                let value: serde_json::Value = serde_json::from_str(json)
                    .map_err(|e| format!("Invalid --params-json: {e}"))?;
                QueryParams::from_json_object(value)?
            }
            None => QueryParams::new(),
        };

        for (key, value) in &self.params {
            params.insert(key.clone(), value.clone());
        }
        Ok(params)
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(url = %self.url, total = self.total, "Starting export command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                log_error_with_context!(e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let params = match self.query_params() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if !self.yes && !self.confirm(&config, &params)? {
            println!("Export cancelled.");
            return Ok(EXIT_OK);
        }

        self.run(&config, params, shutdown_signal).await
    }

    fn confirm(&self, config: &EpiExportConfig, params: &QueryParams) -> anyhow::Result<bool> {
        use std::io::{self, Write};

        println!("Export Configuration:");
        println!("  Backend: {}", config.backend.endpoint);
        println!("  Resource: {}", self.url);
        println!("  Expected rows: {}", self.total);
        println!("  Page size: {}", config.export.page_size);
        println!("  Parameters: {}", params.len());
        println!();
        print!("Proceed with export? [y/N]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("y"))
    }

    async fn run(
        &self,
        config: &EpiExportConfig,
        params: QueryParams,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let fetcher = match HttpPageFetcher::new(&config.backend) {
            Ok(f) => Arc::new(f),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create page fetcher");
                eprintln!("Failed to initialize export: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let orchestrator = Arc::new(ExportOrchestrator::from_config(fetcher, &config.export));
        let session: ExportSession<Vec<String>> = ExportSession::new(orchestrator)
            .with_failure_handler(|failure| {
                eprintln!();
                eprintln!("❌ Export failed at offset {}", failure.offset);
                if let Some(status) = failure.status {
                    eprintln!("   Status: {status}");
                }
                eprintln!("   {}", failure.body);
            });

        println!("🚀 Starting export...");
        let handle = session.trigger(self.url.clone(), self.total, params);
        let wait = handle.wait();
        tokio::pin!(wait);

        let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
        ticker.tick().await;

        let outcome = loop {
            tokio::select! {
                outcome = &mut wait => break outcome?,
                _ = shutdown_requested(&mut shutdown_signal) => {
                    session.cancel();
                    println!();
                    println!("⚠️  Export cancelled, nothing was written.");
                    tracing::info!("Export interrupted by user signal");
                    return Ok(EXIT_CANCELLED);
                }
                _ = ticker.tick() => {
                    println!(
                        "   {} / {} rows ({:.1}%)",
                        session.row_count(),
                        self.total,
                        session.progress() * 100.0
                    );
                }
            }
        };

        match outcome {
            ExportOutcome::Succeeded(summary) => {
                let snapshot = session.snapshot();
                let path = self.output_path(config, summary.started_at);

                let written = match artifact::write_to_path(
                    &path,
                    self.format,
                    &snapshot.rows,
                    &snapshot.full_text,
                ) {
                    Ok(n) => n,
                    Err(e) => {
                        log_error_with_context!(e, "Failed to write artifact");
                        eprintln!("Failed to write {}: {e}", path.display());
                        return Ok(EXIT_FATAL);
                    }
                };

                println!();
                println!("📊 Export Summary:");
                println!("  Rows: {written} (expected {})", summary.total);
                println!("  Pages: {}", summary.pages_fetched);
                println!("  Rate-limit retries: {}", summary.rate_limit_retries);
                println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
                println!("  Output: {}", path.display());
                println!();
                if summary.is_complete() {
                    println!("✅ Export completed successfully!");
                } else {
                    println!("⚠️  Export completed with fewer rows than expected");
                }
                Ok(EXIT_OK)
            }
            ExportOutcome::Failed(failure) => {
                tracing::error!(offset = failure.offset, status = ?failure.status, "Export failed");
                Ok(EXIT_EXPORT_FAILED)
            }
            ExportOutcome::Superseded => {
                tracing::warn!("Export run was superseded");
                Ok(EXIT_CANCELLED)
            }
        }
    }

    fn output_path(&self, config: &EpiExportConfig, at: chrono::DateTime<chrono::Utc>) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => artifact::default_path(Path::new(&config.export.output_dir), &self.url, at),
        }
    }
}

/// Resolves once the shutdown flag is set; never resolves if the sender is gone
async fn shutdown_requested(signal: &mut watch::Receiver<bool>) {
    loop {
        if *signal.borrow_and_update() {
            return;
        }
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
