//! Export artifact
//!
//! Turns a finished session into a file. The `rows` format writes a single
//! header followed by every accumulated row; the `raw` format writes the
//! session's raw text as received.

use crate::domain::{EpiError, Result};
use chrono::{DateTime, Utc};
use csv::{StringRecord, WriterBuilder};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format of the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactFormat {
    /// Header plus parsed rows, valid CSV
    #[default]
    Rows,
    /// Raw page texts joined by commas
    Raw,
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rows" | "csv" => Ok(Self::Rows),
            "raw" => Ok(Self::Raw),
            other => Err(format!("Unknown artifact format '{other}' (expected rows or raw)")),
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows => write!(f, "rows"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

/// Header row of the first page in `full_text`, if any
pub fn header_of(full_text: &str) -> Result<Option<StringRecord>> {
    if full_text.is_empty() {
        return Ok(None);
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(full_text.as_bytes());
    let headers = reader.headers()?.clone();
    Ok((!headers.is_empty()).then_some(headers))
}

/// Write the artifact to `writer`, returning the number of data rows written
pub fn write_artifact<W: Write>(
    writer: W,
    format: ArtifactFormat,
    rows: &[Vec<String>],
    full_text: &str,
) -> Result<usize> {
    match format {
        ArtifactFormat::Raw => {
            let mut writer = writer;
            writer.write_all(full_text.as_bytes())?;
            writer.flush()?;
            Ok(rows.len())
        }
        ArtifactFormat::Rows => {
            let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);

            if let Some(headers) = header_of(full_text)? {
                wtr.write_record(&headers).map_err(write_error)?;
            }
            for row in rows {
                wtr.write_record(row).map_err(write_error)?;
            }
            wtr.flush()?;
            Ok(rows.len())
        }
    }
}

/// Write the artifact to a file, creating parent directories
pub fn write_to_path(
    path: &Path,
    format: ArtifactFormat,
    rows: &[Vec<String>],
    full_text: &str,
) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)
        .map_err(|e| EpiError::Io(format!("Failed to create {}: {e}", path.display())))?;
    let written = write_artifact(BufWriter::new(file), format, rows, full_text)?;

    tracing::info!(path = %path.display(), rows = written, format = %format, "Artifact written");
    Ok(written)
}

/// Default artifact path for an export of `url`
///
/// The file is named after the last path segment of the URL and the time of
/// the export, e.g. `export-raw-data-20250301T120000Z.csv`.
pub fn default_path(output_dir: &Path, url: &str, at: DateTime<Utc>) -> PathBuf {
    let without_query = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    let segment = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .find(|s| !s.is_empty() && !s.ends_with(':'))
        .unwrap_or("export");

    let slug: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let slug = if slug.trim_matches('-').is_empty() { "export".to_string() } else { slug };

    output_dir.join(format!("{slug}-{}.csv", at.format("%Y%m%dT%H%M%SZ")))
}

fn write_error(err: csv::Error) -> EpiError {
    EpiError::Io(format!("Failed to write CSV record: {err}"))
}
