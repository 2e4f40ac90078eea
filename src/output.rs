//! Result persistence as timestamped JSON files

use chrono::Local;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::models::ScrapeResult;

/// Serialize with four-space indentation; non-ASCII text is written as-is
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// `{prefix}_{YYYYMMDD_HHMMSS}.json` for the current local time
pub fn timestamped_file_name(prefix: &str) -> String {
    format!("{}_{}.json", prefix, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Writes scrape results into one directory
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
    file_prefix: String,
}

impl ResultWriter {
    pub fn new(output_dir: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_prefix: file_prefix.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the directory if needed and write `result`; returns the file path.
    /// A second write within the same second replaces the first file.
    pub async fn write(&self, result: &ScrapeResult) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ScrapeError::io(&self.output_dir, e))?;

        let path = self.output_dir.join(timestamped_file_name(&self.file_prefix));
        let json = to_pretty_json(result)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| ScrapeError::io(&path, e))?;

        debug!("Data saved to {}", path.display());
        Ok(path)
    }
}
