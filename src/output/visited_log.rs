//! Append-only audit log of fetched URLs
//!
//! The log is written for people and external tools; the crawler never reads
//! it back. Failing to write a line is logged and otherwise ignored.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug)]
pub struct VisitedLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl VisitedLog {
    /// Creates (truncating) the log and writes the run header
    pub fn create(
        path: impl AsRef<Path>,
        run_started: DateTime<Utc>,
        config_hash: &str,
    ) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        file.write_all(format_header(run_started, config_hash).as_bytes())?;
        file.flush()?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one `<timestamp>\t<url>` line
    pub fn record(&self, url: &str, at: DateTime<Utc>) {
        let line = format!("{}\t{}\n", at.to_rfc3339_opts(SecondsFormat::Millis, true), url);

        let result = match self.file.lock() {
            Ok(mut file) => file.write_all(line.as_bytes()).and_then(|_| file.flush()),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                "visited log lock poisoned",
            )),
        };

        if let Err(e) = result {
            tracing::warn!("Failed to record {} in {}: {}", url, self.path.display(), e);
        }
    }

    /// Records `url` with the current time
    pub fn record_now(&self, url: &str) {
        self.record(url, Utc::now());
    }
}

fn format_header(run_started: DateTime<Utc>, config_hash: &str) -> String {
    let mut header = String::from("# Visited URLs\n");
    header.push_str(&format!(
        "# Run started: {}\n",
        run_started.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    if !config_hash.is_empty() {
        header.push_str(&format!("# Config hash: {}\n", config_hash));
    }
    header.push('\n');
    header
}
