//! Plain-text audit log.
//!
//! Every store and service operation leaves one line in `logs.txt`:
//! `[YYYY-MM-DD HH:MM:SS] message`. The file is append-only and never
//! rotated. Writing to it can never fail a business operation; problems
//! are only reported on standard error.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: Arc<PathBuf>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a timestamped line.
    pub fn log(&self, message: impl AsRef<str>) {
        let line = format_line(&Local::now().format(TIMESTAMP_FORMAT).to_string(), message.as_ref());
        if let Err(err) = self.append(&line) {
            eprintln!("ERRO ao registrar log em {}: {err}", self.path.display());
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_ref())?;
        // one write call per line keeps short appends whole
        file.write_all(line.as_bytes())
    }
}

fn format_line(timestamp: &str, message: &str) -> String {
    format!("[{timestamp}] {message}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn appends_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("nested").join("logs.txt"));

        log.log("primeira");
        log.log("segunda");

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let pattern = Regex::new(r"^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\] (primeira|segunda)$").unwrap();
        assert!(lines.iter().all(|line| pattern.is_match(line)), "{contents}");
        assert!(lines[0].ends_with("primeira"));
        assert!(lines[1].ends_with("segunda"));
    }

    #[test]
    fn unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let log = AuditLog::new(dir.path());
        log.log("ignorado");
    }

    #[test]
    fn line_format() {
        assert_eq!(
            format_line("2025-11-05 10:00:00", "✓ ok"),
            "[2025-11-05 10:00:00] ✓ ok\n"
        );
    }
}
