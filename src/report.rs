//! Purpose: Collect per-block diagnostics and the tagged status-line contract.
//! Exports: `Report`, `Level`, `status`.
//! Role: Shared sink for non-fatal decode anomalies; one `log_<block>.txt` per
//! block, created only when something was logged.
//! Invariants: Warnings never alter CSV payloads and never become errors.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Info,
    Warn,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => f.write_str("[INFO]"),
            Level::Warn => f.write_str("[WARN]"),
        }
    }
}

/// Diagnostic sink for one block's export run.
#[derive(Debug, Default)]
pub struct Report {
    lines: Vec<(Level, String)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.lines.push((Level::Info, message.into()));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.lines.push((Level::Warn, message.into()));
    }

    pub fn extend_warnings(&mut self, messages: impl IntoIterator<Item = String>) {
        for message in messages {
            self.warn(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn has_warnings(&self) -> bool {
        self.lines.iter().any(|(level, _)| *level == Level::Warn)
    }

    /// Write `log_<block>.txt` under `output_dir` and return its path, or
    /// `None` when nothing was logged (no empty log files).
    pub fn write_log(&self, output_dir: &Path, block: &str) -> Result<Option<PathBuf>, Error> {
        if self.is_empty() {
            return Ok(None);
        }
        let path = output_dir.join(format!("log_{block}.txt"));
        let body = self
            .lines
            .iter()
            .map(|(level, message)| format!("{level} {message}"))
            .collect::<Vec<_>>()
            .join("\n")
            + "\n";
        fs::write(&path, body)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&path).with_source(err))?;
        Ok(Some(path))
    }
}

/// Tagged status lines on stdout, the contract every worker honors.
pub mod status {
    use std::path::Path;

    pub fn ok(message: impl AsRef<str>) {
        println!("[OK] {}", message.as_ref());
    }

    pub fn export_complete(path: &Path) {
        ok(format!("export complete: {}", path.display()));
    }

    pub fn warn(message: impl AsRef<str>) {
        println!("[WARN] {}", message.as_ref());
    }

    pub fn info(message: impl AsRef<str>) {
        println!("[INFO] {}", message.as_ref());
    }

    pub fn error(message: impl AsRef<str>) {
        println!("[ERROR] {}", message.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::Report;
    use std::fs;

    #[test]
    fn empty_report_writes_no_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = Report::new();
        let path = report.write_log(dir.path(), "moves").expect("write");
        assert!(path.is_none());
        assert!(!dir.path().join("log_moves.txt").exists());
    }

    #[test]
    fn log_lines_carry_level_tags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut report = Report::new();
        report.warn("non-zero padding at record 7");
        report.info("adjusted for reserved ids");
        let path = report
            .write_log(dir.path(), "weight")
            .expect("write")
            .expect("path");
        let body = fs::read_to_string(path).expect("read");
        assert!(body.contains("[WARN] non-zero padding at record 7"));
        assert!(body.contains("[INFO] adjusted for reserved ids"));
        assert!(report.has_warnings());
    }
}
