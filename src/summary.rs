//! Purpose: Run summary for full exports.
//! Exports: `ExportSummary`, `default_output_dir`.
//! Role: Collects per-block outcomes plus source checksums and writes the
//! `export_summary.txt` / `export_summary.json` pair.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use time::format_description;

use crate::blocks::BlockRun;
use crate::core::error::{Error, ErrorKind};

const SUMMARY_TEXT: &str = "export_summary.txt";
const SUMMARY_JSON: &str = "export_summary.json";

fn format_now(pattern: &str) -> Result<String, Error> {
    let format = format_description::parse(pattern).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid timestamp format")
            .with_source(err)
    })?;
    OffsetDateTime::now_utc().format(&format).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to format timestamp")
            .with_source(err)
    })
}

/// `output/<YYYY-MM-DD_HHMMSS>`, matching the per-run folder convention.
pub fn default_output_dir() -> Result<PathBuf, Error> {
    let stamp = format_now("[year]-[month]-[day]_[hour][minute][second]")?;
    Ok(Path::new("output").join(stamp))
}

#[derive(Debug, Serialize)]
pub struct SourceDigest {
    pub path: String,
    pub sha256: String,
    pub bytes: u64,
}

fn digest_file(path: &Path) -> Result<SourceDigest, Error> {
    let data = fs::read(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read source for checksum")
            .with_path(path)
            .with_source(err)
    })?;
    let digest = Sha256::digest(&data);
    let mut sha256 = String::with_capacity(64);
    for byte in digest {
        sha256.push_str(&format!("{byte:02x}"));
    }
    Ok(SourceDigest {
        path: path.display().to_string(),
        sha256,
        bytes: data.len() as u64,
    })
}

#[derive(Debug, Serialize)]
pub struct BlockSummary {
    pub block: String,
    pub ok: bool,
    pub warnings: bool,
    pub outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sources: Vec<SourceDigest>,
}

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub generated_at: String,
    pub source_root: String,
    pub blocks: Vec<BlockSummary>,
}

impl ExportSummary {
    pub fn new(source_root: &Path) -> Result<Self, Error> {
        Ok(Self {
            generated_at: format_now("[year]-[month]-[day] [hour]:[minute]:[second]")?,
            source_root: source_root.display().to_string(),
            blocks: Vec::new(),
        })
    }

    pub fn record_success(&mut self, run: &BlockRun) -> Result<(), Error> {
        let mut sources = Vec::with_capacity(run.sources.len());
        for path in &run.sources {
            sources.push(digest_file(path)?);
        }
        self.blocks.push(BlockSummary {
            block: run.block.to_string(),
            ok: true,
            warnings: run.had_warnings,
            outputs: run
                .outputs
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
            log: run.log.as_ref().map(|path| path.display().to_string()),
            error: None,
            sources,
        });
        Ok(())
    }

    pub fn record_failure(&mut self, block: &str, err: &Error) {
        self.blocks.push(BlockSummary {
            block: block.to_string(),
            ok: false,
            warnings: false,
            outputs: Vec::new(),
            log: None,
            error: Some(err.to_string()),
            sources: Vec::new(),
        });
    }

    pub fn failed_blocks(&self) -> usize {
        self.blocks.iter().filter(|block| !block.ok).count()
    }

    /// Write both renderings into `output_dir` and return the text path.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, Error> {
        let mut text = String::from("=== Export Summary ===\n");
        text.push_str(&format!("Timestamp: {}\n", self.generated_at));
        text.push_str(&format!("Source folder: {}\n\n", self.source_root));
        for block in &self.blocks {
            let status = if block.ok { "[OK] SUCCESS" } else { "[X] FAILED" };
            text.push_str(&format!("{}: {status}\n", block.block));
            if let Some(log) = &block.log {
                text.push_str(&format!("  Log: {log}\n"));
            }
            if let Some(error) = &block.error {
                text.push_str(&format!("  Error: {error}\n"));
            }
            for source in &block.sources {
                text.push_str(&format!(
                    "  sha256 {}  {} ({} bytes)\n",
                    source.sha256, source.path, source.bytes
                ));
            }
        }
        text.push_str("\nAll exports complete.\n");

        let text_path = output_dir.join(SUMMARY_TEXT);
        fs::write(&text_path, text).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write summary")
                .with_path(&text_path)
                .with_source(err)
        })?;

        let json = serde_json::to_string_pretty(self).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode summary")
                .with_source(err)
        })?;
        let json_path = output_dir.join(SUMMARY_JSON);
        fs::write(&json_path, json).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write summary")
                .with_path(&json_path)
                .with_source(err)
        })?;
        Ok(text_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn default_output_dir_is_timestamped() {
        let dir = default_output_dir().unwrap();
        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        // YYYY-MM-DD_HHMMSS
        assert_eq!(name.len(), 17);
        assert_eq!(&name[4..5], "-");
        assert_eq!(&name[10..11], "_");
    }

    #[test]
    fn summary_renders_both_formats() {
        let out = TempDir::new().unwrap();
        let source = out.path().join("blob.bin");
        fs::write(&source, b"abc").unwrap();

        let mut summary = ExportSummary::new(out.path()).unwrap();
        summary.record_success(&crate::blocks::BlockRun {
            block: "weight",
            sources: vec![source],
            outputs: vec![out.path().join("weight.csv")],
            log: None,
            had_warnings: false,
        }).unwrap();
        summary.record_failure("moves", &Error::new(ErrorKind::Truncated));
        assert_eq!(summary.failed_blocks(), 1);

        let text_path = summary.write(out.path()).unwrap();
        let text = fs::read_to_string(text_path).unwrap();
        assert!(text.contains("weight: [OK] SUCCESS"));
        assert!(text.contains("moves: [X] FAILED"));
        // sha256 of "abc"
        assert!(text.contains("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.path().join(SUMMARY_JSON)).unwrap())
                .unwrap();
        assert_eq!(json["blocks"][0]["ok"], true);
        assert_eq!(json["blocks"][1]["ok"], false);
    }
}
