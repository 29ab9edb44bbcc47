//! Purpose: One module per export block, plus the shared worker context.
//! Exports: `ExportContext`, `BlockRun`, `BLOCK_NAMES`, `export_named`.
//! Role: Block modules hold the layout values and row schemas; everything
//! offset-shaped goes through `core`.
//! Invariants: Blocks are independent, read-only, and order-insensitive.
//! Invariants: Every species-keyed block resolves ids through the shared
//! `ExceptionPolicy::species()` value.

use std::path::PathBuf;

use crate::core::error::{Error, ErrorKind};
use crate::core::source::ByteSource;
use crate::report::Report;

pub mod constants;
pub mod egg;
pub mod encounters;
pub mod evolutions;
pub mod levelup;
pub mod moves;
pub mod offspring;
pub mod personal;
pub mod trainers;
pub mod tutor_learnsets;
pub mod tutors;
pub mod weight;

pub const BLOCK_NAMES: [&str; 12] = [
    personal::NAME,
    evolutions::NAME,
    weight::NAME,
    offspring::NAME,
    moves::NAME,
    levelup::NAME,
    egg::NAME,
    tutors::NAME,
    tutor_learnsets::NAME,
    encounters::NAME,
    trainers::NAME,
    constants::NAME,
];

/// Where one export run reads from and writes to. Blocks never resolve paths
/// on their own.
pub struct ExportContext {
    pub source_root: PathBuf,
    pub output_dir: PathBuf,
}

impl ExportContext {
    pub fn new(source_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn source_path(&self, rel: &str) -> Result<PathBuf, Error> {
        let path = self.source_root.join(rel);
        if !path.exists() {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message("source file not found")
                .with_path(path)
                .with_hint("Point --source at the unpacked ROM contents root."));
        }
        Ok(path)
    }

    pub fn open_source(&self, rel: &str) -> Result<(PathBuf, ByteSource), Error> {
        let path = self.source_path(rel)?;
        let source = ByteSource::open(&path)?;
        Ok((path, source))
    }

    pub fn out(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// Close out a block: write the log file (if anything was logged) and
    /// bundle what the driver needs for the run summary.
    pub fn finish(
        &self,
        block: &'static str,
        report: Report,
        sources: Vec<PathBuf>,
        outputs: Vec<PathBuf>,
    ) -> Result<BlockRun, Error> {
        let had_warnings = report.has_warnings();
        let log = report.write_log(&self.output_dir, block)?;
        Ok(BlockRun {
            block,
            sources,
            outputs,
            log,
            had_warnings,
        })
    }
}

/// What one completed block export produced.
#[derive(Debug)]
pub struct BlockRun {
    pub block: &'static str,
    /// Source files actually consumed, for the summary's checksums.
    pub sources: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub log: Option<PathBuf>,
    pub had_warnings: bool,
}

pub fn export_named(name: &str, ctx: &ExportContext) -> Result<BlockRun, Error> {
    match name {
        _ if name == personal::NAME => personal::export(ctx),
        _ if name == evolutions::NAME => evolutions::export(ctx),
        _ if name == weight::NAME => weight::export(ctx),
        _ if name == offspring::NAME => offspring::export(ctx),
        _ if name == moves::NAME => moves::export(ctx),
        _ if name == levelup::NAME => levelup::export(ctx),
        _ if name == egg::NAME => egg::export(ctx),
        _ if name == tutors::NAME => tutors::export(ctx),
        _ if name == tutor_learnsets::NAME => tutor_learnsets::export(ctx),
        _ if name == encounters::NAME => encounters::export(ctx),
        _ if name == trainers::NAME => trainers::export(ctx),
        _ if name == constants::NAME => constants::export(ctx),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("unknown block '{name}'"))
            .with_hint(format!("Known blocks: {}.", BLOCK_NAMES.join(", ")))),
    }
}
