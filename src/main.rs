//! Purpose: `dexrip` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs export blocks, prints tagged
//! status lines on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `to_exit_code`.
//! Invariants: Block semantics live in the library; this crate only wires
//! arguments to workers.
#![allow(clippy::result_large_err)]
use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use dexrip::blocks::{self, BLOCK_NAMES, BlockRun, ExportContext, export_named};
use dexrip::core::error::{Error, ErrorKind, to_exit_code};
use dexrip::report::status;
use dexrip::summary::{ExportSummary, default_output_dir};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

#[derive(Parser)]
#[command(
    name = "dexrip",
    version,
    about = "Export structured game data from unpacked DS ROM contents into CSV tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ExportArgs {
    /// Top-level ROM contents folder.
    #[arg(long, value_hint = ValueHint::DirPath)]
    source: PathBuf,

    /// Output folder; a timestamped folder under ./output when omitted.
    #[arg(long, value_hint = ValueHint::DirPath)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Species personal data and machine learnsets.
    Personal(ExportArgs),
    /// Evolution methods per species.
    Evolutions(ExportArgs),
    /// Species weight table.
    Weight(ExportArgs),
    /// Breeding offspring table.
    Offspring(ExportArgs),
    /// Move battle parameters.
    Moves(ExportArgs),
    /// Level-up learnsets.
    Levelup(ExportArgs),
    /// Egg move learnsets.
    Egg(ExportArgs),
    /// Move tutor roster.
    Tutors(ExportArgs),
    /// Tutor-move compatibility flags per species.
    #[command(name = "tutor_learnsets")]
    TutorLearnsets(ExportArgs),
    /// Encounter sets for both game versions.
    Encounters(ExportArgs),
    /// Trainer rosters and parties.
    Trainers(ExportArgs),
    /// Text-archive constant tables.
    Constants(ExportArgs),
    /// Run every block and write a run summary.
    All(ExportArgs),
    /// List available block names.
    Blocks,
    /// Generate shell completion scripts.
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `dexrip --help` for usage."));
            }
        },
    };
    command_dispatch::dispatch_command(cli.command)
}

fn clap_error_summary(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}

/// Open the source root and the per-run output directory for one invocation.
fn prepare(args: ExportArgs) -> Result<ExportContext, Error> {
    if !args.source.is_dir() {
        return Err(Error::new(ErrorKind::NotFound)
            .with_message("source folder not found")
            .with_path(args.source)
            .with_hint("Point --source at the unpacked ROM contents root."));
    }
    let output_dir = match args.output {
        Some(dir) => dir,
        None => default_output_dir()?,
    };
    fs::create_dir_all(&output_dir).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to create output folder")
            .with_path(&output_dir)
            .with_source(err)
    })?;
    Ok(ExportContext::new(args.source, output_dir))
}

fn announce(run: &BlockRun) {
    for output in &run.outputs {
        status::export_complete(output);
    }
    if let Some(log) = &run.log {
        let message = format!("see log: {}", log.display());
        if run.had_warnings {
            status::warn(message);
        } else {
            status::info(message);
        }
    }
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        return;
    }
    let value = json!({
        "error": {
            "kind": format!("{:?}", err.kind()),
            "message": err.to_string(),
            "hint": err.hint(),
        }
    });
    let encoded = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{encoded}");
}
