//! Purpose: Hold top-level CLI command dispatch for `dexrip`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Status lines, log files, and exit code semantics stay unchanged.
//! Invariants: Block semantics remain in the library's `blocks` modules.

use super::*;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "dexrip", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Blocks => {
            for name in BLOCK_NAMES {
                println!("{name}");
            }
            Ok(RunOutcome::ok())
        }
        Command::Personal(args) => run_block(blocks::personal::NAME, args),
        Command::Evolutions(args) => run_block(blocks::evolutions::NAME, args),
        Command::Weight(args) => run_block(blocks::weight::NAME, args),
        Command::Offspring(args) => run_block(blocks::offspring::NAME, args),
        Command::Moves(args) => run_block(blocks::moves::NAME, args),
        Command::Levelup(args) => run_block(blocks::levelup::NAME, args),
        Command::Egg(args) => run_block(blocks::egg::NAME, args),
        Command::Tutors(args) => run_block(blocks::tutors::NAME, args),
        Command::TutorLearnsets(args) => run_block(blocks::tutor_learnsets::NAME, args),
        Command::Encounters(args) => run_block(blocks::encounters::NAME, args),
        Command::Trainers(args) => run_block(blocks::trainers::NAME, args),
        Command::Constants(args) => run_block(blocks::constants::NAME, args),
        Command::All(args) => {
            let ctx = prepare(args)?;
            let mut summary = ExportSummary::new(&ctx.source_root)?;
            for name in BLOCK_NAMES {
                println!("> Running {name}...");
                match export_named(name, &ctx) {
                    Ok(run) => {
                        announce(&run);
                        summary.record_success(&run)?;
                    }
                    Err(err) => {
                        status::error(format!("{name}: {err}"));
                        summary.record_failure(name, &err);
                    }
                }
            }
            let summary_path = summary.write(&ctx.output_dir)?;
            status::ok(format!("summary written: {}", summary_path.display()));
            let failed = summary.failed_blocks();
            if failed > 0 {
                status::error(format!("{failed} block(s) failed"));
                return Ok(RunOutcome::with_code(1));
            }
            Ok(RunOutcome::ok())
        }
    }
}

fn run_block(name: &'static str, args: ExportArgs) -> Result<RunOutcome, Error> {
    let ctx = prepare(args)?;
    let run = export_named(name, &ctx)?;
    announce(&run);
    Ok(RunOutcome::ok())
}
