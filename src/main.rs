use anyhow::Result;
use emv::cli::{self, Args};
use emv::{EmvError, PatchMode, RunOptions, diff, logger};
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = cli::parse_args();

    logger::init_logging(args.verbose);

    if args.values.is_empty() {
        eprint!("{}", cli::usage());
        return ExitCode::FAILURE;
    }

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\nError: {}", e);
            if let Some(hint) = e.downcast_ref::<EmvError>().and_then(EmvError::hint) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &Args) -> Result<()> {
    let color = !args.no_color && diff::should_use_color();

    let options = RunOptions {
        mode: if args.dry_run { PatchMode::DryRun } else { PatchMode::Write },
        color,
    };

    let mut stdout = io::stdout().lock();
    let report = emv::run(&args.config, &args.values, args.target.as_deref(), options, &mut stdout)?;

    if args.dry_run {
        writeln!(
            stdout,
            "Dry run: {} file(s) would be updated. Re-run without --dry-run to apply.",
            report.changed_files()
        )?;
    }

    Ok(())
}
