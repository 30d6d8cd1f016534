use std::process::ExitCode;

use texdep_cli::args::Command;
use texdep_cli::{ARGS, EXIT, print_error, set_failed};
use texdep_ide::diag::StrResult;

/// Entry point.
fn main() -> ExitCode {
    texdep_cli::tracing::setup_tracing(&ARGS);

    if let Err(msg) = dispatch() {
        set_failed();
        print_error(&msg).expect("failed to print error");
    }

    EXIT.with(|cell| cell.get())
}

/// Execute the requested command.
fn dispatch() -> StrResult<()> {
    match &ARGS.command {
        Command::Check(command) => texdep_cli::check::check(command)?,
        Command::Fix(command) => texdep_cli::fix::fix(command)?,
        Command::Packages(command) => texdep_cli::packages::packages(command)?,
        Command::Inject(command) => texdep_cli::inject::inject(command)?,
    }

    Ok(())
}
