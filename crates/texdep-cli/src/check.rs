use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::term;
use ecow::eco_format;
use texdep_ide::diag::StrResult;
use texdep_ide::{Analyzer, Violation, World};
use texdep_syntax::FileId;

use crate::args::{CheckCommand, DiagnosticFormat};
use crate::set_failed;
use crate::terminal;
use crate::world::SystemWorld;

/// Execute a check command.
pub fn check(command: &CheckCommand) -> StrResult<()> {
    let world = SystemWorld::new(&command.common)?;
    let registry = crate::registry::load(&command.common)?;
    let main = world.document(world.main())?;

    let violations = Analyzer::new(registry).analyze(&world, &main);
    if violations.is_empty() {
        return Ok(());
    }

    set_failed();
    print_diagnostics(&world, &violations, command.diagnostic_format)
        .map_err(|err| eco_format!("failed to print diagnostics ({err})"))
}

/// Print one diagnostic per violation to the terminal.
pub fn print_diagnostics(
    world: &SystemWorld,
    violations: &[Violation],
    diagnostic_format: DiagnosticFormat,
) -> Result<(), codespan_reporting::files::Error> {
    let mut w = terminal::diagnostics_out(diagnostic_format);

    let mut config = term::Config { tab_width: 2, ..Default::default() };
    if diagnostic_format == DiagnosticFormat::Short {
        config.display_style = term::DisplayStyle::Short;
    }

    for violation in violations {
        let mut diag = Diagnostic::error().with_message(violation.message());
        if let Some(fix) = violation.fix() {
            diag = diag.with_notes(vec![eco_format!("hint: {}", fix.description()).into()]);
        }

        let diag = diag.with_labels(label(violation).into_iter().collect());
        term::emit(&mut w, &config, world, &diag)?;
    }

    Ok(())
}

/// Create a label for the highlighted part of a violation.
fn label(violation: &Violation) -> Option<Label<FileId>> {
    Some(Label::primary(violation.id()?, violation.range()))
}
