use std::io::IsTerminal;

use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use crate::args::DiagnosticFormat;

/// A stream to stderr that is colored if stderr is a terminal.
pub fn out() -> StandardStream {
    let color_choice = if std::io::stderr().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };

    StandardStream::stderr(color_choice)
}

/// The stream diagnostics in the given format are written to.
///
/// Short diagnostics are meant for tools and never colored.
pub fn diagnostics_out(format: DiagnosticFormat) -> StandardStream {
    match format {
        DiagnosticFormat::Human => out(),
        DiagnosticFormat::Short => StandardStream::stderr(ColorChoice::Never),
    }
}
