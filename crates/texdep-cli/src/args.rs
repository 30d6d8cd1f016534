use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Finds LaTeX commands and environments whose package is never imported.
#[derive(Debug, Clone, Parser)]
#[clap(name = "texdep", version = crate::texdep_version(), author)]
pub struct CliArguments {
    /// The command to run
    #[command(subcommand)]
    pub command: Command,

    /// Sets the level of logging verbosity:
    /// -v = info, -vv = debug, -vvv = trace
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbosity: u8,
}

/// What to do.
#[derive(Debug, Clone, Subcommand)]
#[command()]
pub enum Command {
    /// Reports commands and environments with missing imports
    #[command(visible_alias = "c")]
    Check(CheckCommand),

    /// Adds the missing imports to the documents
    Fix(FixCommand),

    /// Lists the packages imported by a document and its includes
    Packages(PackagesCommand),

    /// Annotates an environment with the language of its body
    Inject(InjectCommand),
}

/// Reports commands and environments with missing imports
#[derive(Debug, Clone, Parser)]
pub struct CheckCommand {
    /// Shared arguments.
    #[clap(flatten)]
    pub common: SharedArgs,

    /// In which format to emit diagnostics
    #[clap(
        long,
        default_value_t = DiagnosticFormat::Human,
        value_parser = clap::value_parser!(DiagnosticFormat)
    )]
    pub diagnostic_format: DiagnosticFormat,
}

/// Adds the missing imports to the documents
#[derive(Debug, Clone, Parser)]
pub struct FixCommand {
    /// Shared arguments.
    #[clap(flatten)]
    pub common: SharedArgs,

    /// Prints the fixes without writing any file
    #[arg(long)]
    pub dry_run: bool,
}

/// Lists the packages imported by a document and its includes
#[derive(Debug, Clone, Parser)]
pub struct PackagesCommand {
    /// Shared arguments.
    #[clap(flatten)]
    pub common: SharedArgs,
}

/// Annotates an environment with the language of its body
#[derive(Debug, Clone, Parser)]
pub struct InjectCommand {
    /// Shared arguments.
    #[clap(flatten)]
    pub common: SharedArgs,

    /// A byte offset inside of the environment's `\begin{..}`
    #[arg(long)]
    pub offset: usize,

    /// The language id, e.g. `python`
    #[arg(long)]
    pub language: String,
}

/// Common arguments of all commands.
#[derive(Debug, Clone, Args)]
pub struct SharedArgs {
    /// Path to the input LaTeX file
    pub input: PathBuf,

    /// Configures the project root (defaults to the input's directory)
    #[clap(long = "root", env = "TEXDEP_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// A TOML file with additional commands and environments
    #[clap(long = "registry", env = "TEXDEP_REGISTRY", value_name = "FILE")]
    pub registry: Option<PathBuf>,
}

/// Which format to use for diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum)]
pub enum DiagnosticFormat {
    Human,
    Short,
}

impl Display for DiagnosticFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.to_possible_value()
            .expect("no values are skipped")
            .get_name()
            .fmt(f)
    }
}
