/// The role a command plays for dependency analysis.
///
/// Commands are classified once, by name, when they are created. Analysis
/// code matches on the kind instead of comparing raw command names.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CommandKind {
    /// `\usepackage`: imports one or more packages.
    UsePackage,
    /// `\documentclass`: declares the document class.
    DocumentClass,
    /// `\input`, `\include`, `\subfile`: pulls in another file.
    Include,
    /// `\begin`: opens an environment.
    Begin,
    /// `\end`: closes an environment.
    End,
    /// Defines a new command or environment.
    Definition(DefinitionKind),
    /// Redefines an existing command or environment.
    Redefinition(DefinitionKind),
    /// Any other command.
    Other,
}

/// What a definition or redefinition defines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DefinitionKind {
    Command,
    Environment,
}

impl CommandKind {
    /// Classify a command by its name, including the escape prefix.
    pub fn of(name: &str) -> Self {
        match name {
            "\\usepackage" => Self::UsePackage,
            "\\documentclass" => Self::DocumentClass,
            "\\input" | "\\include" | "\\subfile" => Self::Include,
            "\\begin" => Self::Begin,
            "\\end" => Self::End,
            "\\newcommand"
            | "\\providecommand"
            | "\\def"
            | "\\let"
            | "\\DeclareMathOperator"
            | "\\DeclareRobustCommand"
            | "\\NewDocumentCommand"
            | "\\ProvideDocumentCommand" => Self::Definition(DefinitionKind::Command),
            "\\renewcommand" | "\\RenewDocumentCommand" => {
                Self::Redefinition(DefinitionKind::Command)
            }
            "\\newenvironment"
            | "\\newtheorem"
            | "\\NewDocumentEnvironment"
            | "\\ProvideDocumentEnvironment" => {
                Self::Definition(DefinitionKind::Environment)
            }
            "\\renewenvironment" | "\\RenewDocumentEnvironment" => {
                Self::Redefinition(DefinitionKind::Environment)
            }
            _ => Self::Other,
        }
    }

    /// What this command defines or redefines, if anything.
    pub fn defines(self) -> Option<DefinitionKind> {
        match self {
            Self::Definition(kind) | Self::Redefinition(kind) => Some(kind),
            _ => None,
        }
    }
}
