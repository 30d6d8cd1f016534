//! Document model and command scanner for LaTeX sources.

mod document;
mod edit;
mod file;
mod kind;
mod lines;
mod scanner;
mod span;

pub use self::document::{Annotation, Command, Document, Environment};
pub use self::edit::{EditError, EditResult};
pub use self::file::FileId;
pub use self::kind::{CommandKind, DefinitionKind};
pub use self::lines::Lines;
pub use self::scanner::{is_newline, scan};
pub use self::span::Span;
