//! Package dependency analysis for LaTeX projects.
//!
//! Given a root document, the analysis walks all transitively included
//! files, collects the packages they import and reports every command or
//! environment that belongs to a package which is never imported. Each
//! report comes with a fix that inserts the missing `\usepackage` line.

pub mod diag;

mod analyze;
mod cache;
mod complete;
mod fileset;
mod inject;
mod insert;
mod packages;
mod registry;

pub use self::analyze::{
    Element, Violation, analyze, analyze_commands, analyze_environments,
};
pub use self::cache::{Analyzer, Cached, MAX_CACHE_USES};
pub use self::complete::{Completion, CompletionKind, complete_environments};
pub use self::fileset::FileSet;
pub use self::inject::{inject_language, injected_language};
pub use self::insert::{Edit, Fix, apply_fix, plan_insertion};
pub use self::packages::{defined_names, included_packages};
pub use self::registry::{
    CommandEntry, EntryConfig, EnvironmentEntry, Package, Registry, RegistryConfig,
};

use texdep_syntax::{Document, FileId};

use crate::diag::FileResult;

/// Supplies documents to the analysis.
///
/// Implementors decide where documents come from: the file system, an
/// editor's open buffers or memory. The analysis never reads files by
/// itself.
pub trait World {
    /// The id of the main document.
    fn main(&self) -> FileId;

    /// Try to access the document with the given id.
    fn document(&self, id: FileId) -> FileResult<Document>;

    /// Resolve the target of an include command in `from`.
    ///
    /// Returns `None` if the target cannot be loaded. Missing includes are
    /// not an error for the analysis; the file is simply not part of the
    /// file set.
    fn resolve_include(&self, from: &Document, path: &str) -> Option<Document> {
        let id = from.id().join(path);
        match self.document(id) {
            Ok(document) => Some(document),
            Err(err) => {
                tracing::debug!(?id, %err, "skipping unresolvable include");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests;
