use ecow::{EcoString, eco_format};
use texdep_syntax::{CommandKind, Document, EditResult, FileId};

use crate::{Package, World};

/// A planned insertion of text into a document.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Edit {
    /// The byte offset to insert at.
    pub offset: usize,
    /// The text to insert.
    pub text: EcoString,
}

impl Edit {
    /// Create an edit.
    pub fn new(offset: usize, text: impl Into<EcoString>) -> Self {
        Self { offset, text: text.into() }
    }

    /// Apply the edit to a document.
    ///
    /// Fails if the document changed so much that the offset is no longer
    /// valid.
    pub fn apply(&self, document: &mut Document) -> EditResult<()> {
        document.insert(self.offset, &self.text)
    }
}

/// Plan the insertion of a `\usepackage` command for `package`.
///
/// Only the document's own commands are considered, not those of included
/// files. The import goes on a new line after the last `\usepackage`, or,
/// if there is none, after an empty line behind the first `\documentclass`.
/// Returns `None` if the document has neither, or for the default package.
pub fn plan_insertion(document: &Document, package: &Package) -> Option<Edit> {
    if package.is_default() {
        return None;
    }

    let commands = document.commands();
    let (anchor, separator) = match commands
        .iter()
        .rfind(|command| command.kind() == CommandKind::UsePackage)
    {
        Some(import) => (import, "\n"),
        None => {
            let class = commands
                .iter()
                .find(|command| command.kind() == CommandKind::DocumentClass)?;
            (class, "\n\n")
        }
    };

    Some(Edit::new(anchor.span().end(), eco_format!("{separator}{}", package.render_import())))
}

/// A quick fix that imports a missing package.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Fix {
    package: Package,
    target: FileId,
}

impl Fix {
    /// Create a fix that imports `package` in the document `target`.
    pub fn new(package: Package, target: FileId) -> Self {
        Self { package, target }
    }

    /// The package to import.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The document the import is added to.
    pub fn target(&self) -> FileId {
        self.target
    }

    /// A short description of the fix.
    pub fn description(&self) -> EcoString {
        eco_format!("Add import for package '{}'", self.package.name())
    }
}

/// Apply a fix to the current version of its target document.
///
/// Returns the edited document, or `None` if the fix is not applicable
/// because the target cannot be loaded or has no place for an import. The
/// caller is responsible for storing the result.
pub fn apply_fix(world: &dyn World, fix: &Fix) -> EditResult<Option<Document>> {
    let mut document = match world.document(fix.target) {
        Ok(document) => document,
        Err(err) => {
            tracing::debug!(id = ?fix.target, %err, "fix target is not available");
            return Ok(None);
        }
    };

    let Some(edit) = plan_insertion(&document, &fix.package) else {
        tracing::debug!(id = ?fix.target, "no place to import {}", fix.package);
        return Ok(None);
    };

    edit.apply(&mut document)?;
    tracing::info!(id = ?fix.target, "imported package {}", fix.package);
    Ok(Some(document))
}
