use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Range;
use std::sync::Arc;

use ecow::{EcoString, EcoVec};

use crate::{CommandKind, DefinitionKind, EditError, EditResult, FileId, Lines, Span};

/// A single command invocation, like `\usepackage[utf8]{inputenc}`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Command {
    name: EcoString,
    kind: CommandKind,
    required: EcoVec<EcoString>,
    optional: EcoVec<EcoString>,
    span: Span,
}

impl Command {
    /// Create a command without parameters.
    ///
    /// The name includes the escape prefix, e.g. `\usepackage`.
    pub fn new(name: impl Into<EcoString>, span: Span) -> Self {
        let name = name.into();
        Self {
            kind: CommandKind::of(&name),
            name,
            required: EcoVec::new(),
            optional: EcoVec::new(),
            span,
        }
    }

    /// Add a required parameter.
    pub fn with_required(mut self, param: impl Into<EcoString>) -> Self {
        self.required.push(param.into());
        self
    }

    /// Add an optional parameter.
    pub fn with_optional(mut self, param: impl Into<EcoString>) -> Self {
        self.optional.push(param.into());
        self
    }

    /// The command's name, including the escape prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the command is classified.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// The text of the required (`{..}`) parameters, in order.
    pub fn required(&self) -> &[EcoString] {
        &self.required
    }

    /// The text of the optional (`[..]`) parameters, in order.
    pub fn optional(&self) -> &[EcoString] {
        &self.optional
    }

    /// The text of the required parameter at `index`.
    pub fn required_param(&self, index: usize) -> Option<&str> {
        self.required.get(index).map(EcoString::as_str)
    }

    /// Where the command is in its document.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The name this command defines or redefines, if it is a definition of
    /// the given kind.
    pub fn defined_name(&self, kind: DefinitionKind) -> Option<&str> {
        (self.kind.defines() == Some(kind))
            .then(|| self.required_param(0))
            .flatten()
    }
}

impl Debug for Command {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.name)?;
        for param in &self.optional {
            write!(f, "[{param}]")?;
        }
        for param in &self.required {
            write!(f, "{{{param}}}")?;
        }
        write!(f, " @ {:?}", self.span)
    }
}

/// A `\begin{name} .. \end{name}` block.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Environment {
    name: EcoString,
    span: Span,
    name_span: Span,
    annotations: EcoVec<Annotation>,
}

impl Environment {
    /// Create an environment.
    ///
    /// `span` covers the whole block, starting at `\begin`. `name_span`
    /// covers the name inside of the `\begin{..}` braces.
    pub fn new(name: impl Into<EcoString>, span: Span, name_span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            name_span,
            annotations: EcoVec::new(),
        }
    }

    /// Attach the annotations found above the environment, top to bottom.
    pub fn with_annotations(mut self, annotations: EcoVec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// The environment's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The span of the whole block.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The span of the name inside of `\begin{..}`.
    pub fn name_span(&self) -> Span {
        self.name_span
    }

    /// The file the environment is in.
    pub fn id(&self) -> Option<FileId> {
        self.span.id()
    }

    /// The annotations directly above the environment, top to bottom.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The value of the first annotation with the given key.
    pub fn annotation(&self, key: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.key() == key)
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "env {} @ {:?}", self.name, self.span)
    }
}

/// Metadata written as a `%! key = value` comment above an environment.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Annotation {
    key: EcoString,
    value: Option<EcoString>,
}

impl Annotation {
    /// The key under which a language is injected into an environment.
    pub const INJECT_LANGUAGE: &'static str = "language";

    /// Create an annotation.
    pub fn new(key: impl Into<EcoString>, value: Option<EcoString>) -> Self {
        Self { key: key.into(), value }
    }

    /// Parse an annotation from a single comment line.
    ///
    /// Returns `None` if the comment is not an annotation.
    pub fn parse(comment: &str) -> Option<Self> {
        let rest = comment.trim().strip_prefix('%')?.strip_prefix('!')?;
        let (key, value) = match rest.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (rest.trim(), None),
        };

        if key.is_empty() || key.contains(char::is_whitespace) {
            return None;
        }

        Some(Self {
            key: key.into(),
            value: value.filter(|v| !v.is_empty()).map(Into::into),
        })
    }

    /// The annotation's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The annotation's value, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "%! {} = {value}", self.key),
            None => write!(f, "%! {}", self.key),
        }
    }
}

/// An immutable snapshot of a LaTeX file and the commands and environments
/// in it.
///
/// Cloning is cheap. Edits produce a new snapshot in place; clones taken
/// before an edit are unaffected.
#[derive(Clone)]
pub struct Document(Arc<Repr>);

/// The internal representation of a document.
#[derive(Clone)]
struct Repr {
    id: FileId,
    lines: Lines<String>,
    commands: Vec<Command>,
    environments: Vec<Environment>,
}

impl Document {
    /// Create a document by scanning its text.
    pub fn new(id: FileId, text: String) -> Self {
        let (commands, environments) = crate::scan(id, &text);
        Self::from_parts(id, text, commands, environments)
    }

    /// Create a document from an externally parsed tree.
    ///
    /// The commands and environments must be in source order and their spans
    /// must point into `text`.
    pub fn from_parts(
        id: FileId,
        text: String,
        commands: Vec<Command>,
        environments: Vec<Environment>,
    ) -> Self {
        Self(Arc::new(Repr { id, lines: Lines::new(text), commands, environments }))
    }

    /// Create a document that is not part of any project, for tests and
    /// one-off checks.
    pub fn detached(text: impl Into<String>) -> Self {
        Self::new(FileId::new("detached.tex"), text.into())
    }

    /// The id of the document's file.
    pub fn id(&self) -> FileId {
        self.0.id
    }

    /// The whole text.
    pub fn text(&self) -> &str {
        self.0.lines.text()
    }

    /// The line index of the text.
    pub fn lines(&self) -> Lines<String> {
        self.0.lines.clone()
    }

    /// Get the length of the text in bytes.
    pub fn len_bytes(&self) -> usize {
        self.0.lines.len_bytes()
    }

    /// All commands in the document, in source order.
    pub fn commands(&self) -> &[Command] {
        &self.0.commands
    }

    /// All environments in the document, ordered by their start.
    pub fn environments(&self) -> &[Environment] {
        &self.0.environments
    }

    /// The text within a range, if the range is valid.
    pub fn get(&self, range: Range<usize>) -> Option<&str> {
        self.text().get(range)
    }

    /// Insert text at a byte offset.
    ///
    /// Exactly one insertion is performed and no other byte changes. The
    /// commands and environments are scanned again afterwards, so that spans
    /// of the new snapshot are consistent with its text.
    pub fn insert(&mut self, offset: usize, text: &str) -> EditResult<()> {
        let len = self.len_bytes();
        if offset > len {
            return Err(EditError::OutOfBounds { offset, len });
        }

        if !self.text().is_char_boundary(offset) {
            return Err(EditError::NotCharBoundary { offset });
        }

        let inner = Arc::make_mut(&mut self.0);
        inner.lines.insert(offset, text);
        let (commands, environments) = crate::scan(inner.id, inner.lines.text());
        inner.commands = commands;
        inner.environments = environments;
        Ok(())
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Document({:?})", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_parse() {
        let annotation = Annotation::parse("%! language = python").unwrap();
        assert_eq!(annotation.key(), "language");
        assert_eq!(annotation.value(), Some("python"));
        assert_eq!(annotation.to_string(), "%! language = python");

        let flag = Annotation::parse("  %!draft").unwrap();
        assert_eq!(flag.key(), "draft");
        assert_eq!(flag.value(), None);
        assert_eq!(flag.to_string(), "%! draft");

        assert_eq!(Annotation::parse("% language = python"), None);
        assert_eq!(Annotation::parse("%! = python"), None);
        assert_eq!(Annotation::parse("%! two words"), None);
        assert_eq!(Annotation::parse("text"), None);
    }

    #[test]
    fn test_command_defined_name() {
        let span = Span::detached();
        let def = Command::new("\\newenvironment", span).with_required("proof");
        assert_eq!(def.defined_name(DefinitionKind::Environment), Some("proof"));
        assert_eq!(def.defined_name(DefinitionKind::Command), None);

        let bare = Command::new("\\renewcommand", span);
        assert_eq!(bare.defined_name(DefinitionKind::Command), None);
    }

    #[test]
    fn test_document_insert() {
        let mut doc = Document::detached("\\documentclass{article}\n\\begin{document}");
        let snapshot = doc.clone();
        doc.insert(23, "\n\\usepackage{url}").unwrap();
        assert_eq!(
            doc.text(),
            "\\documentclass{article}\n\\usepackage{url}\n\\begin{document}"
        );
        assert_eq!(doc.commands().len(), 3);
        assert_eq!(doc.commands()[1].kind(), CommandKind::UsePackage);
        assert_eq!(doc.lines().len_lines(), 3);
        assert_eq!(snapshot.commands().len(), 2);
    }

    #[test]
    fn test_document_insert_out_of_bounds() {
        let mut doc = Document::detached("ü");
        assert_eq!(
            doc.insert(5, "x"),
            Err(EditError::OutOfBounds { offset: 5, len: 2 })
        );
        assert_eq!(doc.insert(1, "x"), Err(EditError::NotCharBoundary { offset: 1 }));
        assert_eq!(doc.text(), "ü");
    }
}
