use rustc_hash::FxHashSet;
use texdep_syntax::{Command, CommandKind, Document, Environment, FileId, Span};

use crate::World;

/// The commands and environments of a document and of every document it
/// transitively includes.
///
/// Files are walked depth-first in include order. The content of an included
/// file appears right after the include command, like it does in the
/// typeset output. Each file is visited at most once, so include cycles
/// terminate.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    files: Vec<FileId>,
    commands: Vec<Command>,
    environments: Vec<Environment>,
}

impl FileSet {
    /// Walk the file set of `root`.
    ///
    /// Includes that cannot be resolved are skipped.
    pub fn extract(world: &dyn World, root: &Document) -> Self {
        let mut extractor = Extractor {
            world,
            set: Self::default(),
            visited: FxHashSet::default(),
            seen_commands: FxHashSet::default(),
            seen_environments: FxHashSet::default(),
        };
        extractor.visited.insert(root.id());
        extractor.visit(root);
        extractor.set
    }

    /// The files in the set, in the order they were first reached.
    pub fn files(&self) -> &[FileId] {
        &self.files
    }

    /// Whether the file is part of the set.
    pub fn contains(&self, id: FileId) -> bool {
        self.files.contains(&id)
    }

    /// All commands, in traversal order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// All environments, in traversal order.
    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }
}

struct Extractor<'a> {
    world: &'a dyn World,
    set: FileSet,
    visited: FxHashSet<FileId>,
    seen_commands: FxHashSet<Span>,
    seen_environments: FxHashSet<Span>,
}

impl Extractor<'_> {
    fn visit(&mut self, document: &Document) {
        self.set.files.push(document.id());

        let mut environments = document.environments().iter().peekable();
        for command in document.commands() {
            let start = command.span().start();
            while let Some(env) = environments.next_if(|env| env.span().start() <= start) {
                self.push_environment(env);
            }

            self.push_command(command);
            if command.kind() != CommandKind::Include {
                continue;
            }

            let Some(path) = command.required_param(0) else { continue };
            let Some(included) = self.world.resolve_include(document, path) else {
                continue;
            };

            if self.visited.insert(included.id()) {
                self.visit(&included);
            } else {
                tracing::trace!(id = ?included.id(), "file already visited");
            }
        }

        for env in environments {
            self.push_environment(env);
        }
    }

    fn push_command(&mut self, command: &Command) {
        if self.seen_commands.insert(command.span()) {
            self.set.commands.push(command.clone());
        }
    }

    fn push_environment(&mut self, env: &Environment) {
        if self.seen_environments.insert(env.span()) {
            self.set.environments.push(env.clone());
        }
    }
}
