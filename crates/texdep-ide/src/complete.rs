use ecow::{EcoString, eco_format};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use texdep_syntax::{DefinitionKind, Document};

use crate::{EnvironmentEntry, FileSet, Registry, World};

/// Complete the name of an environment after `\begin{`.
///
/// Offers every environment of the registry and every environment the user
/// defines in the file set of `root`. A user definition replaces the
/// registry entry of the same name.
pub fn complete_environments(
    world: &dyn World,
    registry: &Registry,
    root: &Document,
) -> Vec<Completion> {
    let set = FileSet::extract(world, root);
    let defined: IndexSet<&str, FxBuildHasher> = set
        .commands()
        .iter()
        .filter_map(|command| command.defined_name(DefinitionKind::Environment))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    let mut completions: Vec<_> = registry
        .environments()
        .filter(|entry| !defined.contains(entry.name.as_str()))
        .map(Completion::from_entry)
        .collect();

    completions.extend(defined.into_iter().map(|name| Completion {
        kind: CompletionKind::UserEnvironment,
        label: name.into(),
        apply: None,
        detail: None,
    }));

    completions
}

/// An autocompletion option.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Completion {
    /// The kind of item this completes to.
    pub kind: CompletionKind,
    /// The label the completion is shown with.
    pub label: EcoString,
    /// The text that replaces the typed name, if it differs from the label:
    /// the name, the closing brace and the default arguments.
    pub apply: Option<EcoString>,
    /// The package that must be imported to use the environment.
    pub detail: Option<EcoString>,
}

impl Completion {
    fn from_entry(entry: &EnvironmentEntry) -> Self {
        let apply = (!entry.arguments.is_empty()).then(|| {
            let mut apply = eco_format!("{}}}", entry.name);
            for argument in &entry.arguments {
                apply.push_str(argument);
            }
            apply
        });

        Self {
            kind: CompletionKind::Environment,
            label: entry.name.clone(),
            apply,
            detail: (!entry.package.is_default()).then(|| entry.package.name().into()),
        }
    }
}

/// A kind of item that can be completed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CompletionKind {
    /// An environment known to the registry.
    Environment,
    /// An environment defined in the project.
    UserEnvironment,
}
