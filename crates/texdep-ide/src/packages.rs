use ecow::EcoString;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashSet};
use texdep_syntax::{Command, CommandKind, DefinitionKind};

/// Collect the names of all packages imported by `\usepackage` commands.
///
/// A single command may import multiple packages, separated by commas. Names
/// are in the order of their first import.
pub fn included_packages<'a>(
    commands: impl IntoIterator<Item = &'a Command>,
) -> IndexSet<EcoString, FxBuildHasher> {
    let mut packages = IndexSet::default();
    for command in commands {
        if command.kind() != CommandKind::UsePackage {
            continue;
        }

        let Some(list) = command.required_param(0) else { continue };
        packages.extend(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(EcoString::from),
        );
    }
    packages
}

/// Collect the names that are defined or redefined by the user, for either
/// commands or environments.
pub fn defined_names<'a>(
    commands: impl IntoIterator<Item = &'a Command>,
    kind: DefinitionKind,
) -> FxHashSet<EcoString> {
    commands
        .into_iter()
        .filter_map(|command| command.defined_name(kind))
        .map(|name| EcoString::from(name.trim()))
        .collect()
}
