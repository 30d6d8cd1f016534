use std::ops::Range;

use ecow::{EcoString, eco_format};
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashSet};
use texdep_syntax::{Command, DefinitionKind, Document, Environment, FileId, Span};

use crate::{FileSet, Fix, Package, Registry, World, defined_names, included_packages};

/// Find all commands and environments in the file set of `root` that belong
/// to a package which is never imported.
///
/// The analysis runs in two passes, one over commands and one over
/// environments. The result is therefore not in traversal order overall: all
/// command violations come first, then all environment violations, and each
/// group is in the traversal order of the file set. An environment that
/// begins before a command is still reported after it.
///
/// Analysis never fails: unknown names, unresolvable includes and malformed
/// imports are skipped.
pub fn analyze(world: &dyn World, registry: &Registry, root: &Document) -> Vec<Violation> {
    let set = FileSet::extract(world, root);
    let included = included_packages(set.commands());
    let mut violations = analyze_commands(registry, &set, &included);
    violations.extend(analyze_environments(registry, &set, &included));
    violations
}

/// Report commands whose package is not imported.
///
/// Commands the user defines or redefines somewhere in the file set are
/// never reported.
pub fn analyze_commands(
    registry: &Registry,
    set: &FileSet,
    included: &IndexSet<EcoString, FxBuildHasher>,
) -> Vec<Violation> {
    let defined = defined_names(set.commands(), DefinitionKind::Command);
    set.commands()
        .iter()
        .filter(|command| !defined.contains(command.name()))
        .filter_map(|command| {
            let entry = registry.lookup_command(command.name())?;
            let package = missing(&entry.package, included)?;
            Some(Violation {
                highlight: 0..command.name().len(),
                element: Element::Command(command.clone()),
                package: package.clone(),
            })
        })
        .collect()
}

/// Report environments whose package is not imported.
///
/// Environments the user defines or redefines somewhere in the file set are
/// never reported.
pub fn analyze_environments(
    registry: &Registry,
    set: &FileSet,
    included: &IndexSet<EcoString, FxBuildHasher>,
) -> Vec<Violation> {
    let defined = defined_names(set.commands(), DefinitionKind::Environment);
    analyze_environments_with(registry, set.environments(), included, &defined)
}

/// Report environments whose package is not imported, given the names of
/// user-defined environments.
pub(crate) fn analyze_environments_with(
    registry: &Registry,
    environments: &[Environment],
    included: &IndexSet<EcoString, FxBuildHasher>,
    defined: &FxHashSet<EcoString>,
) -> Vec<Violation> {
    environments
        .iter()
        .filter(|env| !defined.contains(env.name()))
        .filter_map(|env| {
            let entry = registry.lookup_environment(env.name())?;
            let package = missing(&entry.package, included)?;
            let start = env.name_span().start().saturating_sub(env.span().start());
            Some(Violation {
                highlight: start..start + env.name_span().len(),
                element: Element::Environment(env.clone()),
                package: package.clone(),
            })
        })
        .collect()
}

/// The package, if it needs an import that is not there yet.
fn missing<'a>(
    package: &'a Package,
    included: &IndexSet<EcoString, FxBuildHasher>,
) -> Option<&'a Package> {
    (!package.is_default() && !included.contains(package.name())).then_some(package)
}

/// A command or environment that is reported by the analysis.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Element {
    Command(Command),
    Environment(Environment),
}

impl Element {
    /// The element's name. Command names include the escape prefix.
    pub fn name(&self) -> &str {
        match self {
            Self::Command(command) => command.name(),
            Self::Environment(env) => env.name(),
        }
    }

    /// The span of the whole element.
    pub fn span(&self) -> Span {
        match self {
            Self::Command(command) => command.span(),
            Self::Environment(env) => env.span(),
        }
    }

    /// How the element is called in messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Command(_) => "Command",
            Self::Environment(_) => "Environment",
        }
    }
}

/// A command or environment whose package is not imported.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Violation {
    element: Element,
    package: Package,
    highlight: Range<usize>,
}

impl Violation {
    /// The offending command or environment.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// The package that must be imported.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The highlighted part of the element, relative to its start.
    pub fn highlight(&self) -> Range<usize> {
        self.highlight.clone()
    }

    /// The highlighted part of the element, in its document.
    pub fn span(&self) -> Span {
        self.element.span().slice(self.highlight.clone())
    }

    /// The highlighted byte range in the element's document.
    pub fn range(&self) -> Range<usize> {
        self.span().range()
    }

    /// The file the element is in.
    pub fn id(&self) -> Option<FileId> {
        self.element.span().id()
    }

    /// A message describing the problem.
    pub fn message(&self) -> EcoString {
        eco_format!("{} requires {} package", self.element.kind_name(), self.package.name())
    }

    /// The fix that imports the missing package in the element's document.
    ///
    /// Returns `None` for elements without a file.
    pub fn fix(&self) -> Option<Fix> {
        Some(Fix::new(self.package.clone(), self.id()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TestWorld;

    fn messages(world: &TestWorld) -> Vec<EcoString> {
        analyze(world, &Registry::builtin(), &world.main)
            .iter()
            .map(Violation::message)
            .collect()
    }

    #[test]
    fn test_analyze_missing_command() {
        let world = TestWorld::new(
            "\\documentclass{article}\n\\begin{document}\n\\includegraphics{cat}\n\\end{document}",
        );
        let violations = analyze(&world, &Registry::builtin(), &world.main);
        assert_eq!(violations.len(), 1);

        let violation = &violations[0];
        assert_eq!(violation.message(), "Command requires graphicx package");
        assert_eq!(violation.highlight(), 0..16);
        assert_eq!(world.main.get(violation.range()), Some("\\includegraphics"));

        let fix = violation.fix().unwrap();
        assert_eq!(fix.description(), "Add import for package 'graphicx'");
        assert_eq!(fix.target(), TestWorld::main_id());
    }

    #[test]
    fn test_analyze_included_package() {
        let world = TestWorld::new(
            "\\usepackage{amsmath, graphicx}\n\\includegraphics{cat}\\text{a}",
        );
        assert!(messages(&world).is_empty());
    }

    #[test]
    fn test_analyze_import_in_included_file() {
        let world = TestWorld::new("\\input{preamble}\n\\includegraphics{cat}")
            .with_source("preamble.tex", "\\usepackage{graphicx}");
        assert!(messages(&world).is_empty());
    }

    #[test]
    fn test_analyze_unknown_and_builtin() {
        let world = TestWorld::new(
            "\\section{A}\\myowncommand\\begin{foo}\\end{foo}\\begin{itemize}\\end{itemize}",
        );
        assert!(messages(&world).is_empty());
    }

    #[test]
    fn test_analyze_missing_environment() {
        let world =
            TestWorld::new("\\begin{document}\n\\begin{align}\nx\n\\end{align}\n\\end{document}");
        let violations = analyze(&world, &Registry::builtin(), &world.main);
        assert_eq!(violations.len(), 1);

        let violation = &violations[0];
        assert_eq!(violation.message(), "Environment requires amsmath package");
        assert_eq!(violation.highlight(), 7..12);
        assert_eq!(world.main.get(violation.range()), Some("align"));
    }

    #[test]
    fn test_analyze_environment_with_spaced_name() {
        let world = TestWorld::new("\\begin { tikzpicture }\\end{tikzpicture}");
        let violations = analyze(&world, &Registry::builtin(), &world.main);
        assert_eq!(violations.len(), 1);
        assert_eq!(world.main.get(violations[0].range()), Some("tikzpicture"));
    }

    #[test]
    fn test_analyze_user_definitions_shadow() {
        let world = TestWorld::new(
            "\\newenvironment{proof}{}{}\n\\newcommand{\\text}[1]{#1}\n\
             \\begin{proof}\\text{x}\\end{proof}\\begin{align}\\end{align}",
        );
        assert_eq!(messages(&world), ["Environment requires amsmath package"]);
    }

    #[test]
    fn test_analyze_definition_in_included_file() {
        let world = TestWorld::new("\\input{macros}\\begin{proof}\\end{proof}")
            .with_source("macros.tex", "\\renewenvironment{proof}{}{}");
        assert!(messages(&world).is_empty());
    }

    #[test]
    fn test_analyze_order() {
        let world = TestWorld::new("\\begin{align}\\end{align}\\url{x}\\input{a}\\href{y}{z}")
            .with_source("a.tex", "\\includegraphics{a}\\begin{proof}\\end{proof}");
        assert_eq!(
            messages(&world),
            [
                "Command requires url package",
                "Command requires graphicx package",
                "Command requires hyperref package",
                "Environment requires amsmath package",
                "Environment requires amsthm package",
            ]
        );
    }

    #[test]
    fn test_analyze_fix_targets_element_document() {
        let world = TestWorld::new("\\documentclass{article}\\input{chapter}")
            .with_source("chapter.tex", "\\url{x}");
        let violations = analyze(&world, &Registry::builtin(), &world.main);
        let fix = violations[0].fix().unwrap();
        assert_eq!(fix.target(), FileId::new("chapter.tex"));
    }

    #[test]
    fn test_analyze_reports_every_occurrence() {
        let world = TestWorld::new("\\url{a}\\url{b}");
        assert_eq!(messages(&world).len(), 2);
    }
}
