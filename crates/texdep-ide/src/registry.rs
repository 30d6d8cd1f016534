use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

use ecow::{EcoString, EcoVec, eco_format};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Deserialize;

use crate::diag::{StrResult, bail};

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// A LaTeX package together with the options it is imported with.
///
/// Two packages are equal if their names are equal; the options don't take
/// part in comparisons.
#[derive(Debug, Clone)]
pub struct Package {
    name: EcoString,
    parameters: EcoVec<EcoString>,
}

impl Package {
    /// The package of everything that needs no import.
    pub const DEFAULT: Self = Self { name: EcoString::new(), parameters: EcoVec::new() };

    /// Create a package without options.
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self { name: name.into(), parameters: EcoVec::new() }
    }

    /// Add an option the package is imported with.
    pub fn with_parameter(mut self, parameter: impl Into<EcoString>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    /// The package's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The options the package is imported with.
    pub fn parameters(&self) -> &[EcoString] {
        &self.parameters
    }

    /// Whether this is the package of built-ins, which needs no import.
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    /// Render the `\usepackage` command that imports this package.
    ///
    /// Must not be called for the default package.
    pub fn render_import(&self) -> EcoString {
        debug_assert!(!self.is_default());
        let mut import = EcoString::from("\\usepackage");
        if !self.parameters.is_empty() {
            import.push('[');
            for (i, parameter) in self.parameters.iter().enumerate() {
                if i > 0 {
                    import.push(',');
                }
                import.push_str(parameter);
            }
            import.push(']');
        }
        import.push('{');
        import.push_str(&self.name);
        import.push('}');
        import
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Display for Package {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(&self.name)
    }
}

/// What the registry knows about a command.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct CommandEntry {
    /// The command's name, including the escape prefix.
    pub name: EcoString,
    /// The package that defines the command.
    pub package: Package,
}

/// What the registry knows about an environment.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct EnvironmentEntry {
    /// The environment's name.
    pub name: EcoString,
    /// The package that defines the environment.
    pub package: Package,
    /// The arguments the environment is usually opened with, like `{cols}`
    /// for `tabular`.
    pub arguments: EcoVec<EcoString>,
}

/// Maps command and environment names to the packages defining them.
///
/// A name that maps to [`Package::DEFAULT`] is known but built into LaTeX. A
/// name without an entry is unknown and never constrained.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    commands: FxIndexMap<EcoString, CommandEntry>,
    environments: FxIndexMap<EcoString, EnvironmentEntry>,
}

impl Registry {
    /// A registry without any entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with the built-in knowledge of LaTeX and common packages.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for &(name, package, parameters) in COMMANDS {
            let package = builtin_package(package, parameters);
            registry.insert_command(CommandEntry { name: name.into(), package });
        }

        for &(name, package, arguments) in ENVIRONMENTS {
            registry.insert_environment(EnvironmentEntry {
                name: name.into(),
                package: builtin_package(package, &[]),
                arguments: arguments.iter().copied().map(EcoString::from).collect(),
            });
        }

        registry
    }

    /// The built-in registry, extended with entries from a TOML file.
    pub fn from_toml(text: &str) -> StrResult<Self> {
        let mut registry = Self::builtin();
        registry.extend(RegistryConfig::from_toml(text)?)?;
        Ok(registry)
    }

    /// Look up a command by its name, including the escape prefix.
    pub fn lookup_command(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    /// Look up an environment by its name.
    pub fn lookup_environment(&self, name: &str) -> Option<&EnvironmentEntry> {
        self.environments.get(name)
    }

    /// All known commands, in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &CommandEntry> {
        self.commands.values()
    }

    /// All known environments, in registration order.
    pub fn environments(&self) -> impl Iterator<Item = &EnvironmentEntry> {
        self.environments.values()
    }

    /// Add a command, replacing any entry with the same name.
    pub fn insert_command(&mut self, entry: CommandEntry) {
        self.commands.insert(entry.name.clone(), entry);
    }

    /// Add an environment, replacing any entry with the same name.
    pub fn insert_environment(&mut self, entry: EnvironmentEntry) {
        self.environments.insert(entry.name.clone(), entry);
    }

    /// Merge entries from a configuration file. Configured entries win over
    /// existing ones.
    ///
    /// Fails without changing the registry if an entry names a package that
    /// could not be imported by `\usepackage{..}` on its own.
    pub fn extend(&mut self, config: RegistryConfig) -> StrResult<()> {
        let mut commands = Vec::with_capacity(config.commands.len());
        for (name, entry) in config.commands {
            let package = entry.package().map_err(|err| eco_format!("{err} (in {name})"))?;
            let name = if name.starts_with('\\') { name } else { eco_format!("\\{name}") };
            commands.push(CommandEntry { name, package });
        }

        let mut environments = Vec::with_capacity(config.environments.len());
        for (name, entry) in config.environments {
            let package = entry.package().map_err(|err| eco_format!("{err} (in {name})"))?;
            let arguments = entry.arguments.into_iter().collect();
            environments.push(EnvironmentEntry { name, package, arguments });
        }

        for entry in commands {
            self.insert_command(entry);
        }
        for entry in environments {
            self.insert_environment(entry);
        }
        Ok(())
    }
}

/// Registry entries loaded from a TOML file.
///
/// ```toml
/// [commands."\\SI"]
/// package = "siunitx"
///
/// [environments.minted]
/// package = "minted"
/// arguments = ["{language}"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default)]
    pub commands: BTreeMap<EcoString, EntryConfig>,
    #[serde(default)]
    pub environments: BTreeMap<EcoString, EntryConfig>,
}

impl RegistryConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml(text: &str) -> StrResult<Self> {
        toml::from_str(text).map_err(|err| eco_format!("failed to parse registry ({err})"))
    }
}

/// A single configured command or environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryConfig {
    /// The defining package. Empty or missing for built-ins.
    #[serde(default)]
    pub package: EcoString,
    /// Options the package must be imported with.
    #[serde(default)]
    pub parameters: Vec<EcoString>,
    /// Default arguments, for environments.
    #[serde(default)]
    pub arguments: Vec<EcoString>,
}

impl EntryConfig {
    fn package(&self) -> StrResult<Package> {
        let name = self.package.trim();
        if let Some(c) = name.chars().find(|&c| is_reserved(c)) {
            bail!("package name {name:?} contains {c:?}");
        }

        let mut package = Package::new(name);
        if !package.is_default() {
            package.parameters = self.parameters.iter().cloned().collect();
        }
        Ok(package)
    }
}

/// Characters that never occur in a package name. A name containing one would
/// be split or cut off when the import is read back.
fn is_reserved(c: char) -> bool {
    matches!(c, ',' | '{' | '}' | '[' | ']' | '%' | '\\') || c.is_whitespace()
}

fn builtin_package(name: &str, parameters: &[&str]) -> Package {
    parameters
        .iter()
        .fold(Package::new(name), |package, &parameter| package.with_parameter(parameter))
}

const AMSMATH: &str = "amsmath";
const AMSSYMB: &str = "amssymb";
const AMSTHM: &str = "amsthm";
const GRAPHICX: &str = "graphicx";
const HYPERREF: &str = "hyperref";
const XCOLOR: &str = "xcolor";
const BOOKTABS: &str = "booktabs";

/// Built-in commands: name, package (empty for built-ins), options.
static COMMANDS: &[(&str, &str, &[&str])] = &[
    // LaTeX itself.
    ("\\documentclass", "", &[]),
    ("\\usepackage", "", &[]),
    ("\\begin", "", &[]),
    ("\\end", "", &[]),
    ("\\input", "", &[]),
    ("\\include", "", &[]),
    ("\\part", "", &[]),
    ("\\chapter", "", &[]),
    ("\\section", "", &[]),
    ("\\subsection", "", &[]),
    ("\\subsubsection", "", &[]),
    ("\\paragraph", "", &[]),
    ("\\label", "", &[]),
    ("\\ref", "", &[]),
    ("\\pageref", "", &[]),
    ("\\cite", "", &[]),
    ("\\emph", "", &[]),
    ("\\textbf", "", &[]),
    ("\\textit", "", &[]),
    ("\\texttt", "", &[]),
    ("\\footnote", "", &[]),
    ("\\item", "", &[]),
    ("\\caption", "", &[]),
    ("\\title", "", &[]),
    ("\\author", "", &[]),
    ("\\date", "", &[]),
    ("\\maketitle", "", &[]),
    ("\\tableofcontents", "", &[]),
    ("\\newcommand", "", &[]),
    ("\\renewcommand", "", &[]),
    ("\\newenvironment", "", &[]),
    ("\\renewenvironment", "", &[]),
    ("\\frac", "", &[]),
    ("\\sqrt", "", &[]),
    // amsmath
    ("\\text", AMSMATH, &[]),
    ("\\eqref", AMSMATH, &[]),
    ("\\dfrac", AMSMATH, &[]),
    ("\\tfrac", AMSMATH, &[]),
    ("\\binom", AMSMATH, &[]),
    ("\\DeclareMathOperator", AMSMATH, &[]),
    ("\\operatorname", AMSMATH, &[]),
    ("\\boldsymbol", AMSMATH, &[]),
    ("\\numberwithin", AMSMATH, &[]),
    // amssymb
    ("\\mathbb", AMSSYMB, &[]),
    ("\\mathfrak", AMSSYMB, &[]),
    ("\\varnothing", AMSSYMB, &[]),
    ("\\leqslant", AMSSYMB, &[]),
    ("\\geqslant", AMSSYMB, &[]),
    // amsthm
    ("\\theoremstyle", AMSTHM, &[]),
    ("\\qedhere", AMSTHM, &[]),
    // graphicx
    ("\\includegraphics", GRAPHICX, &[]),
    ("\\graphicspath", GRAPHICX, &[]),
    ("\\rotatebox", GRAPHICX, &[]),
    ("\\scalebox", GRAPHICX, &[]),
    ("\\resizebox", GRAPHICX, &[]),
    // hyperref
    ("\\href", HYPERREF, &[]),
    ("\\hypersetup", HYPERREF, &[]),
    ("\\autoref", HYPERREF, &[]),
    ("\\nameref", HYPERREF, &[]),
    ("\\url", "url", &[]),
    // xcolor
    ("\\textcolor", XCOLOR, &[]),
    ("\\colorbox", XCOLOR, &[]),
    ("\\definecolor", XCOLOR, &[]),
    // booktabs
    ("\\toprule", BOOKTABS, &[]),
    ("\\midrule", BOOKTABS, &[]),
    ("\\bottomrule", BOOKTABS, &[]),
    ("\\cmidrule", BOOKTABS, &[]),
    // Everything else.
    ("\\DeclareUnicodeCharacter", "inputenc", &["utf8"]),
    ("\\subfile", "subfiles", &[]),
    ("\\multirow", "multirow", &[]),
    ("\\cancel", "cancel", &[]),
    ("\\SI", "siunitx", &[]),
    ("\\si", "siunitx", &[]),
    ("\\num", "siunitx", &[]),
    ("\\lipsum", "lipsum", &[]),
    ("\\todo", "todonotes", &[]),
    ("\\lstinputlisting", "listings", &[]),
    ("\\lstset", "listings", &[]),
    ("\\ifthenelse", "ifthen", &[]),
    ("\\cref", "cleveref", &[]),
    ("\\Cref", "cleveref", &[]),
    ("\\geometry", "geometry", &[]),
    ("\\tikz", "tikz", &[]),
    ("\\usetikzlibrary", "tikz", &[]),
];

/// Built-in environments: name, package (empty for built-ins), arguments.
static ENVIRONMENTS: &[(&str, &str, &[&str])] = &[
    // LaTeX itself.
    ("document", "", &[]),
    ("abstract", "", &[]),
    ("itemize", "", &[]),
    ("enumerate", "", &[]),
    ("description", "", &[]),
    ("figure", "", &[]),
    ("table", "", &[]),
    ("tabular", "", &["{cols}"]),
    ("tabbing", "", &[]),
    ("center", "", &[]),
    ("flushleft", "", &[]),
    ("flushright", "", &[]),
    ("quote", "", &[]),
    ("quotation", "", &[]),
    ("verse", "", &[]),
    ("verbatim", "", &[]),
    ("equation", "", &[]),
    ("displaymath", "", &[]),
    ("math", "", &[]),
    ("array", "", &["{cols}"]),
    ("minipage", "", &["{width}"]),
    ("thebibliography", "", &["{widestlabel}"]),
    // amsmath
    ("align", AMSMATH, &[]),
    ("align*", AMSMATH, &[]),
    ("equation*", AMSMATH, &[]),
    ("gather", AMSMATH, &[]),
    ("gather*", AMSMATH, &[]),
    ("multline", AMSMATH, &[]),
    ("multline*", AMSMATH, &[]),
    ("split", AMSMATH, &[]),
    ("cases", AMSMATH, &[]),
    ("matrix", AMSMATH, &[]),
    ("pmatrix", AMSMATH, &[]),
    ("bmatrix", AMSMATH, &[]),
    // amsthm
    ("proof", AMSTHM, &[]),
    // Everything else.
    ("comment", "comment", &[]),
    ("lstlisting", "listings", &[]),
    ("minted", "minted", &["{language}"]),
    ("tikzpicture", "tikz", &[]),
    ("longtable", "longtable", &["{cols}"]),
    ("tabularx", "tabularx", &["{width}", "{cols}"]),
    ("subfigure", "subcaption", &["{width}"]),
    ("multicols", "multicol", &["{columns}"]),
    ("wrapfigure", "wrapfig", &["{placement}", "{width}"]),
    ("algorithm", "algorithm", &[]),
    ("algorithmic", "algorithmic", &[]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_render_import() {
        assert_eq!(Package::new("graphicx").render_import(), "\\usepackage{graphicx}");
        assert_eq!(
            Package::new("inputenc").with_parameter("utf8").render_import(),
            "\\usepackage[utf8]{inputenc}"
        );
        assert_eq!(
            Package::new("geometry")
                .with_parameter("a4paper")
                .with_parameter("margin=1in")
                .render_import(),
            "\\usepackage[a4paper,margin=1in]{geometry}"
        );
    }

    #[test]
    fn test_package_equality_by_name() {
        let plain = Package::new("inputenc");
        let configured = Package::new("inputenc").with_parameter("utf8");
        assert_eq!(plain, configured);
        assert_ne!(plain, Package::new("fontenc"));
        assert!(Package::DEFAULT.is_default());
        assert!(!plain.is_default());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = Registry::builtin();
        let entry = registry.lookup_command("\\includegraphics").unwrap();
        assert_eq!(entry.package, Package::new("graphicx"));

        // Known but built-in versus unknown.
        let section = registry.lookup_command("\\section").unwrap();
        assert!(section.package.is_default());
        assert_eq!(registry.lookup_command("\\myowncommand"), None);
        assert_eq!(registry.lookup_command("includegraphics"), None);

        let align = registry.lookup_environment("align").unwrap();
        assert_eq!(align.package.name(), "amsmath");
        let tabular = registry.lookup_environment("tabular").unwrap();
        assert!(tabular.package.is_default());
        assert_eq!(tabular.arguments.as_slice(), ["{cols}"]);

        let unicode = registry.lookup_command("\\DeclareUnicodeCharacter").unwrap();
        assert_eq!(unicode.package.parameters(), ["utf8"]);
    }

    #[test]
    fn test_registry_from_toml() {
        let registry = Registry::from_toml(
            r#"
            [commands."\\foo"]
            package = "foopkg"
            parameters = ["draft"]

            [commands.section]
            package = "titlesec"

            [environments.bar]
            package = "barpkg"
            arguments = ["{cols}"]

            [environments.align]
            "#,
        )
        .unwrap();

        let foo = registry.lookup_command("\\foo").unwrap();
        assert_eq!(foo.package.render_import(), "\\usepackage[draft]{foopkg}");
        let section = registry.lookup_command("\\section").unwrap();
        assert_eq!(section.package.name(), "titlesec");
        let bar = registry.lookup_environment("bar").unwrap();
        assert_eq!(bar.package.name(), "barpkg");
        assert_eq!(bar.arguments.as_slice(), ["{cols}"]);
        assert!(registry.lookup_environment("align").unwrap().package.is_default());
        assert!(registry.lookup_command("\\includegraphics").is_some());
    }

    #[test]
    fn test_registry_from_toml_errors() {
        let err = Registry::from_toml("[commands.foo]\npackages = \"x\"").unwrap_err();
        assert!(err.starts_with("failed to parse registry"));
        assert!(Registry::from_toml("commands = 1").is_err());
    }

    #[test]
    fn test_registry_from_toml_rejects_unimportable_names() {
        let err = Registry::from_toml("[commands.\"\\\\foo\"]\npackage = \"a,b\"").unwrap_err();
        assert_eq!(err.as_str(), "package name \"a,b\" contains ',' (in \\foo)");

        let err = Registry::from_toml("[environments.bar]\npackage = \"x y\"").unwrap_err();
        assert_eq!(err.as_str(), "package name \"x y\" contains ' ' (in bar)");

        for name in ["a}b", "{a}", "a%", "a[b]"] {
            let config = format!("[commands.foo]\npackage = {name:?}");
            assert!(Registry::from_toml(&config).is_err(), "{name}");
        }

        // Surrounding whitespace is trimmed and blank means built-in.
        let registry = Registry::from_toml(
            "[commands.foo]\npackage = \" foopkg \"\n[commands.bar]\npackage = \"  \"",
        )
        .unwrap();
        assert_eq!(registry.lookup_command("\\foo").unwrap().package.name(), "foopkg");
        assert!(registry.lookup_command("\\bar").unwrap().package.is_default());
    }

    #[test]
    fn test_registry_extend_is_atomic() {
        let mut registry = Registry::builtin();
        let config = RegistryConfig::from_toml(
            "[commands.first]\npackage = \"good\"\n[commands.second]\npackage = \"a,b\"",
        )
        .unwrap();
        assert!(registry.extend(config).is_err());
        assert_eq!(registry.lookup_command("\\first"), None);
    }
}
