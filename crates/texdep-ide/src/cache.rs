use std::sync::Arc;

use ecow::EcoString;
use rustc_hash::FxHashSet;
use texdep_syntax::{DefinitionKind, Document, FileId};

use crate::analyze::analyze_environments_with;
use crate::{
    FileSet, Registry, Violation, World, analyze_commands, defined_names,
    included_packages,
};

/// How often a cached value may be reused before it is computed again.
pub const MAX_CACHE_USES: usize = 40;

/// A value computed for a key, together with how often it was reused.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Cached<K, V> {
    key: K,
    value: V,
    uses: usize,
}

impl<K: PartialEq, V> Cached<K, V> {
    /// Cache a freshly computed value.
    pub fn new(key: K, value: V) -> Self {
        Self { key, value, uses: 0 }
    }

    /// Reuse the cached value or compute a new one.
    ///
    /// The value is recomputed if there is none yet, if it was computed for
    /// another key or if it was already reused `limit` times.
    pub fn get_or_recompute(
        cache: Option<Self>,
        key: K,
        limit: usize,
        f: impl FnOnce(&K) -> V,
    ) -> Self {
        match cache {
            Some(mut cached) if cached.key == key && cached.uses < limit => {
                cached.uses += 1;
                cached
            }
            _ => {
                let value = f(&key);
                Self::new(key, value)
            }
        }
    }

    /// The key the value was computed for.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// How often the value was reused since it was computed.
    pub fn uses(&self) -> usize {
        self.uses
    }
}

/// An analysis session for a host that runs many small queries, like an
/// editor highlighting each environment.
///
/// The names of user-defined environments are cached per root document for
/// a bounded number of queries. Results may thus lag behind edits to
/// definitions for a little while. Everything else is computed fresh.
#[derive(Debug, Clone)]
pub struct Analyzer {
    registry: Registry,
    limit: usize,
    definitions: Option<Cached<FileId, Arc<FxHashSet<EcoString>>>>,
}

impl Analyzer {
    /// Create a session that looks names up in `registry`.
    pub fn new(registry: Registry) -> Self {
        Self { registry, limit: MAX_CACHE_USES, definitions: None }
    }

    /// Change how often cached definitions may be reused.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// The registry of the session.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether an environment is defined or redefined by the user anywhere
    /// in the file set of `root`.
    pub fn defines_environment(
        &mut self,
        world: &dyn World,
        root: &Document,
        name: &str,
    ) -> bool {
        self.defined_environments(root.id(), || {
            let set = FileSet::extract(world, root);
            defined_names(set.commands(), DefinitionKind::Environment)
        })
        .contains(name)
    }

    /// Analyze the file set of `root`, like [`analyze`](crate::analyze).
    pub fn analyze(&mut self, world: &dyn World, root: &Document) -> Vec<Violation> {
        let set = FileSet::extract(world, root);
        let included = included_packages(set.commands());
        let defined = self.defined_environments(root.id(), || {
            defined_names(set.commands(), DefinitionKind::Environment)
        });

        let mut violations = analyze_commands(&self.registry, &set, &included);
        violations.extend(analyze_environments_with(
            &self.registry,
            set.environments(),
            &included,
            &defined,
        ));
        violations
    }

    fn defined_environments(
        &mut self,
        id: FileId,
        f: impl FnOnce() -> FxHashSet<EcoString>,
    ) -> Arc<FxHashSet<EcoString>> {
        let cached = Cached::get_or_recompute(self.definitions.take(), id, self.limit, |_| {
            tracing::trace!(?id, "collecting environment definitions");
            Arc::new(f())
        });
        let value = cached.value().clone();
        self.definitions = Some(cached);
        value
    }
}
