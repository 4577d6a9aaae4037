//! Module resolution: from a name typed in a task to module metadata.
//!
//! # Algorithm
//!
//! 1. **Candidates.** A name with three or more dot-separated segments is
//!    already fully qualified (modules in collection sub-directories have
//!    more) and is the only candidate. Otherwise, in
//!    order: `ansible.builtin.<name>`, one candidate per collection declared
//!    in the document's role metadata, one per collection declared around
//!    the task.
//! 2. **Routing pass.** The first candidate with a routing entry is the hit.
//!    A live redirect (no tombstone) is followed by direct lookup of its
//!    target, then through further redirects up to [`MAX_REDIRECT_HOPS`].
//! 3. **Direct pass.** Without a redirect, the first candidate present in
//!    the index is the module; it becomes the hit if routing found none.
//! 4. **Materialization.** A found module's documentation is built once
//!    and shared by every later resolution.

use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use super::context::get_declared_collections;
use super::module::{ModuleDocumentation, ModuleMetadata};
use super::path::PathNode;
use super::routing::{PluginRoute, RoutingTable, split_fqcn};

/// Upper bound on redirect chains followed past the first target.
pub const MAX_REDIRECT_HOPS: usize = 8;

/// Collections declared by the role a document belongs to
/// (`meta/main.yml`), keyed by document URI.
pub trait DocumentMetadataSource: Send + Sync {
    fn collections_for(&self, document_uri: &str) -> Vec<String>;
}

// ============================================================================
// MODULE INDEX
// ============================================================================

/// Read-mostly catalogs of modules, documentation fragments and routing.
///
/// Cloning is shallow: entries are shared `Arc`s, so a clone can be edited
/// and swapped in while readers keep the old one.
#[derive(Clone, Debug, Default)]
pub struct ModuleIndex {
    modules: FxHashMap<String, Arc<ModuleMetadata>>,
    fragments: FxHashMap<String, Arc<ModuleMetadata>>,
    /// `namespace.collection` → routes.
    routing: FxHashMap<String, Arc<RoutingTable>>,
}

impl ModuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_module(&mut self, module: impl Into<Arc<ModuleMetadata>>) -> Option<Arc<ModuleMetadata>> {
        let module = module.into();
        self.modules.insert(module.fqcn.clone(), module)
    }

    pub fn insert_fragment(&mut self, fragment: impl Into<Arc<ModuleMetadata>>) -> Option<Arc<ModuleMetadata>> {
        let fragment = fragment.into();
        self.fragments.insert(fragment.fqcn.clone(), fragment)
    }

    /// Install the routes of one collection, replacing any previous table.
    pub fn insert_routing(&mut self, table: RoutingTable) -> Option<Arc<RoutingTable>> {
        self.routing.insert(table.collection.clone(), Arc::new(table))
    }

    pub fn remove_module(&mut self, fqcn: &str) -> Option<Arc<ModuleMetadata>> {
        self.modules.remove(fqcn)
    }

    pub fn remove_fragment(&mut self, fqcn: &str) -> Option<Arc<ModuleMetadata>> {
        self.fragments.remove(fqcn)
    }

    pub fn remove_routing(&mut self, collection: &str) -> Option<Arc<RoutingTable>> {
        self.routing.remove(collection)
    }

    pub fn module(&self, fqcn: &str) -> Option<&Arc<ModuleMetadata>> {
        self.modules.get(fqcn)
    }

    pub fn fragment(&self, fqcn: &str) -> Option<&Arc<ModuleMetadata>> {
        self.fragments.get(fqcn)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Arc<ModuleMetadata>> {
        self.modules.values()
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Arc<ModuleMetadata>> {
        self.fragments.values()
    }

    pub fn routing(&self, collection: &str) -> Option<&Arc<RoutingTable>> {
        self.routing.get(collection)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Routing entry for a fully qualified module name.
    pub fn module_route(&self, fqcn: &str) -> Option<&PluginRoute> {
        let (collection, name) = split_fqcn(fqcn)?;
        self.routing.get(collection)?.get(name)
    }

    /// Every name a task may use: indexed modules plus live redirects.
    /// Sorted.
    pub fn module_fqcns(&self) -> Vec<String> {
        let mut names: FxHashSet<String> = self.modules.keys().cloned().collect();
        for table in self.routing.values() {
            names.extend(table.live_redirect_fqcns());
        }
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort_unstable();
        names
    }

    /// Documentation of `module` with fragments from this index.
    pub fn documentation(&self, module: &ModuleMetadata) -> Option<Arc<ModuleDocumentation>> {
        module.documentation(|name| self.fragments.get(name).cloned())
    }

    /// Materialize the documentation of every module in parallel.
    ///
    /// Returns how many modules ended up documented.
    pub fn warm_documentation(&self) -> usize {
        let documented = self
            .modules
            .par_iter()
            .filter(|(_, module)| self.documentation(module).is_some())
            .count();
        tracing::debug!(
            "[INDEX] warmed documentation of {}/{} modules",
            documented,
            self.modules.len()
        );
        documented
    }
}

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

/// Outcome of [`ModuleResolver::resolve`].
///
/// `module` and `fqcn` are independent: a tombstoned route yields an FQCN
/// without a module.
#[derive(Clone, Debug, Default)]
pub struct ResolvedModule {
    pub module: Option<Arc<ModuleMetadata>>,
    /// The candidate that hit, in routing or in the index.
    pub fqcn: Option<String>,
    /// The routing entry of `fqcn`, when it has one.
    pub route: Option<PluginRoute>,
    pub documentation: Option<Arc<ModuleDocumentation>>,
}

impl ResolvedModule {
    pub fn is_found(&self) -> bool {
        self.module.is_some()
    }

    pub fn is_deprecated(&self) -> bool {
        self.route.as_ref().is_some_and(|r| r.deprecation.is_some())
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves module names against a [`ModuleIndex`].
pub struct ModuleResolver<'a> {
    index: &'a ModuleIndex,
    metadata: Option<&'a dyn DocumentMetadataSource>,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(index: &'a ModuleIndex) -> Self {
        Self {
            index,
            metadata: None,
        }
    }

    /// Consult role metadata for collections declared per document.
    pub fn with_metadata(mut self, metadata: &'a dyn DocumentMetadataSource) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn index(&self) -> &'a ModuleIndex {
        self.index
    }

    /// Fully qualified names to try for `search`, most specific first.
    pub fn candidates(
        &self,
        search: &str,
        context: Option<&[PathNode<'_>]>,
        document_uri: Option<&str>,
    ) -> Vec<String> {
        if search.split('.').count() >= 3 {
            return vec![search.to_string()];
        }

        let mut candidates = vec![format!("ansible.builtin.{search}")];
        if let (Some(uri), Some(metadata)) = (document_uri, self.metadata) {
            candidates.extend(
                metadata
                    .collections_for(uri)
                    .iter()
                    .map(|collection| format!("{collection}.{search}")),
            );
        }
        if let Some(path) = context {
            candidates.extend(
                get_declared_collections(path)
                    .iter()
                    .map(|collection| format!("{collection}.{search}")),
            );
        }
        candidates
    }

    /// Resolve `search` as typed at `context` in `document_uri`.
    pub fn resolve(
        &self,
        search: &str,
        context: Option<&[PathNode<'_>]>,
        document_uri: Option<&str>,
    ) -> ResolvedModule {
        let candidates = self.candidates(search, context, document_uri);
        tracing::trace!("[RESOLVE] '{}' candidates: {:?}", search, candidates);

        let mut resolved = ResolvedModule::default();

        let routed = candidates
            .iter()
            .find_map(|fqcn| self.index.module_route(fqcn).map(|route| (fqcn, route)));
        if let Some((fqcn, route)) = routed {
            tracing::trace!("[RESOLVE] '{}' routed via {}", search, fqcn);
            resolved.fqcn = Some(fqcn.clone());
            resolved.route = Some(route.clone());
        }

        match resolved.route.as_ref().and_then(PluginRoute::live_redirect) {
            Some(target) => {
                resolved.module = self.follow_redirect(target);
            }
            None => {
                if let Some((fqcn, module)) = candidates
                    .iter()
                    .find_map(|fqcn| self.index.module(fqcn).map(|module| (fqcn, module)))
                {
                    resolved.module = Some(Arc::clone(module));
                    if resolved.fqcn.is_none() {
                        resolved.fqcn = Some(fqcn.clone());
                    }
                }
            }
        }

        if let Some(module) = &resolved.module {
            resolved.documentation = self.index.documentation(module);
        } else {
            tracing::debug!(
                "[RESOLVE] '{}' has no module (hit: {:?})",
                search,
                resolved.fqcn
            );
        }
        resolved
    }

    /// Look up a redirect target, following further live redirects when the
    /// target itself is only a route.
    fn follow_redirect(&self, target: &str) -> Option<Arc<ModuleMetadata>> {
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut current = target;

        for hop in 0..=MAX_REDIRECT_HOPS {
            if let Some(module) = self.index.module(current) {
                return Some(Arc::clone(module));
            }
            if !visited.insert(current) {
                tracing::warn!("[RESOLVE] redirect cycle through {}", current);
                return None;
            }
            match self.index.module_route(current).and_then(PluginRoute::live_redirect) {
                Some(next) => {
                    tracing::trace!("[RESOLVE] hop {}: {} -> {}", hop + 1, current, next);
                    current = next;
                }
                None => return None,
            }
        }

        tracing::warn!(
            "[RESOLVE] redirect chain from {} exceeds {} hops",
            target,
            MAX_REDIRECT_HOPS
        );
        None
    }
}
