//! WorkspaceIndex: the module index of one workspace folder and the narrow
//! ways it changes.
//!
//! Readers take a [`snapshot`](WorkspaceIndex::snapshot) (an
//! `Arc<ModuleIndex>`) and keep it for the whole request. Invalidation
//! clones the index if a snapshot is still out, edits the clone, and swaps
//! it in, so in-flight resolutions never see a half-updated index.
//!
//! Collections next to a playbook (`<playbook dir>/collections`) get their
//! own index, built on first use and searched before the workspace's.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::config::WorkspaceConfig;
use super::error::IndexError;
use super::locator::{ModuleSources, discover_sources};
use super::metadata::{DocumentMetadataLibrary, uri_to_path};
use crate::hir::{ModuleIndex, ModuleResolver, PathNode, ResolvedModule, RoutingTable};

/// What a discovered file contributes to the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexedSource {
    Module(String),
    Fragment(String),
    /// Routing of the named `namespace.collection`.
    Routing(String),
}

/// Module index plus role metadata for one workspace.
#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    index: RwLock<Arc<ModuleIndex>>,
    metadata: DocumentMetadataLibrary,
    sources: FxHashMap<PathBuf, IndexedSource>,
    errors: Vec<IndexError>,
    /// Whether `<playbook dir>/collections` is searched first.
    adjacent_collections: bool,
    /// Configured collections paths; never indexed a second time as adjacent.
    collections_paths: Vec<PathBuf>,
    adjacent: RwLock<FxHashMap<PathBuf, Arc<ModuleIndex>>>,
}

impl WorkspaceIndex {
    /// An index over nothing; every name stays unresolved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover and index everything `config` points at.
    pub fn load(config: &WorkspaceConfig) -> Self {
        let mut workspace = Self::from_sources(discover_sources(config));
        workspace.adjacent_collections = config.playbook_adjacent_collections;
        workspace.collections_paths = config.collections_paths.clone();
        workspace
    }

    /// Index discovered sources. Module documentation is read lazily;
    /// routing files are read now.
    pub fn from_sources(sources: ModuleSources) -> Self {
        let (index, indexed, errors) = index_sources(sources);
        Self::from_index(index).with_sources(indexed, errors)
    }

    /// Wrap an index built elsewhere.
    pub fn from_index(index: ModuleIndex) -> Self {
        Self {
            index: RwLock::new(Arc::new(index)),
            ..Self::default()
        }
    }

    fn with_sources(mut self, sources: FxHashMap<PathBuf, IndexedSource>, errors: Vec<IndexError>) -> Self {
        self.sources = sources;
        self.errors = errors;
        self
    }

    /// The current index. Stays valid and unchanged while held.
    pub fn snapshot(&self) -> Arc<ModuleIndex> {
        Arc::clone(&self.index.read())
    }

    pub fn metadata(&self) -> &DocumentMetadataLibrary {
        &self.metadata
    }

    /// Errors met while loading; none of them stopped the load.
    pub fn errors(&self) -> &[IndexError] {
        &self.errors
    }

    pub fn source_kind(&self, path: &Path) -> Option<&IndexedSource> {
        self.sources.get(path)
    }

    /// Resolve `name` against playbook-adjacent collections, then the
    /// current snapshot and role metadata.
    pub fn resolve_module(
        &self,
        name: &str,
        context: Option<&[PathNode<'_>]>,
        document_uri: Option<&str>,
    ) -> ResolvedModule {
        if let Some(adjacent) = document_uri.and_then(|uri| self.adjacent_index(uri)) {
            let resolved = ModuleResolver::new(&adjacent)
                .with_metadata(&self.metadata)
                .resolve(name, context, document_uri);
            if resolved.is_found() {
                return resolved;
            }
        }
        let index = self.snapshot();
        ModuleResolver::new(&index)
            .with_metadata(&self.metadata)
            .resolve(name, context, document_uri)
    }

    /// The index of `<dir of document>/collections`, built on first use.
    pub fn adjacent_index(&self, document_uri: &str) -> Option<Arc<ModuleIndex>> {
        if !self.adjacent_collections {
            return None;
        }
        let path = uri_to_path(document_uri).ok()?;
        let collections = path.parent()?.join("collections");
        if self.collections_paths.contains(&collections) {
            return None;
        }
        if let Some(index) = self.adjacent.read().get(&collections) {
            return Some(Arc::clone(index));
        }
        if !collections.join("ansible_collections").is_dir() {
            return None;
        }

        let config = WorkspaceConfig::new().with_collections_path(&collections);
        let (index, _, errors) = index_sources(discover_sources(&config));
        tracing::debug!(
            "[INDEX] adjacent collections {}: {} modules ({} errors)",
            collections.display(),
            index.len(),
            errors.len()
        );
        let index = Arc::new(index);
        self.adjacent
            .write()
            .insert(collections, Arc::clone(&index));
        Some(index)
    }

    pub fn module_fqcns(&self) -> Vec<String> {
        self.snapshot().module_fqcns()
    }

    /// Materialize all documentation now instead of on first use.
    pub fn warm_documentation(&self) -> usize {
        self.snapshot().warm_documentation()
    }

    // =========================================================================
    // INVALIDATION
    // =========================================================================

    fn update(&self, edit: impl FnOnce(&mut ModuleIndex)) {
        let mut guard = self.index.write();
        edit(Arc::make_mut(&mut guard));
    }

    /// Forget what was read from a module or fragment source.
    ///
    /// A changed fragment also resets every module that merged it. Returns
    /// `false` for files the index does not know.
    pub fn invalidate_source(&self, path: &Path) -> bool {
        match self.sources.get(path) {
            Some(IndexedSource::Module(fqcn)) => {
                self.update(|index| {
                    if let Some(module) = index.module(fqcn).map(|m| m.fresh_copy()) {
                        index.insert_module(module);
                    }
                });
                tracing::debug!("[INDEX] invalidated module {}", fqcn);
                true
            }
            Some(IndexedSource::Fragment(fqcn)) => {
                self.update(|index| {
                    if let Some(fragment) = index.fragment(fqcn).map(|f| f.fresh_copy()) {
                        index.insert_fragment(fragment);
                    }
                    let dependants: Vec<_> = index
                        .modules()
                        .filter(|module| module.depends_on_fragment(fqcn))
                        .map(|module| module.fresh_copy())
                        .collect();
                    tracing::debug!(
                        "[INDEX] invalidated fragment {} and {} dependants",
                        fqcn,
                        dependants.len()
                    );
                    for module in dependants {
                        index.insert_module(module);
                    }
                });
                true
            }
            Some(IndexedSource::Routing(_)) => self.invalidate_routing(path).is_ok(),
            None => false,
        }
    }

    /// Re-read a routing file. On failure the collection's routes are
    /// dropped rather than kept stale.
    pub fn invalidate_routing(&self, path: &Path) -> Result<(), IndexError> {
        let Some(IndexedSource::Routing(collection)) = self.sources.get(path) else {
            return Ok(());
        };
        match read_routing(path, collection) {
            Ok(table) => {
                self.update(|index| {
                    index.insert_routing(table);
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[INDEX] {}", err);
                self.update(|index| {
                    index.remove_routing(collection);
                });
                Err(err)
            }
        }
    }

    /// Drop every playbook-adjacent index `path` lies in; it is rebuilt on
    /// next use.
    pub fn invalidate_adjacent(&self, path: &Path) -> bool {
        let mut adjacent = self.adjacent.write();
        let before = adjacent.len();
        adjacent.retain(|collections, _| !path.starts_with(collections));
        before != adjacent.len()
    }

    /// Apply file-watch events. Returns how many URIs touched a cache.
    pub fn handle_watched_files<I, S>(&self, uris: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut touched = 0;
        for uri in uris {
            let uri = uri.as_ref();
            let mut hit = self.metadata.handle_watched_files([uri]) > 0;
            if let Ok(path) = uri_to_path(uri) {
                hit |= self.invalidate_source(&path);
                hit |= self.invalidate_adjacent(&path);
            }
            if hit {
                touched += 1;
            }
        }
        touched
    }
}

/// Build an index from discovered sources. Module documentation is read
/// lazily; routing files are read now.
fn index_sources(sources: ModuleSources) -> (ModuleIndex, FxHashMap<PathBuf, IndexedSource>, Vec<IndexError>) {
    let mut index = ModuleIndex::new();
    let mut indexed = FxHashMap::default();
    let mut errors = sources.errors;

    for file in &sources.modules {
        let fqcn = file.fqcn();
        if index.insert_module(file.metadata()).is_some() {
            tracing::debug!("[INDEX] {} shadowed by {}", fqcn, file.path.display());
        }
        indexed.insert(file.path.clone(), IndexedSource::Module(fqcn));
    }
    for file in &sources.fragments {
        index.insert_fragment(file.metadata());
        indexed.insert(file.path.clone(), IndexedSource::Fragment(file.fqcn()));
    }
    for file in &sources.routing {
        match read_routing(&file.path, &file.collection) {
            Ok(table) => {
                index.insert_routing(table);
            }
            Err(err) => {
                tracing::warn!("[INDEX] {}", err);
                errors.push(err);
            }
        }
        indexed.insert(file.path.clone(), IndexedSource::Routing(file.collection.clone()));
    }

    tracing::debug!(
        "[INDEX] loaded {} modules from {} files ({} errors)",
        index.len(),
        indexed.len(),
        errors.len()
    );
    (index, indexed, errors)
}

fn read_routing(path: &Path, collection: &str) -> Result<RoutingTable, IndexError> {
    let text = std::fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
    RoutingTable::parse(collection, &text).map_err(|e| IndexError::yaml(path, e))
}
