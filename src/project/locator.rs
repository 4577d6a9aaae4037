//! Source discovery: which files document modules, fragments and routing.
//!
//! ```text
//! <module_location>/**/*.py                              ansible.builtin modules
//! <module_location>/../plugins/doc_fragments/*.py        ansible.builtin fragments
//! <ansible_location>/config/ansible_builtin_runtime.yml  ansible.builtin routing
//! <collections_path>/ansible_collections/<ns>/<coll>/
//!     plugins/modules/**/*.py                            <ns>.<coll> modules
//!     plugins/doc_fragments/*.py                         <ns>.<coll> fragments
//!     meta/runtime.yml                                   <ns>.<coll> routing
//! ```
//!
//! Files whose name starts with `_` and symlinked files are skipped.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::config::WorkspaceConfig;
use super::error::IndexError;
use crate::hir::ModuleMetadata;

pub const BUILTIN_NAMESPACE: &str = "ansible";
pub const BUILTIN_COLLECTION: &str = "builtin";

/// A Python file carrying a DOCUMENTATION block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub namespace: String,
    pub collection: String,
    /// Module name; modules in sub-directories are dotted (`net.ping`).
    pub name: String,
}

impl SourceFile {
    pub fn fqcn(&self) -> String {
        format!("{}.{}.{}", self.namespace, self.collection, self.name)
    }

    /// Lazy metadata for this file; nothing is read yet.
    pub fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata::new(&self.namespace, &self.collection, &self.name, &self.path)
    }
}

/// A runtime metadata file with plugin routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingFile {
    pub path: PathBuf,
    /// `namespace.collection` the routes belong to.
    pub collection: String,
}

/// Everything discovered for one workspace configuration.
#[derive(Debug, Default)]
pub struct ModuleSources {
    pub modules: Vec<SourceFile>,
    pub fragments: Vec<SourceFile>,
    pub routing: Vec<RoutingFile>,
    /// Directories that could not be walked. Discovery continues past them.
    pub errors: Vec<IndexError>,
}

/// Walk every configured location.
pub fn discover_sources(config: &WorkspaceConfig) -> ModuleSources {
    let mut sources = ModuleSources::default();

    for location in &config.module_locations {
        discover_builtin(location, &mut sources);
    }
    if let Some(ansible) = &config.ansible_location {
        let runtime = ansible.join("config").join("ansible_builtin_runtime.yml");
        if runtime.is_file() {
            sources.routing.push(RoutingFile {
                path: runtime,
                collection: format!("{BUILTIN_NAMESPACE}.{BUILTIN_COLLECTION}"),
            });
        }
    }
    for collections_path in &config.collections_paths {
        discover_collections(collections_path, &mut sources);
    }

    tracing::debug!(
        "[LOCATOR] {} modules, {} fragments, {} routing files, {} errors",
        sources.modules.len(),
        sources.fragments.len(),
        sources.routing.len(),
        sources.errors.len()
    );
    sources
}

fn discover_builtin(location: &Path, sources: &mut ModuleSources) {
    if !location.is_dir() {
        tracing::debug!("[LOCATOR] no module directory at {}", location.display());
        return;
    }
    for (path, _) in python_files(location, None, &mut sources.errors) {
        if let Some(name) = file_stem(&path) {
            sources.modules.push(SourceFile {
                namespace: BUILTIN_NAMESPACE.to_string(),
                collection: BUILTIN_COLLECTION.to_string(),
                name,
                path,
            });
        }
    }

    let Some(parent) = location.parent() else {
        return;
    };
    let fragments_dir = parent.join("plugins").join("doc_fragments");
    if !fragments_dir.is_dir() {
        return;
    }
    for (path, _) in python_files(&fragments_dir, Some(1), &mut sources.errors) {
        if let Some(name) = file_stem(&path) {
            sources.fragments.push(SourceFile {
                namespace: BUILTIN_NAMESPACE.to_string(),
                collection: BUILTIN_COLLECTION.to_string(),
                name,
                path,
            });
        }
    }
}

fn discover_collections(collections_path: &Path, sources: &mut ModuleSources) {
    let root = collections_path.join("ansible_collections");
    if !root.is_dir() {
        tracing::debug!("[LOCATOR] no ansible_collections under {}", collections_path.display());
        return;
    }

    let collection_dirs = WalkDir::new(&root)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in collection_dirs {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                sources.errors.push(err.into());
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        let (Some(namespace), Some(collection)) = (
            dir.parent().and_then(file_name),
            file_name(dir),
        ) else {
            continue;
        };
        discover_collection(dir, &namespace, &collection, sources);
    }
}

fn discover_collection(dir: &Path, namespace: &str, collection: &str, sources: &mut ModuleSources) {
    let modules_dir = dir.join("plugins").join("modules");
    if modules_dir.is_dir() {
        for (path, relative) in python_files(&modules_dir, None, &mut sources.errors) {
            sources.modules.push(SourceFile {
                namespace: namespace.to_string(),
                collection: collection.to_string(),
                name: relative,
                path,
            });
        }
    }

    let fragments_dir = dir.join("plugins").join("doc_fragments");
    if fragments_dir.is_dir() {
        for (path, relative) in python_files(&fragments_dir, Some(1), &mut sources.errors) {
            sources.fragments.push(SourceFile {
                namespace: namespace.to_string(),
                collection: collection.to_string(),
                name: relative,
                path,
            });
        }
    }

    let runtime = dir.join("meta").join("runtime.yml");
    if runtime.is_file() {
        sources.routing.push(RoutingFile {
            path: runtime,
            collection: format!("{namespace}.{collection}"),
        });
    }
}

/// `*.py` files below `dir` that are neither private (`_*`) nor symlinks,
/// paired with their dotted name relative to `dir`.
fn python_files(
    dir: &Path,
    max_depth: Option<usize>,
    errors: &mut Vec<IndexError>,
) -> Vec<(PathBuf, String)> {
    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_hidden(e)) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("[LOCATOR] cannot walk {}: {}", dir.display(), err);
                errors.push(err.into());
                continue;
            }
        };
        if entry.path_is_symlink() || !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "py") {
            continue;
        }
        if file_name(path).is_none_or(|name| name.starts_with('_')) {
            continue;
        }
        if let Some(name) = dotted_name(dir, path) {
            files.push((path.to_path_buf(), name));
        }
    }
    files
}

/// `a/b/c.py` relative to `dir` becomes `a.b.c`.
fn dotted_name(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?.with_extension("");
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("."))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_string)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()?.to_str().map(str::to_string)
}
