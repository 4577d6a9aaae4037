//! AnalysisHost and Analysis: open documents plus the workspace index.
//!
//! The `AnalysisHost` owns all mutable state and hands out `Analysis`
//! snapshots for querying. A snapshot pins one version of the module index,
//! so every query made through it sees the same modules and routes even if
//! the workspace is invalidated meanwhile.
//!
//! ## Usage
//!
//! ```ignore
//! let mut host = AnalysisHost::new();
//! host.set_workspace(Arc::new(WorkspaceIndex::load(&config)));
//!
//! // Apply file changes
//! host.set_file_content("file:///ws/site.yml", text);
//!
//! // Get a snapshot for queries
//! let analysis = host.analysis();
//! let diagnostics = analysis.yaml_diagnostics("file:///ws/site.yml");
//! let module = analysis.module_at("file:///ws/site.yml", offset);
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::{LineCol, TextSize};
use crate::hir::{
    Diagnostic, ModuleIndex, ModuleResolver, NodePath, OptionMap, ResolvedModule,
    get_possible_options_for_path, is_playbook, is_task_param, merge_diagnostics, resolve_path_at,
};
use crate::project::WorkspaceIndex;
use crate::syntax::{ParseError, YamlFile};

use super::text_utils::is_cursor_inside_jinja_brackets;

/// One open document.
#[derive(Debug)]
struct OpenFile {
    text: Arc<str>,
    parsed: YamlFile,
}

/// Owns all mutable state for the IDE layer.
///
/// Apply changes via `set_file_content()` and `remove_file()`,
/// then get a consistent snapshot via `analysis()`.
#[derive(Debug, Default)]
pub struct AnalysisHost {
    /// Open documents keyed by URI
    files: FxHashMap<String, OpenFile>,
    workspace: Arc<WorkspaceIndex>,
}

impl AnalysisHost {
    /// Create a host with no documents and an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(workspace: Arc<WorkspaceIndex>) -> Self {
        Self {
            files: FxHashMap::default(),
            workspace,
        }
    }

    /// Set the content of a document, parsing it and storing the result.
    ///
    /// Returns parse errors if any.
    pub fn set_file_content(&mut self, uri: &str, content: &str) -> Vec<ParseError> {
        let parsed = YamlFile::parse(content);
        let errors: Vec<ParseError> = parsed.errors().cloned().collect();
        tracing::trace!("[ANALYSIS] {} parsed with {} errors", uri, errors.len());

        self.files.insert(
            uri.to_string(),
            OpenFile {
                text: Arc::from(content),
                parsed,
            },
        );
        errors
    }

    /// Remove a document. Returns whether it was open.
    pub fn remove_file(&mut self, uri: &str) -> bool {
        self.files.remove(uri).is_some()
    }

    pub fn has_file(&self, uri: &str) -> bool {
        self.files.contains_key(uri)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Swap the workspace the documents are resolved against.
    pub fn set_workspace(&mut self, workspace: Arc<WorkspaceIndex>) {
        self.workspace = workspace;
    }

    pub fn workspace(&self) -> &Arc<WorkspaceIndex> {
        &self.workspace
    }

    /// Get a consistent snapshot for querying.
    pub fn analysis(&self) -> Analysis<'_> {
        Analysis {
            files: &self.files,
            workspace: &self.workspace,
            index: self.workspace.snapshot(),
        }
    }
}

/// A read-only snapshot of the open documents and the module index.
pub struct Analysis<'a> {
    files: &'a FxHashMap<String, OpenFile>,
    workspace: &'a WorkspaceIndex,
    index: Arc<ModuleIndex>,
}

impl<'a> Analysis<'a> {
    pub fn file(&self, uri: &str) -> Option<&'a YamlFile> {
        self.files.get(uri).map(|file| &file.parsed)
    }

    pub fn text(&self, uri: &str) -> Option<&'a str> {
        self.files.get(uri).map(|file| &*file.text)
    }

    /// The module index this snapshot was taken with.
    pub fn index(&self) -> &ModuleIndex {
        &self.index
    }

    /// A resolver over this snapshot that consults role metadata.
    pub fn resolver(&self) -> ModuleResolver<'_> {
        ModuleResolver::new(&self.index).with_metadata(self.workspace.metadata())
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Node path under a byte offset.
    pub fn path_at(&self, uri: &str, offset: TextSize, inclusive: bool) -> Option<NodePath<'a>> {
        resolve_path_at(&self.file(uri)?.documents, offset, inclusive)
    }

    /// Node path under a line/column position (both 0-based).
    pub fn path_at_position(
        &self,
        uri: &str,
        line: u32,
        col: u32,
        inclusive: bool,
    ) -> Option<NodePath<'a>> {
        let file = self.file(uri)?;
        let offset = file.line_index.offset(LineCol::new(line, col))?;
        resolve_path_at(&file.documents, offset, inclusive)
    }

    pub fn is_playbook(&self, uri: &str) -> bool {
        self.file(uri).is_some_and(|file| is_playbook(&file.documents))
    }

    pub fn is_inside_jinja(&self, uri: &str, offset: TextSize) -> bool {
        let (Some(text), Some(path)) = (self.text(uri), self.path_at(uri, offset, true)) else {
            return false;
        };
        is_cursor_inside_jinja_brackets(text, offset, &path)
    }

    // =========================================================================
    // DIAGNOSTICS
    // =========================================================================

    /// Parse errors of a document, merged so none hides another.
    pub fn yaml_diagnostics(&self, uri: &str) -> Vec<Diagnostic> {
        self.file(uri)
            .map(|file| merge_diagnostics(file.errors()))
            .unwrap_or_default()
    }

    // =========================================================================
    // MODULES
    // =========================================================================

    /// The module named by the task key under the cursor.
    ///
    /// `None` when the cursor is not on a task parameter or the name
    /// does not resolve.
    pub fn module_at(&self, uri: &str, offset: TextSize) -> Option<ResolvedModule> {
        let path = self.path_at(uri, offset, true)?;
        if !is_task_param(&path) {
            return None;
        }
        let name = path.last()?.as_scalar()?.as_str();
        let resolved = self.resolver().resolve(name, Some(path.as_slice()), Some(uri));
        tracing::trace!("[ANALYSIS] module at {:?}: {:?}", offset, resolved.fqcn);
        resolved.is_found().then_some(resolved)
    }

    /// Options valid for the key under the cursor.
    pub fn options_at(&self, uri: &str, offset: TextSize) -> Option<OptionMap> {
        let path = self.path_at(uri, offset, true)?;
        get_possible_options_for_path(&path, &self.resolver(), Some(uri))
    }
}
