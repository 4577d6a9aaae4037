//! Workspace configuration: where modules and collections live.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::IndexError;

/// Search paths for one workspace, usually taken from `ansible-config` of
/// the interpreter the workspace uses.
///
/// ```yaml
/// module_locations: [/usr/lib/python3/site-packages/ansible/modules]
/// collections_paths: [~/.ansible/collections]
/// ansible_location: /usr/lib/python3/site-packages/ansible
/// playbook_adjacent_collections: true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directories holding `ansible.builtin` modules.
    pub module_locations: Vec<PathBuf>,
    /// Directories containing an `ansible_collections/` tree.
    pub collections_paths: Vec<PathBuf>,
    /// The `ansible` package directory; holds the builtin routing file.
    pub ansible_location: Option<PathBuf>,
    /// Search `<playbook dir>/collections` before everything else.
    pub playbook_adjacent_collections: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            module_locations: Vec::new(),
            collections_paths: Vec::new(),
            ansible_location: None,
            playbook_adjacent_collections: true,
        }
    }
}

impl WorkspaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_locations.push(path.into());
        self
    }

    pub fn with_collections_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.collections_paths.push(path.into());
        self
    }

    pub fn with_ansible_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.ansible_location = Some(path.into());
        self
    }

    pub fn with_playbook_adjacent_collections(mut self, enabled: bool) -> Self {
        self.playbook_adjacent_collections = enabled;
        self
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is an empty configuration.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
        Self::from_yaml(&text).map_err(|e| IndexError::yaml(path, e))
    }
}
