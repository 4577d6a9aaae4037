//! Context classification: what an ancestry chain means in Ansible terms.
//!
//! Each predicate is a short chain over [`AncestryBuilder`]; a chain that
//! does not fit the expected structure simply yields `None` and the
//! predicate answers `false`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ancestry::AncestryBuilder;
use super::keywords::{is_play_exclusive_keyword, is_play_without_task_keyword};
use super::path::{NodePath, PathNode};
use crate::syntax::{Mapping, Node, YamlDocument};

/// Keys whose value is a list of tasks.
pub const TASK_LIST_KEYS: &[&str] = &["tasks", "pre_tasks", "post_tasks", "block", "rescue", "always"];

/// Keys of the block wrappers that may carry their own `collections`.
const BLOCK_SECTION_KEYS: &[&str] = &["block", "rescue", "always"];

static ROLE_TASKS_URI: Lazy<Regex> = Lazy::new(|| Regex::new(r"/roles/[^/]+/tasks/").unwrap());

/// Whether the value under a traced key held a mapping or a list of mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Dict,
    List,
}

/// Keys traversed from a sub-option up to the task parameter, innermost first.
pub type OptionTrace = Vec<(String, ValueShape)>;

// ============================================================================
// STRUCTURAL ROLES
// ============================================================================

/// Whether `path` ends at a key of a task mapping.
///
/// The mapping must be an item of a sequence that is either the document
/// root or the value of one of [`TASK_LIST_KEYS`], and must not look like a
/// play, a block or a role entry.
pub fn is_task_param(path: &[PathNode<'_>]) -> bool {
    let Some(task_list_path) = AncestryBuilder::new(path)
        .parent_of_key()
        .parent_sequence()
        .get_path()
    else {
        return false;
    };

    if is_play_param(path, None) == Some(true) || is_block_param(path) || is_role_param(path) {
        return false;
    }

    if task_list_path.len() == 1 {
        return true;
    }
    AncestryBuilder::new(&task_list_path)
        .parent_mapping()
        .get_string_key()
        .is_some_and(|key| TASK_LIST_KEYS.contains(&key))
}

/// Whether `path` ends at a key of a play.
///
/// `Some(true)` when the mapping is a top-level sequence item carrying a
/// play-only keyword such as `hosts`. `Some(false)` when the mapping is not
/// a top-level item, or when `document_uri` places the file in a role's
/// `tasks/` directory. `None` when nothing decides it.
pub fn is_play_param(path: &[PathNode<'_>], document_uri: Option<&str>) -> Option<bool> {
    let builder = AncestryBuilder::new(path).parent_of_key();
    let at_root = builder
        .clone()
        .parent_sequence()
        .get_path()
        .is_some_and(|p| p.len() == 1);
    if !at_root {
        return Some(false);
    }

    let mapping = builder.get_mapping()?;
    if mapping.keys().any(is_play_exclusive_keyword) {
        return Some(true);
    }
    match document_uri {
        Some(uri) if ROLE_TASKS_URI.is_match(uri) => Some(false),
        _ => None,
    }
}

/// Whether `path` ends at a key of a mapping that declares `block`.
pub fn is_block_param(path: &[PathNode<'_>]) -> bool {
    AncestryBuilder::new(path)
        .parent_of_key()
        .get_mapping()
        .is_some_and(|m| m.contains_key("block"))
}

/// Whether `path` ends at a key of an entry of a play's `roles` list.
pub fn is_role_param(path: &[PathNode<'_>]) -> bool {
    AncestryBuilder::new(path)
        .parent_of_key()
        .parent_sequence()
        .parent_mapping()
        .get_string_key()
        == Some("roles")
}

// ============================================================================
// COLLECTIONS
// ============================================================================

/// Collections declared around the task that owns `module_path`.
///
/// Gathers the task mapping's own `collections`, then those of every
/// enclosing `block`/`rescue`/`always` wrapper, then the play's. The result
/// is deduplicated and keeps first-seen order.
pub fn get_declared_collections(module_path: &[PathNode<'_>]) -> Vec<String> {
    let mut declared: Vec<String> = Vec::new();
    let mut push_all = |mapping: Option<&Mapping>| {
        for collection in collections_of(mapping) {
            if !declared.iter().any(|c| c == collection) {
                declared.push(collection.to_string());
            }
        }
    };

    let task = AncestryBuilder::new(module_path).parent_mapping();
    push_all(task.get_mapping());

    let mut path = task.get_path();
    loop {
        let Some(current) = path.as_deref() else {
            break;
        };
        let builder = AncestryBuilder::new(current).parent_sequence().parent_mapping();
        match builder.get_string_key() {
            Some(key) if BLOCK_SECTION_KEYS.contains(&key) => {
                push_all(builder.get_mapping());
                path = builder.get_path();
            }
            _ => break,
        }
    }

    if let Some(current) = path.as_deref() {
        let play = AncestryBuilder::new(current).parent_sequence().parent_mapping();
        push_all(play.get_mapping());
    }

    declared
}

/// Scalar items of a mapping's `collections:` sequence.
fn collections_of(mapping: Option<&Mapping>) -> Vec<&str> {
    mapping
        .and_then(|m| m.get_value("collections"))
        .and_then(Node::as_sequence)
        .map(|seq| seq.items.iter().filter_map(Node::as_str).collect())
        .unwrap_or_default()
}

/// Scalar keys of a mapping, in order.
pub fn get_yaml_map_keys(mapping: &Mapping) -> Vec<&str> {
    mapping.keys().collect()
}

// ============================================================================
// OPTION TRACES
// ============================================================================

/// Walk up from a (sub-)option key to the task parameter that owns it.
///
/// Returns the path of the task parameter key (usually the module name)
/// and the keys passed on the way, innermost first. Each traced key records
/// whether the walk came up through a mapping value or a list of mappings.
pub fn get_task_param_path_with_trace<'a>(
    path: &[PathNode<'a>],
) -> Option<(NodePath<'a>, OptionTrace)> {
    let mut path: NodePath<'a> = path.to_vec();
    let mut trace = OptionTrace::new();

    while !is_task_param(&path) {
        let through_dict = AncestryBuilder::new(&path)
            .parent_of_key()
            .parent_mapping()
            .get_key_path();
        if let Some((key_path, key)) = through_dict.and_then(with_string_key) {
            trace.push((key, ValueShape::Dict));
            path = key_path;
            continue;
        }

        let through_list = AncestryBuilder::new(&path)
            .parent_of_key()
            .parent_sequence()
            .parent_mapping()
            .get_key_path();
        if let Some((key_path, key)) = through_list.and_then(with_string_key) {
            trace.push((key, ValueShape::List));
            path = key_path;
            continue;
        }

        return None;
    }

    Some((path, trace))
}

fn with_string_key(path: NodePath<'_>) -> Option<(NodePath<'_>, String)> {
    let key = path.last()?.as_scalar()?.as_str().to_string();
    Some((path, key))
}

// ============================================================================
// DOCUMENT KIND
// ============================================================================

/// Whether the documents form a playbook: the first document is a sequence
/// and some item uses a play keyword that tasks do not accept.
pub fn is_playbook(documents: &[YamlDocument]) -> bool {
    let Some(root) = documents.iter().find_map(|d| d.contents.as_ref()) else {
        return false;
    };
    let Some(sequence) = root.as_sequence() else {
        return false;
    };
    sequence
        .items
        .iter()
        .filter_map(Node::as_mapping)
        .flat_map(Mapping::keys)
        .any(is_play_without_task_keyword)
}
