//! Option lookup for the key under the cursor.
//!
//! Module options are written either directly under the module key or
//! under `args:` next to it:
//!
//! ```yaml
//! - ansible.builtin.copy:
//!     src: a
//! - ansible.builtin.copy:
//!   args:
//!     src: a
//! ```

use std::sync::Arc;

use indexmap::IndexMap;

use super::ancestry::AncestryBuilder;
use super::context::{ValueShape, get_task_param_path_with_trace};
use super::keywords::is_task_keyword;
use super::module::OptionDoc;
use super::path::PathNode;
use super::resolve::{ModuleResolver, ResolvedModule};

/// Options keyed by name and alias.
pub type OptionMap = IndexMap<String, Arc<OptionDoc>>;

/// The module named among the keys of a task, when an `args:` key (or any
/// other task keyword) is at `task_param_path`.
///
/// Returns the first non-keyword key that resolves to a module.
pub fn find_provided_module(
    task_param_path: &[PathNode<'_>],
    resolver: &ModuleResolver<'_>,
    document_uri: Option<&str>,
) -> Option<ResolvedModule> {
    let task = AncestryBuilder::new(task_param_path)
        .parent_mapping()
        .get_mapping()?;

    task.keys()
        .filter(|key| !is_task_keyword(key))
        .map(|key| resolver.resolve(key, Some(task_param_path), document_uri))
        .find(ResolvedModule::is_found)
}

/// Options valid at `path`, a key somewhere below a module's options.
///
/// Walks up to the task parameter collecting the traversed keys, then walks
/// back down the module's option tree. `None` when the module is unknown or
/// the document's nesting does not match the documented option types.
pub fn get_possible_options_for_path(
    path: &[PathNode<'_>],
    resolver: &ModuleResolver<'_>,
    document_uri: Option<&str>,
) -> Option<OptionMap> {
    let (task_param_path, mut trace) = get_task_param_path_with_trace(path)?;

    // The module key itself always holds a mapping of options.
    let (_, shape) = trace.pop()?;
    if shape != ValueShape::Dict {
        return None;
    }

    let task_param = task_param_path.last()?.as_scalar()?.as_str();
    let resolved = if task_param == "args" {
        find_provided_module(&task_param_path, resolver, document_uri)?
    } else {
        resolver.resolve(task_param, Some(task_param_path.as_slice()), document_uri)
    };
    let documentation = resolved.documentation?;

    let mut options = &documentation.options;
    for (name, shape) in trace.iter().rev() {
        let expected = match shape {
            ValueShape::Dict => "dict",
            ValueShape::List => "list",
        };
        match options.get(name) {
            Some(option) if option.is_type(expected) && !option.suboptions.is_empty() => {
                options = &option.suboptions;
            }
            _ => {
                tracing::trace!("[OPTIONS] '{}' does not nest as {}", name, expected);
                return None;
            }
        }
    }
    Some(options.clone())
}
