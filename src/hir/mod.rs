//! High-level IR (HIR): the Ansible semantic model over parsed YAML.
//!
//! Everything here works on borrowed syntax trees and read-mostly indexes.
//! Nothing fails: a structure that does not match yields `None`, an empty
//! collection, or an error list attached to the value.
//!
//! ## Key Types
//!
//! - [`NodePath`] / [`resolve_path_at`]: the node chain under an offset
//! - [`AncestryBuilder`]: an upward cursor over a path that fails closed
//! - [`ModuleIndex`]: modules, documentation fragments and routing by FQCN
//! - [`ModuleResolver`]: name + context → module, following routing
//! - [`merge_diagnostics`]: parse errors → non-occluding diagnostics
//!
//! ## Layers
//!
//! ```text
//! resolve_path_at(documents, offset)    ← path under the cursor
//!     │
//!     ▼
//! AncestryBuilder / context predicates  ← task, play, block or role key?
//!     │
//!     ▼
//! ModuleResolver::resolve(name, path)   ← candidates, routing, index
//!     │
//!     ▼
//! ModuleMetadata::documentation         ← fragments merged, memoized
//!     │
//!     ▼
//! get_possible_options_for_path         ← options valid under the cursor
//! ```

mod ancestry;
mod context;
mod diagnostics;
mod keywords;
mod module;
mod options;
mod path;
mod resolve;
mod routing;

pub use ancestry::{AncestryBuilder, KeyPattern};
pub use context::{
    OptionTrace, TASK_LIST_KEYS, ValueShape, get_declared_collections, get_task_param_path_with_trace,
    get_yaml_map_keys, is_block_param, is_play_param, is_playbook, is_role_param, is_task_param,
};
pub use diagnostics::{
    Diagnostic, IntervalTree, RelatedInfo, SCOPE_ENDS_HERE, Severity, YAML_SOURCE,
    collapse_overlapping, merge_diagnostics, ranges_overlap,
};
pub use keywords::{
    BLOCK_KEYWORDS, PLAY_KEYWORDS, ROLE_KEYWORDS, TASK_KEYWORDS, is_block_keyword,
    is_play_exclusive_keyword, is_play_keyword, is_play_without_task_keyword, is_role_keyword,
    is_task_keyword,
};
pub use module::{
    DOCUMENTATION, Description, DocumentationError, FragmentRef, ModuleDocumentation,
    ModuleMetadata, OptionDoc, RawDocumentation, SeeAlso, split_fragment_reference,
};
pub use options::{OptionMap, find_provided_module, get_possible_options_for_path};
pub use path::{NodePath, PathNode, contains, path_at_offset, resolve_path_at};
pub use resolve::{
    DocumentMetadataSource, MAX_REDIRECT_HOPS, ModuleIndex, ModuleResolver, ResolvedModule,
};
pub use routing::{PluginRoute, RemovalInfo, RoutingTable, split_fqcn};
