//! IDE features: high-level queries for language-server handlers.
//!
//! This module sits between open editor documents and the semantic model
//! (HIR). Each query corresponds to something a handler needs: the path
//! under the cursor, merged YAML diagnostics, the module a task names, the
//! options valid at a key.
//!
//! ## Design Principles
//!
//! 1. **Snapshots**: queries run against an [`Analysis`] that pins one module index
//! 2. **No LSP types**: ranges are byte offsets, converted at the protocol boundary
//! 3. **Composable**: everything here is built on top of HIR queries
//!
//! ## Usage
//!
//! ```ignore
//! use ansible_ls::ide::AnalysisHost;
//!
//! let mut host = AnalysisHost::new();
//! host.set_file_content("file:///ws/site.yml", "- hosts: all\n  tasks: []\n");
//!
//! let analysis = host.analysis();
//! assert!(analysis.is_playbook("file:///ws/site.yml"));
//! ```

mod analysis;
pub mod text_utils;

pub use analysis::{Analysis, AnalysisHost};
pub use text_utils::is_cursor_inside_jinja_brackets;
