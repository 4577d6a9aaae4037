//! Workspace plumbing: configuration, source discovery, role metadata and
//! the shared module index.

mod config;
mod error;
pub mod locator;
mod metadata;
mod workspace;

pub use config::WorkspaceConfig;
pub use error::IndexError;
pub use locator::{ModuleSources, RoutingFile, SourceFile, discover_sources};
pub use metadata::{
    DocumentMetadata, DocumentMetadataLibrary, collections_in, metadata_uri_for, uri_to_path,
};
pub use workspace::{IndexedSource, WorkspaceIndex};
