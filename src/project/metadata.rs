//! Role metadata: collections declared in a role's `meta/main.yml`.
//!
//! A task file at `.../roles/web/tasks/main.yml` belongs to the role whose
//! metadata sits at `.../roles/web/meta/main.yml`. Module names in the task
//! file are also looked up in the collections that metadata declares.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_yaml::Value;
use url::Url;

use super::error::IndexError;
use crate::hir::DocumentMetadataSource;

/// Collections declared by one metadata file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// URI of the metadata file.
    pub source: String,
    pub collections: Vec<String>,
}

/// Per-metadata-file cache of declared collections.
///
/// Entries are read on first request and stay until a watched-file event
/// names them.
#[derive(Debug, Default)]
pub struct DocumentMetadataLibrary {
    cache: RwLock<FxHashMap<String, Arc<DocumentMetadata>>>,
}

impl DocumentMetadataLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata of the role `document_uri` belongs to, if it can have any.
    pub fn get(&self, document_uri: &str) -> Option<Arc<DocumentMetadata>> {
        let metadata_uri = metadata_uri_for(document_uri)?;
        if let Some(cached) = self.cache.read().get(&metadata_uri) {
            return Some(Arc::clone(cached));
        }

        let metadata = Arc::new(read_metadata(&metadata_uri));
        let mut cache = self.cache.write();
        let entry = cache.entry(metadata_uri).or_insert(metadata);
        Some(Arc::clone(entry))
    }

    /// Drop cached entries for changed files. Returns how many were cached.
    pub fn handle_watched_files<I, S>(&self, uris: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cache = self.cache.write();
        uris.into_iter()
            .filter(|uri| cache.remove(uri.as_ref()).is_some())
            .count()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

impl DocumentMetadataSource for DocumentMetadataLibrary {
    fn collections_for(&self, document_uri: &str) -> Vec<String> {
        self.get(document_uri)
            .map(|metadata| metadata.collections.clone())
            .unwrap_or_default()
    }
}

/// Where the role metadata for `document_uri` would be: everything before
/// the first `tasks` path segment, then `meta/main.yml`.
pub fn metadata_uri_for(document_uri: &str) -> Option<String> {
    let segments: Vec<&str> = document_uri.split('/').collect();
    let tasks = segments.iter().position(|segment| *segment == "tasks")?;
    let mut meta: Vec<&str> = segments[..tasks].to_vec();
    meta.extend(["meta", "main.yml"]);
    Some(meta.join("/"))
}

/// Local path of a `file://` URI or of a plain path.
pub fn uri_to_path(uri: &str) -> Result<PathBuf, IndexError> {
    match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|()| IndexError::InvalidUri(uri.to_string())),
        Ok(_) => Err(IndexError::InvalidUri(uri.to_string())),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(PathBuf::from(uri)),
        Err(_) => Err(IndexError::InvalidUri(uri.to_string())),
    }
}

fn read_metadata(metadata_uri: &str) -> DocumentMetadata {
    let mut metadata = DocumentMetadata {
        source: metadata_uri.to_string(),
        collections: Vec::new(),
    };
    let path = match uri_to_path(metadata_uri) {
        Ok(path) => path,
        Err(err) => {
            tracing::debug!("[METADATA] {}", err);
            return metadata;
        }
    };
    if !path.is_file() {
        return metadata;
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("[METADATA] {}", IndexError::io(&path, err));
            return metadata;
        }
    };
    match collections_in(&text) {
        Ok(collections) => metadata.collections = collections,
        Err(err) => tracing::warn!("[METADATA] {}", IndexError::yaml(&path, err)),
    }
    metadata
}

/// String items of every document's top-level `collections` list.
pub fn collections_in(text: &str) -> Result<Vec<String>, serde_yaml::Error> {
    let mut collections = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        if let Some(items) = value.get("collections").and_then(Value::as_sequence) {
            collections.extend(items.iter().filter_map(|item| item.as_str().map(str::to_string)));
        }
    }
    Ok(collections)
}
