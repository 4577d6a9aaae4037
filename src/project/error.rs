//! Error types for workspace loading.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading workspace files.
///
/// None of these abort loading: they are collected per file and the rest of
/// the workspace is still indexed.
#[derive(Debug, Error)]
pub enum IndexError {
    /// IO error while reading a file or walking a directory.
    #[error("IO error in {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A routing, metadata or configuration file is not valid YAML.
    #[error("YAML error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A document URI that does not name a local file.
    #[error("Invalid document URI: {0}")]
    InvalidUri(String),
}

impl IndexError {
    /// Create an IO error for `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a YAML error for `path`.
    pub fn yaml(path: impl AsRef<Path>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// The file the error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } | Self::Yaml { path, .. } => Some(path),
            Self::InvalidUri(_) => None,
        }
    }
}

impl From<walkdir::Error> for IndexError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
        Self::Io { path, source }
    }
}
