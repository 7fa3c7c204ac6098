use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::manifest::{MANIFEST_VERSION, ViewerManifest};

pub const MANIFEST_FILE_NAME: &str = "viewer.manifest.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error reading {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported manifest version: {found}")]
    UnsupportedVersion { found: String },
    #[error("node {node:?} names unknown parent {parent:?}")]
    UnknownParent { node: String, parent: String },
    #[error("duplicate node id {id:?}")]
    DuplicateId { id: String },
}

impl ViewerManifest {
    pub fn from_json_str(payload: &str) -> Result<Self, ManifestError> {
        let manifest: ViewerManifest = serde_json::from_str(payload)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                found: manifest.version,
            });
        }
        Ok(manifest)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload)
    }

    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A directory holding `viewer.manifest.json`.
#[derive(Debug, Clone)]
pub struct ViewerPackage {
    root: PathBuf,
    manifest: ViewerManifest,
}

impl ViewerPackage {
    /// Accepts either the package directory or the manifest file itself.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let (root, manifest_path) = if path.is_dir() {
            (path.to_path_buf(), path.join(MANIFEST_FILE_NAME))
        } else {
            let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (root, path.to_path_buf())
        };
        let manifest = ViewerManifest::load_file(&manifest_path)?;
        Ok(Self { root, manifest })
    }

    pub fn manifest(&self) -> &ViewerManifest {
        &self.manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
