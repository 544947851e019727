use async_trait::async_trait;
use courtlist_model::ArtifactRef;
use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};
use tracing::debug;

use super::ContentStore;
use crate::error::{PublicationError, Result};

/// Rendered artifacts kept in a `cacache` directory.
///
/// The cache key is `folder/name`, which doubles as the artifact reference.
/// Content is integrity-checked on read.
#[derive(Clone)]
pub struct CacacheContentStore {
    root: PathBuf,
}

impl fmt::Debug for CacacheContentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacacheContentStore").field(&self.root).finish()
    }
}

impl CacacheContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_for(folder: &str, name: &str) -> Result<String> {
        let folder = folder.trim().trim_matches('/');
        let name = name.trim().trim_matches('/');
        if folder.is_empty() || name.is_empty() {
            return Err(PublicationError::StorageFailed(format!(
                "artifact folder and name must be non-empty (folder={folder:?}, name={name:?})"
            )));
        }
        Ok(format!("{folder}/{name}"))
    }
}

#[async_trait]
impl ContentStore for CacacheContentStore {
    async fn store(
        &self,
        folder: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<ArtifactRef> {
        let key = Self::key_for(folder, name)?;
        let integrity = cacache::write(&self.root, &key, bytes)
            .await
            .map_err(|e| {
                PublicationError::StorageFailed(format!(
                    "cacache write failed for {key}: {e}"
                ))
            })?;

        debug!(key = %key, %integrity, bytes = bytes.len(), "artifact stored");
        Ok(ArtifactRef::new(key))
    }

    async fn fetch(&self, reference: &ArtifactRef) -> Result<Vec<u8>> {
        let key = reference.as_str();
        cacache::read(&self.root, key).await.map_err(|e| match e {
            cacache::Error::EntryNotFound(_, _) => {
                PublicationError::NotFound(format!("artifact not found: {key}"))
            }
            cacache::Error::IntegrityError(err) => {
                PublicationError::StorageFailed(format!(
                    "artifact failed integrity check: {key} ({err})"
                ))
            }
            cacache::Error::SizeMismatch(wanted, actual) => {
                PublicationError::StorageFailed(format!(
                    "artifact size mismatch: key={key}, wanted={wanted}, actual={actual}"
                ))
            }
            cacache::Error::IoError(_, msg) => PublicationError::StorageFailed(
                format!("cacache read I/O error: {msg}"),
            ),
            cacache::Error::SerdeError(_, msg) => {
                PublicationError::StorageFailed(format!(
                    "cacache read serde error: {msg}"
                ))
            }
        })
    }

    async fn list(&self, folder: &str) -> Result<Vec<ArtifactRef>> {
        let prefix = format!("{}/", folder.trim_matches('/'));
        let root = self.root.clone();

        // The index walk is synchronous file I/O.
        let keys = tokio::task::spawn_blocking(move || {
            let mut keys = BTreeSet::new();
            if !root.exists() {
                return Ok(keys);
            }
            for entry in cacache::list_sync(&root) {
                let entry = entry.map_err(|e| {
                    PublicationError::StorageFailed(format!(
                        "cacache index scan failed: {e}"
                    ))
                })?;
                if entry.key.starts_with(&prefix) {
                    keys.insert(entry.key);
                }
            }
            Ok::<_, PublicationError>(keys)
        })
        .await
        .map_err(|e| {
            PublicationError::Internal(format!(
                "artifact listing task failed: {e}"
            ))
        })??;

        Ok(keys.into_iter().map(ArtifactRef::new).collect())
    }
}
