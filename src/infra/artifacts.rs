//! Artifact store adapters for generated error pages.

use std::{
    collections::HashMap,
    io::{ErrorKind, Write},
    path::{Component, Path, PathBuf},
    sync::RwLock,
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::{
    application::artifacts::{ArtifactStore, StoreError},
    util::lock::{rw_read, rw_write},
};

/// Filesystem-backed artifact storage rooted at a single directory.
#[derive(Debug)]
pub struct FilesystemArtifactStore {
    root: PathBuf,
}

impl FilesystemArtifactStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for FilesystemArtifactStore {
    async fn get_content(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let absolute = self.resolve(key)?;
        match fs::read(&absolute).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    async fn set_content(&self, key: &str, content: Bytes) -> Result<(), StoreError> {
        let absolute = self.resolve(key)?;
        let parent = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent).await?;

        // Stage next to the target so the rename stays on one filesystem.
        let mut staged = tempfile::Builder::new()
            .prefix(".artifact-")
            .suffix(".tmp")
            .tempfile_in(&parent)?;
        staged.write_all(&content)?;
        staged.flush()?;
        staged
            .persist(&absolute)
            .map_err(|err| StoreError::Io(err.error))?;

        Ok(())
    }
}

/// Process-local artifact storage.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    entries: RwLock<HashMap<String, Bytes>>,
}

const SOURCE: &str = "infra::artifacts::InMemoryArtifactStore";

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = rw_read(&self.entries, SOURCE, "keys")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn get_content(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(rw_read(&self.entries, SOURCE, "get_content")
            .get(key)
            .cloned())
    }

    async fn set_content(&self, key: &str, content: Bytes) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        rw_write(&self.entries, SOURCE, "set_content").insert(key.to_string(), content);
        Ok(())
    }
}
