//! Generated-artifact storage port and key naming.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::codes::ErrorCode;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid artifact key `{0}`")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("artifact store rejected write: {0}")]
    Rejected(String),
}

/// Key-value blob store for generated files. Keys are relative POSIX paths.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get_content(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Replace the content at `key`. Readers observe either the previous or
    /// the new content, never a partial write.
    async fn set_content(&self, key: &str, content: Bytes) -> Result<(), StoreError>;
}

/// Maps a status code to the artifact file name. Deployments override this
/// for locale or domain variants.
pub trait ArtifactNaming: Send + Sync {
    fn file_name(&self, code: ErrorCode) -> String;
}

/// `error-{code}.html`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultArtifactNaming;

impl ArtifactNaming for DefaultArtifactNaming {
    fn file_name(&self, code: ErrorCode) -> String {
        format!("error-{code}.html")
    }
}

impl<F> ArtifactNaming for F
where
    F: Fn(ErrorCode) -> String + Send + Sync,
{
    fn file_name(&self, code: ErrorCode) -> String {
        self(code)
    }
}

/// Join path segments with `/`, skipping empty segments and trimming
/// surrounding slashes.
pub fn join_key(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
