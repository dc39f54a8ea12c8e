//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    codes::ErrorCode,
    entities::{NewPage, PageRecord},
    types::Stage,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[async_trait]
pub trait PagesRepo: Send + Sync {
    /// First error page answering for `code` on `stage`. When several pages
    /// claim the same code, which one wins follows the store's lookup order
    /// and is otherwise unspecified.
    async fn find_first_by_error_code(
        &self,
        code: ErrorCode,
        stage: Stage,
    ) -> Result<Option<PageRecord>, RepoError>;

    /// Live page at `slug`, if one is published.
    async fn find_live_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, RepoError>;

    async fn create_page(&self, page: NewPage) -> Result<PageRecord, RepoError>;

    /// Replace the draft title and content. The live stage keeps serving the
    /// previous revision until the next publish.
    async fn update_draft(
        &self,
        id: Uuid,
        title: &str,
        content_html: &str,
    ) -> Result<PageRecord, RepoError>;

    /// Copy the current draft revision to the live stage and return the
    /// live copy.
    async fn publish_page(&self, id: Uuid) -> Result<PageRecord, RepoError>;
}
