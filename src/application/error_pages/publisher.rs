use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    application::repos::{PagesRepo, RepoError},
    domain::{codes::ErrorCode, entities::PageRecord, pages::ErrorCapability},
};

use super::StaticArtifactCache;

const SOURCE: &str = "application::error_pages::publisher";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticFileStatus {
    /// The page is not an error page.
    NotApplicable,
    /// Static files are switched off.
    Disabled,
    Written,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub page: PageRecord,
    pub static_file: StaticFileStatus,
}

impl PublishOutcome {
    /// Operator-facing line about the static copy, for error pages whose
    /// copy was attempted.
    pub fn static_file_message(&self) -> Option<String> {
        let code = self.page.error_code()?;
        match self.static_file {
            StaticFileStatus::Written => Some(format!("{code} error page static copy regenerated")),
            StaticFileStatus::Failed => Some(format!(
                "{code} error page static copy could not be regenerated"
            )),
            StaticFileStatus::NotApplicable | StaticFileStatus::Disabled => None,
        }
    }
}

/// Publishes pages and regenerates the static copy of error pages.
pub struct ErrorPagePublisher {
    pages: Arc<dyn PagesRepo>,
    cache: Arc<StaticArtifactCache>,
}

impl ErrorPagePublisher {
    pub fn new(pages: Arc<dyn PagesRepo>, cache: Arc<StaticArtifactCache>) -> Self {
        Self { pages, cache }
    }

    /// Save an edit to the draft stage. Visitors keep seeing the live copy,
    /// and its static file, until the page is published again.
    pub async fn save_draft(
        &self,
        id: Uuid,
        title: &str,
        content_html: &str,
    ) -> Result<PageRecord, RepoError> {
        let page = self.pages.update_draft(id, title, content_html).await?;
        info!(
            target = SOURCE,
            op = "save_draft",
            page_id = %page.id,
            revision = page.draft_revision,
            "saved page draft"
        );
        Ok(page)
    }

    pub async fn publish(&self, id: Uuid) -> Result<PublishOutcome, RepoError> {
        let page = self.pages.publish_page(id).await?;

        let static_file = match page.error_code() {
            None => StaticFileStatus::NotApplicable,
            Some(_) if !self.cache.is_enabled() => StaticFileStatus::Disabled,
            Some(_) if self.cache.write(&page).await => StaticFileStatus::Written,
            Some(_) => StaticFileStatus::Failed,
        };
        let outcome = PublishOutcome { page, static_file };

        if let Some(message) = outcome.static_file_message() {
            let code = outcome.page.error_code().map(ErrorCode::as_u16);
            if static_file == StaticFileStatus::Failed {
                warn!(
                    target = SOURCE,
                    op = "publish",
                    result = "static_failed",
                    code,
                    page_id = %outcome.page.id,
                    "{message}"
                );
            } else {
                info!(
                    target = SOURCE,
                    op = "publish",
                    result = "written",
                    code,
                    page_id = %outcome.page.id,
                    "{message}"
                );
            }
        }

        Ok(outcome)
    }
}
