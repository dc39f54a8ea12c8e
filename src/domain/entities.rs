//! Domain entities mirrored from the page store.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{
    codes::ErrorCode,
    types::{PageKind, PageStatus},
};

/// A stored page. Error pages are the `PageKind::Error` variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub content_html: String,
    pub kind: PageKind,
    pub status: PageStatus,
    pub draft_revision: u32,
    pub live_revision: Option<u32>,
    pub show_in_menus: bool,
    pub show_in_search: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Diagnostic for a single error response. Never persisted.
    #[serde(skip)]
    pub response_error_message: Option<String>,
}

impl PageRecord {
    /// Public URL path of the live version.
    pub fn live_link(&self) -> String {
        format!("/{}", self.slug.trim_matches('/'))
    }

    /// True when the live stage carries the latest draft revision.
    pub fn is_live_version(&self) -> bool {
        self.status == PageStatus::Published && self.live_revision == Some(self.draft_revision)
    }

    pub fn is_published(&self) -> bool {
        self.status == PageStatus::Published && self.live_revision.is_some()
    }

    /// Copy the current draft revision to the live stage.
    pub fn mark_published(&mut self, now: OffsetDateTime) {
        self.status = PageStatus::Published;
        self.live_revision = Some(self.draft_revision);
        self.published_at = Some(now);
        self.updated_at = now;
    }

    /// Replace draft content, leaving the live stage behind until the next
    /// publish.
    pub fn edit_draft(
        &mut self,
        title: impl Into<String>,
        content_html: impl Into<String>,
        now: OffsetDateTime,
    ) {
        self.title = title.into();
        self.content_html = content_html.into();
        self.draft_revision += 1;
        self.updated_at = now;
    }
}

/// Values for a page that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPage {
    pub slug: String,
    pub title: String,
    pub content_html: String,
    pub kind: PageKind,
}

impl NewPage {
    pub fn error_page(
        code: ErrorCode,
        slug: impl Into<String>,
        title: impl Into<String>,
        content_html: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            content_html: content_html.into(),
            kind: PageKind::Error { code },
        }
    }

    /// Materialise a stored draft. Error pages stay out of menus and search.
    pub fn into_record(self, id: Uuid, now: OffsetDateTime) -> PageRecord {
        let listed = self.kind.error_code().is_none();
        PageRecord {
            id,
            slug: self.slug,
            title: self.title,
            content_html: self.content_html,
            kind: self.kind,
            status: PageStatus::Draft,
            draft_revision: 1,
            live_revision: None,
            show_in_menus: listed,
            show_in_search: listed,
            published_at: None,
            created_at: now,
            updated_at: now,
            response_error_message: None,
        }
    }
}
