//! In-memory page store, optionally seeded from a TOML content file.

use std::{path::Path, sync::RwLock};

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    application::repos::{PagesRepo, RepoError},
    domain::{
        codes::ErrorCode,
        entities::{NewPage, PageRecord},
        pages::ErrorCapability,
        types::{PageKind, Stage},
    },
    infra::error::InfraError,
    util::lock::{rw_read, rw_write},
};

const SOURCE: &str = "infra::pages::InMemoryPagesRepo";

#[derive(Debug, Clone)]
struct StoredPage {
    draft: PageRecord,
    live: Option<PageRecord>,
}

impl StoredPage {
    fn stage(&self, stage: Stage) -> Option<&PageRecord> {
        match stage {
            Stage::Draft => Some(&self.draft),
            Stage::Live => self.live.as_ref(),
        }
    }
}

/// Ordered page store. Insertion order is lookup order.
#[derive(Debug, Default)]
pub struct InMemoryPagesRepo {
    pages: RwLock<Vec<StoredPage>>,
}

impl InMemoryPagesRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from a `[[pages]]` TOML document.
    pub fn from_toml(source: &str) -> Result<Self, InfraError> {
        let seed: SeedFile = toml::from_str(source)
            .map_err(|err| InfraError::configuration(format!("invalid pages file: {err}")))?;

        let repo = Self::new();
        let now = OffsetDateTime::now_utc();
        for entry in seed.pages {
            let published = entry.published;
            let new_page = entry.into_new_page()?;
            let mut record = new_page.into_record(Uuid::new_v4(), now);
            if published {
                record.mark_published(now);
            }
            repo.insert(record);
        }
        Ok(repo)
    }

    /// Read and parse the seed file at `path`.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        let source = std::fs::read_to_string(path)?;
        let repo = Self::from_toml(&source)?;
        info!(
            target = SOURCE,
            path = %path.display(),
            pages = repo.len(),
            "loaded page content"
        );
        Ok(repo)
    }

    /// Store `record` as-is. Published records also populate the live stage.
    pub fn insert(&self, record: PageRecord) {
        let live = record.is_published().then(|| record.clone());
        rw_write(&self.pages, SOURCE, "insert").push(StoredPage {
            draft: record,
            live,
        });
    }

    pub fn len(&self) -> usize {
        rw_read(&self.pages, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PagesRepo for InMemoryPagesRepo {
    async fn find_first_by_error_code(
        &self,
        code: ErrorCode,
        stage: Stage,
    ) -> Result<Option<PageRecord>, RepoError> {
        let pages = rw_read(&self.pages, SOURCE, "find_first_by_error_code");
        Ok(pages
            .iter()
            .filter_map(|stored| stored.stage(stage))
            .find(|page| page.error_code() == Some(code))
            .cloned())
    }

    async fn find_live_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, RepoError> {
        let slug = slug.trim_matches('/');
        let pages = rw_read(&self.pages, SOURCE, "find_live_by_slug");
        Ok(pages
            .iter()
            .filter_map(|stored| stored.live.as_ref())
            .find(|page| page.slug == slug)
            .cloned())
    }

    async fn create_page(&self, page: NewPage) -> Result<PageRecord, RepoError> {
        let slug = page.slug.trim_matches('/').to_string();
        if slug.is_empty() {
            return Err(RepoError::InvalidInput {
                message: "page slug must not be empty".to_string(),
            });
        }

        let mut pages = rw_write(&self.pages, SOURCE, "create_page");
        if pages.iter().any(|stored| stored.draft.slug == slug) {
            return Err(RepoError::Duplicate {
                constraint: "pages_slug_key".to_string(),
            });
        }

        let record =
            NewPage { slug, ..page }.into_record(Uuid::new_v4(), OffsetDateTime::now_utc());
        pages.push(StoredPage {
            draft: record.clone(),
            live: None,
        });
        Ok(record)
    }

    async fn update_draft(
        &self,
        id: Uuid,
        title: &str,
        content_html: &str,
    ) -> Result<PageRecord, RepoError> {
        let mut pages = rw_write(&self.pages, SOURCE, "update_draft");
        let stored = pages
            .iter_mut()
            .find(|stored| stored.draft.id == id)
            .ok_or(RepoError::NotFound)?;
        stored
            .draft
            .edit_draft(title, content_html, OffsetDateTime::now_utc());
        Ok(stored.draft.clone())
    }

    async fn publish_page(&self, id: Uuid) -> Result<PageRecord, RepoError> {
        let mut pages = rw_write(&self.pages, SOURCE, "publish_page");
        let stored = pages
            .iter_mut()
            .find(|stored| stored.draft.id == id)
            .ok_or(RepoError::NotFound)?;

        stored.draft.mark_published(OffsetDateTime::now_utc());
        stored.live = Some(stored.draft.clone());
        Ok(stored.draft.clone())
    }
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    pages: Vec<SeedPage>,
}

#[derive(Debug, Deserialize)]
struct SeedPage {
    slug: String,
    title: String,
    #[serde(default)]
    content_html: String,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default = "default_published")]
    published: bool,
}

fn default_published() -> bool {
    true
}

impl SeedPage {
    fn into_new_page(self) -> Result<NewPage, InfraError> {
        let kind = match self.error_code {
            Some(value) => PageKind::Error {
                code: ErrorCode::new(value).map_err(|err| {
                    InfraError::configuration(format!("page `{}`: {err}", self.slug))
                })?,
            },
            None => PageKind::Standard,
        };
        Ok(NewPage {
            slug: self.slug.trim_matches('/').to_string(),
            title: self.title,
            content_html: self.content_html,
            kind,
        })
    }
}
