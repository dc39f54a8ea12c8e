//! Test doubles shared by the error page service tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;

use uuid::Uuid;

use crate::{
    application::{
        artifacts::{ArtifactStore, StoreError},
        render::{RenderError, RenderPipeline, RenderedResponse, Session, SyntheticRequest},
        repos::{PagesRepo, RepoError},
        theme::ThemeState,
    },
    domain::{
        codes::ErrorCode,
        entities::{NewPage, PageRecord},
        types::Stage,
    },
};

/// Fails the test if the static path performs any store I/O.
pub(crate) struct UntouchableStore;

#[async_trait]
impl ArtifactStore for UntouchableStore {
    async fn get_content(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        panic!("artifact store read `{key}` while static files are disabled");
    }

    async fn set_content(&self, key: &str, _content: Bytes) -> Result<(), StoreError> {
        panic!("artifact store write `{key}` while static files are disabled");
    }
}

/// Store that refuses every operation, like a read-only filesystem.
pub(crate) struct RefusingStore;

#[async_trait]
impl ArtifactStore for RefusingStore {
    async fn get_content(&self, _key: &str) -> Result<Option<Bytes>, StoreError> {
        Err(StoreError::Rejected("permission denied".to_string()))
    }

    async fn set_content(&self, _key: &str, _content: Bytes) -> Result<(), StoreError> {
        Err(StoreError::Rejected("permission denied".to_string()))
    }
}

/// Page store whose backend is unreachable.
pub(crate) struct UnavailablePagesRepo;

impl UnavailablePagesRepo {
    fn offline() -> RepoError {
        RepoError::Persistence("database offline".to_string())
    }
}

#[async_trait]
impl PagesRepo for UnavailablePagesRepo {
    async fn find_first_by_error_code(
        &self,
        _code: ErrorCode,
        _stage: Stage,
    ) -> Result<Option<PageRecord>, RepoError> {
        Err(Self::offline())
    }

    async fn find_live_by_slug(&self, _slug: &str) -> Result<Option<PageRecord>, RepoError> {
        Err(Self::offline())
    }

    async fn create_page(&self, _page: NewPage) -> Result<PageRecord, RepoError> {
        Err(Self::offline())
    }

    async fn update_draft(
        &self,
        _id: Uuid,
        _title: &str,
        _content_html: &str,
    ) -> Result<PageRecord, RepoError> {
        Err(Self::offline())
    }

    async fn publish_page(&self, _id: Uuid) -> Result<PageRecord, RepoError> {
        Err(Self::offline())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnonymousMode {
    Render,
    Empty,
    Fail,
}

/// Render pipeline that records what it was asked to do and which themes
/// were active at the time.
pub(crate) struct StubPipeline {
    themes: Arc<ThemeState>,
    anonymous: AnonymousMode,
    fail_synthetic: bool,
    /// Scheduler yields per anonymous url, to interleave concurrent renders.
    yields: Vec<(String, usize)>,
    pub(crate) anonymous_urls: Mutex<Vec<String>>,
    pub(crate) themes_seen: Mutex<Vec<Vec<String>>>,
    pub(crate) synthetic: Mutex<Vec<(PageRecord, SyntheticRequest)>>,
}

impl StubPipeline {
    pub(crate) fn new(themes: Arc<ThemeState>) -> Self {
        Self {
            themes,
            anonymous: AnonymousMode::Render,
            fail_synthetic: false,
            yields: Vec::new(),
            anonymous_urls: Mutex::new(Vec::new()),
            themes_seen: Mutex::new(Vec::new()),
            synthetic: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_anonymous(mut self, mode: AnonymousMode) -> Self {
        self.anonymous = mode;
        self
    }

    pub(crate) fn yielding(mut self, url: &str, times: usize) -> Self {
        self.yields.push((url.to_string(), times));
        self
    }

    pub(crate) fn failing_synthetic(mut self) -> Self {
        self.fail_synthetic = true;
        self
    }

    pub(crate) fn synthetic_calls(&self) -> Vec<(PageRecord, SyntheticRequest)> {
        self.synthetic.lock().expect("stub lock").clone()
    }

    pub(crate) fn anonymous_calls(&self) -> Vec<String> {
        self.anonymous_urls.lock().expect("stub lock").clone()
    }

    pub(crate) fn observed_themes(&self) -> Vec<Vec<String>> {
        self.themes_seen.lock().expect("stub lock").clone()
    }
}

#[async_trait]
impl RenderPipeline for StubPipeline {
    async fn render_public(
        &self,
        url: &str,
        _session: Option<&Session>,
    ) -> Result<RenderedResponse, RenderError> {
        Ok(RenderedResponse::html(
            StatusCode::OK,
            format!("<html>public {url}</html>"),
        ))
    }

    async fn render_as_anonymous(&self, url: &str) -> Result<RenderedResponse, RenderError> {
        let themes = self.themes.active();
        self.anonymous_urls
            .lock()
            .expect("stub lock")
            .push(url.to_string());
        self.themes_seen
            .lock()
            .expect("stub lock")
            .push(themes.clone());

        let times = self
            .yields
            .iter()
            .find(|(target, _)| target == url)
            .map_or(0, |(_, times)| *times);
        for _ in 0..times {
            tokio::task::yield_now().await;
        }

        match self.anonymous {
            AnonymousMode::Render => Ok(RenderedResponse::html(
                StatusCode::OK,
                format!("<html>anonymous {url} [{}]</html>", themes.join(",")),
            )),
            AnonymousMode::Empty => Ok(RenderedResponse::empty(StatusCode::OK)),
            AnonymousMode::Fail => Err(RenderError::Template("layout missing".to_string())),
        }
    }

    async fn handle_synthetic_request(
        &self,
        page: &PageRecord,
        request: &SyntheticRequest,
    ) -> Result<RenderedResponse, RenderError> {
        self.synthetic
            .lock()
            .expect("stub lock")
            .push((page.clone(), request.clone()));

        if self.fail_synthetic {
            return Err(RenderError::Pipeline("controller exploded".to_string()));
        }

        Ok(RenderedResponse::html(
            StatusCode::OK,
            format!("<h1>{}</h1>{}", page.title, page.content_html),
        ))
    }
}
