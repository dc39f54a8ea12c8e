//! Askama-backed render pipeline serving live pages.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::{
    application::{
        render::{
            RenderError, RenderPipeline, RenderedResponse, Session, SyntheticRequest, status_for,
        },
        repos::{PagesRepo, RepoError},
        theme::ThemeState,
    },
    domain::{entities::PageRecord, pages::ErrorCapability},
    presentation::views::{LayoutContext, PageTemplate, PageView, render_template},
};

const HOME_SLUG: &str = "home";

pub struct TemplateRenderPipeline {
    pages: Arc<dyn PagesRepo>,
    themes: Arc<ThemeState>,
}

impl TemplateRenderPipeline {
    pub fn new(pages: Arc<dyn PagesRepo>, themes: Arc<ThemeState>) -> Self {
        Self { pages, themes }
    }

    async fn load_live(&self, url: &str) -> Result<PageRecord, RenderError> {
        let slug = url.trim_matches('/');
        let slug = if slug.is_empty() { HOME_SLUG } else { slug };
        self.pages
            .find_live_by_slug(slug)
            .await?
            .ok_or(RenderError::Repo(RepoError::NotFound))
    }

    /// Error pages always answer with their own status code.
    fn render_page(
        &self,
        page: &PageRecord,
        signed_in: bool,
    ) -> Result<RenderedResponse, RenderError> {
        let view = LayoutContext::new(
            page.title.clone(),
            self.themes.active(),
            signed_in,
            PageView::from(page),
        );
        let html = render_template(PageTemplate { view })
            .map_err(|err| RenderError::Template(format!("{err}: {}", err.error)))?;
        let status = page.error_code().map_or(StatusCode::OK, status_for);
        Ok(RenderedResponse::html(status, html))
    }
}

#[async_trait]
impl RenderPipeline for TemplateRenderPipeline {
    async fn render_public(
        &self,
        url: &str,
        session: Option<&Session>,
    ) -> Result<RenderedResponse, RenderError> {
        let page = self.load_live(url).await?;
        self.render_page(&page, session.is_some())
    }

    async fn render_as_anonymous(&self, url: &str) -> Result<RenderedResponse, RenderError> {
        let page = self.load_live(url).await?;
        self.render_page(&page, false)
    }

    async fn handle_synthetic_request(
        &self,
        page: &PageRecord,
        request: &SyntheticRequest,
    ) -> Result<RenderedResponse, RenderError> {
        self.render_page(page, request.session.is_some())
    }
}
