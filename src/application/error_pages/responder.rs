use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use crate::{
    application::{
        render::{
            AssetRequirements, RenderPipeline, RenderedResponse, Session, SyntheticRequest,
            status_for,
        },
        repos::{PagesRepo, RepoError},
    },
    domain::{codes::ErrorCode, entities::PageRecord, pages::append_error_detail, types::Stage},
};

use super::{ErrorPageConfig, ErrorPageError, StaticArtifactCache};

const SOURCE: &str = "application::error_pages::responder";
const METRIC_RESPONSE_TOTAL: &str = "errorpage_response_total";

/// Builds the response for an HTTP error: the live error page if one exists,
/// otherwise its static copy.
pub struct ErrorResponder {
    config: ErrorPageConfig,
    pages: Arc<dyn PagesRepo>,
    renderer: Arc<dyn RenderPipeline>,
    requirements: Arc<dyn AssetRequirements>,
    cache: Arc<StaticArtifactCache>,
}

impl ErrorResponder {
    pub fn new(
        config: ErrorPageConfig,
        pages: Arc<dyn PagesRepo>,
        renderer: Arc<dyn RenderPipeline>,
        requirements: Arc<dyn AssetRequirements>,
        cache: Arc<StaticArtifactCache>,
    ) -> Self {
        Self {
            config,
            pages,
            renderer,
            requirements,
            cache,
        }
    }

    pub fn cache(&self) -> &StaticArtifactCache {
        &self.cache
    }

    /// Response for `code`, or `None` when neither a live page nor a static
    /// copy exists. Lookup and render failures propagate.
    pub async fn respond_for(
        &self,
        code: ErrorCode,
        message: Option<&str>,
        session: Option<&Session>,
    ) -> Result<Option<RenderedResponse>, ErrorPageError> {
        if let Some(page) = self.error_record_for(code).await? {
            let response = self.render_dynamic(code, page, message, session).await?;
            counter!(METRIC_RESPONSE_TOTAL, "path" => "dynamic").increment(1);
            return Ok(Some(response));
        }

        if let Some(content) = self.cache.read(code).await {
            debug!(
                target = SOURCE,
                op = "respond_for",
                result = "static",
                code = code.as_u16(),
                "serving static error page"
            );
            counter!(METRIC_RESPONSE_TOTAL, "path" => "static").increment(1);
            return Ok(Some(RenderedResponse::html(status_for(code), content)));
        }

        counter!(METRIC_RESPONSE_TOTAL, "path" => "none").increment(1);
        Ok(None)
    }

    /// First live error page for `code`, used wherever a substitute record
    /// for a missing target is needed.
    pub async fn error_record_for(&self, code: ErrorCode) -> Result<Option<PageRecord>, RepoError> {
        self.pages.find_first_by_error_code(code, Stage::Live).await
    }

    async fn render_dynamic(
        &self,
        code: ErrorCode,
        mut page: PageRecord,
        message: Option<&str>,
        session: Option<&Session>,
    ) -> Result<RenderedResponse, ErrorPageError> {
        // Drop CSS/JS collected by the request that failed.
        self.requirements.clear();
        self.requirements.clear_combined_files();

        if let Some(message) = message.filter(|message| !message.is_empty()) {
            if self.config.shows_diagnostics() {
                append_error_detail(&mut page.content_html, message);
            }
            page.response_error_message = Some(message.to_string());
        }

        let request = SyntheticRequest::get(session.cloned());
        let mut response = self.renderer.handle_synthetic_request(&page, &request).await?;
        response.status = status_for(code);

        debug!(
            target = SOURCE,
            op = "respond_for",
            result = "dynamic",
            code = code.as_u16(),
            page_id = %page.id,
            "rendered error page"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use bytes::Bytes;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::{
        application::{
            artifacts::ArtifactStore,
            error_pages::testing::StubPipeline,
            render::RenderError,
            theme::ThemeState,
        },
        config::DeploymentEnvironment,
        domain::entities::NewPage,
        infra::{
            artifacts::InMemoryArtifactStore, pages::InMemoryPagesRepo,
            requirements::RecordingAssetRequirements,
        },
    };

    struct Harness {
        pages: Arc<InMemoryPagesRepo>,
        store: Arc<InMemoryArtifactStore>,
        pipeline: Arc<StubPipeline>,
        requirements: Arc<RecordingAssetRequirements>,
        responder: ErrorResponder,
    }

    fn harness_with(
        config: ErrorPageConfig,
        pipeline: impl FnOnce(Arc<ThemeState>) -> StubPipeline,
    ) -> Harness {
        let themes = Arc::new(ThemeState::default());
        let pages = Arc::new(InMemoryPagesRepo::new());
        let store = Arc::new(InMemoryArtifactStore::new());
        let pipeline = Arc::new(pipeline(themes.clone()));
        let requirements = Arc::new(RecordingAssetRequirements::default());
        let cache = Arc::new(StaticArtifactCache::new(
            config.clone(),
            store.clone(),
            pipeline.clone(),
            themes,
        ));
        let responder = ErrorResponder::new(
            config,
            pages.clone(),
            pipeline.clone(),
            requirements.clone(),
            cache,
        );
        Harness {
            pages,
            store,
            pipeline,
            requirements,
            responder,
        }
    }

    fn harness(config: ErrorPageConfig) -> Harness {
        harness_with(config, StubPipeline::new)
    }

    fn dev_config(append: bool) -> ErrorPageConfig {
        ErrorPageConfig {
            environment: DeploymentEnvironment::Dev,
            dev_append_error_message: append,
            ..ErrorPageConfig::default()
        }
    }

    fn add_live_error_page(repo: &InMemoryPagesRepo, code: ErrorCode, slug: &str, content: &str) {
        let now = OffsetDateTime::now_utc();
        let mut page =
            NewPage::error_page(code, slug, slug, content).into_record(Uuid::new_v4(), now);
        page.mark_published(now);
        repo.insert(page);
    }

    #[tokio::test]
    async fn live_page_renders_with_its_status_code() {
        let h = harness(ErrorPageConfig::default());
        add_live_error_page(&h.pages, ErrorCode::FORBIDDEN, "forbidden", "<p>No entry</p>");

        let response = h
            .responder
            .respond_for(ErrorCode::FORBIDDEN, None, None)
            .await
            .expect("respond")
            .expect("response");

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert!(response.body_text().contains("<p>No entry</p>"));
        assert_eq!(h.requirements.clear_count(), 1);
        assert_eq!(h.requirements.clear_combined_count(), 1);
    }

    #[tokio::test]
    async fn synthetic_request_inherits_session() {
        let h = harness(ErrorPageConfig::default());
        add_live_error_page(&h.pages, ErrorCode::NOT_FOUND, "missing", "<p>Gone</p>");
        let session = Session::new("sess-1");

        h.responder
            .respond_for(ErrorCode::NOT_FOUND, None, Some(&session))
            .await
            .expect("respond");

        let calls = h.pipeline.synthetic_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.session, Some(session));
        assert_eq!(calls[0].1.method, axum::http::Method::GET);
    }

    #[tokio::test]
    async fn diagnostic_shown_only_in_dev_with_append_enabled() {
        let cases = [
            (dev_config(true), true),
            (dev_config(false), false),
            (
                ErrorPageConfig {
                    environment: DeploymentEnvironment::Test,
                    ..ErrorPageConfig::default()
                },
                false,
            ),
            (ErrorPageConfig::default(), false),
        ];

        for (config, visible) in cases {
            let h = harness(config);
            add_live_error_page(
                &h.pages,
                ErrorCode::INTERNAL_SERVER_ERROR,
                "server-error",
                "<p>Oops</p>",
            );

            let response = h
                .responder
                .respond_for(ErrorCode::INTERNAL_SERVER_ERROR, Some("<b>db down</b>"), None)
                .await
                .expect("respond")
                .expect("response");
            let body = response.body_text();

            assert!(!body.contains("<b>db down</b>"));
            assert_eq!(
                body.contains("Error detail: &lt;b&gt;db down&lt;/b&gt;"),
                visible
            );

            let (page, _) = &h.pipeline.synthetic_calls()[0];
            assert_eq!(
                page.response_error_message.as_deref(),
                Some("<b>db down</b>")
            );
        }
    }

    #[tokio::test]
    async fn empty_diagnostic_is_ignored() {
        let h = harness(dev_config(true));
        add_live_error_page(&h.pages, ErrorCode::NOT_FOUND, "missing", "<p>Gone</p>");

        let response = h
            .responder
            .respond_for(ErrorCode::NOT_FOUND, Some(""), None)
            .await
            .expect("respond")
            .expect("response");

        assert!(!response.body_text().contains("Error detail"));
        assert!(
            h.pipeline.synthetic_calls()[0]
                .0
                .response_error_message
                .is_none()
        );
    }

    #[tokio::test]
    async fn falls_back_to_static_artifact_byte_for_byte() {
        let h = harness(ErrorPageConfig::default());
        let artifact = Bytes::from_static(b"<html>\xe2\x9c\x93 cached 503</html>");
        h.store
            .set_content("error-503.html", artifact.clone())
            .await
            .expect("seed artifact");

        let response = h
            .responder
            .respond_for(ErrorCode::new(503).expect("valid"), Some("detail"), None)
            .await
            .expect("respond")
            .expect("response");

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body, artifact);
        assert!(h.pipeline.synthetic_calls().is_empty());
        assert_eq!(h.requirements.clear_count(), 0);
    }

    #[tokio::test]
    async fn nothing_available_yields_none() {
        let h = harness(ErrorPageConfig::default());
        let response = h
            .responder
            .respond_for(ErrorCode::NOT_FOUND, None, None)
            .await
            .expect("respond");
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn unpublished_error_page_is_not_rendered() {
        let h = harness(ErrorPageConfig::default());
        h.pages
            .create_page(NewPage::error_page(
                ErrorCode::NOT_FOUND,
                "missing",
                "Missing",
                "draft",
            ))
            .await
            .expect("create");

        let response = h
            .responder
            .respond_for(ErrorCode::NOT_FOUND, None, None)
            .await
            .expect("respond");
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn render_failures_propagate() {
        let h = harness_with(ErrorPageConfig::default(), |themes| {
            StubPipeline::new(themes).failing_synthetic()
        });
        add_live_error_page(&h.pages, ErrorCode::NOT_FOUND, "missing", "<p>Gone</p>");

        let err = h
            .responder
            .respond_for(ErrorCode::NOT_FOUND, None, None)
            .await
            .expect_err("render failure must surface");
        assert!(matches!(
            err,
            ErrorPageError::Render(RenderError::Pipeline(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_codes_yield_exactly_one_response() {
        let h = harness(ErrorPageConfig::default());
        add_live_error_page(&h.pages, ErrorCode::NOT_FOUND, "missing-a", "<p>A</p>");
        add_live_error_page(&h.pages, ErrorCode::NOT_FOUND, "missing-b", "<p>B</p>");

        let response = h
            .responder
            .respond_for(ErrorCode::NOT_FOUND, None, None)
            .await
            .expect("respond")
            .expect("response");

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        let body = response.body_text();
        assert!(body.contains("<p>A</p>") ^ body.contains("<p>B</p>"));
        assert_eq!(h.pipeline.synthetic_calls().len(), 1);
    }

    #[tokio::test]
    async fn error_record_for_returns_live_page() {
        let h = harness(ErrorPageConfig::default());
        add_live_error_page(&h.pages, ErrorCode::NOT_FOUND, "missing", "<p>Gone</p>");

        let record = h
            .responder
            .error_record_for(ErrorCode::NOT_FOUND)
            .await
            .expect("lookup")
            .expect("record");
        assert_eq!(record.slug, "missing");
        assert!(
            h.responder
                .error_record_for(ErrorCode::INTERNAL_SERVER_ERROR)
                .await
                .expect("lookup")
                .is_none()
        );
    }
}
