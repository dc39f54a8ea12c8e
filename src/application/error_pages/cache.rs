use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    application::{
        artifacts::{ArtifactNaming, ArtifactStore, DefaultArtifactNaming, join_key},
        render::RenderPipeline,
        theme::ThemeState,
    },
    domain::{codes::ErrorCode, entities::PageRecord, pages::ErrorCapability},
};

use super::ErrorPageConfig;

const SOURCE: &str = "application::error_pages::cache";
const METRIC_READ_TOTAL: &str = "errorpage_artifact_read_total";
const METRIC_WRITE_TOTAL: &str = "errorpage_artifact_write_total";

/// Static copies of published error pages, keyed by status code.
///
/// Every operation is a no-op returning `false`/`None` when static files are
/// disabled, without touching the store. Store and render failures on this
/// path are logged and never propagate.
pub struct StaticArtifactCache {
    config: ErrorPageConfig,
    store: Arc<dyn ArtifactStore>,
    renderer: Arc<dyn RenderPipeline>,
    themes: Arc<ThemeState>,
    naming: Arc<dyn ArtifactNaming>,
    /// Held for the whole theme swap, render and restore of one write.
    render_lock: Mutex<()>,
}

impl StaticArtifactCache {
    pub fn new(
        config: ErrorPageConfig,
        store: Arc<dyn ArtifactStore>,
        renderer: Arc<dyn RenderPipeline>,
        themes: Arc<ThemeState>,
    ) -> Self {
        Self {
            config,
            store,
            renderer,
            themes,
            naming: Arc::new(DefaultArtifactNaming),
            render_lock: Mutex::new(()),
        }
    }

    /// Replace the file naming strategy.
    pub fn with_naming(mut self, naming: impl ArtifactNaming + 'static) -> Self {
        self.naming = Arc::new(naming);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enable_static_file
    }

    /// Store key for `code`: the configured prefix joined with the file name.
    pub fn artifact_key(&self, code: ErrorCode) -> String {
        let name = self.naming.file_name(code);
        join_key(&[self.config.store_file_prefix.as_str(), name.as_str()])
    }

    /// Whether a non-empty artifact is stored for `page`'s error code.
    pub async fn exists(&self, page: &impl ErrorCapability) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Some(code) = page.error_code() else {
            return false;
        };
        self.fetch(code, "exists").await.is_some()
    }

    /// Render `page` as an anonymous visitor under the frontend themes and
    /// store the body. Returns `false` when nothing could be stored.
    pub async fn write(&self, page: &PageRecord) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Some(code) = page.error_code() else {
            return false;
        };

        let key = self.artifact_key(code);
        let url = page.live_link();

        let rendered = {
            let _serialized = self.render_lock.lock().await;
            let themes = if self.config.frontend_themes.is_empty() {
                self.themes.active()
            } else {
                self.config.frontend_themes.clone()
            };
            let _guard = self.themes.scoped(themes);
            self.renderer.render_as_anonymous(&url).await
        };

        let body = match rendered {
            Ok(response) => response.body,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "write",
                    result = "render_failed",
                    code = code.as_u16(),
                    url = %url,
                    error = %err,
                    "failed to render static error page"
                );
                counter!(METRIC_WRITE_TOTAL, "result" => "render_failed").increment(1);
                return false;
            }
        };

        if body.is_empty() {
            warn!(
                target = SOURCE,
                op = "write",
                result = "empty",
                code = code.as_u16(),
                url = %url,
                "rendered static error page was empty"
            );
            counter!(METRIC_WRITE_TOTAL, "result" => "empty").increment(1);
            return false;
        }

        match self.store.set_content(&key, body).await {
            Ok(()) => {
                debug!(
                    target = SOURCE,
                    op = "write",
                    result = "written",
                    code = code.as_u16(),
                    key = %key,
                    "stored static error page"
                );
                counter!(METRIC_WRITE_TOTAL, "result" => "written").increment(1);
                true
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "write",
                    result = "store_failed",
                    code = code.as_u16(),
                    key = %key,
                    error = %err,
                    "failed to store static error page"
                );
                counter!(METRIC_WRITE_TOTAL, "result" => "store_failed").increment(1);
                false
            }
        }
    }

    /// Stored artifact for `code`. Empty artifacts read as absent.
    pub async fn read(&self, code: ErrorCode) -> Option<Bytes> {
        if !self.is_enabled() {
            return None;
        }
        self.fetch(code, "read").await
    }

    async fn fetch(&self, code: ErrorCode, op: &'static str) -> Option<Bytes> {
        let key = self.artifact_key(code);
        match self.store.get_content(&key).await {
            Ok(Some(content)) if !content.is_empty() => {
                counter!(METRIC_READ_TOTAL, "result" => "hit").increment(1);
                Some(content)
            }
            Ok(_) => {
                counter!(METRIC_READ_TOTAL, "result" => "miss").increment(1);
                None
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op,
                    result = "error",
                    code = code.as_u16(),
                    key = %key,
                    error = %err,
                    "failed to read static error page"
                );
                counter!(METRIC_READ_TOTAL, "result" => "error").increment(1);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::{
        application::error_pages::testing::{
            AnonymousMode, RefusingStore, StubPipeline, UntouchableStore,
        },
        domain::{entities::NewPage, types::PageKind},
        infra::artifacts::InMemoryArtifactStore,
    };

    fn themes(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn published(code: ErrorCode, slug: &str, content: &str) -> PageRecord {
        let now = OffsetDateTime::now_utc();
        let mut page =
            NewPage::error_page(code, slug, slug, content).into_record(Uuid::new_v4(), now);
        page.mark_published(now);
        page
    }

    struct Harness {
        store: Arc<InMemoryArtifactStore>,
        pipeline: Arc<StubPipeline>,
        themes: Arc<ThemeState>,
        cache: StaticArtifactCache,
    }

    fn harness(config: ErrorPageConfig, mode: AnonymousMode) -> Harness {
        let themes = Arc::new(ThemeState::new(themes(&["admin"])));
        let store = Arc::new(InMemoryArtifactStore::new());
        let pipeline = Arc::new(StubPipeline::new(themes.clone()).with_anonymous(mode));
        let cache =
            StaticArtifactCache::new(config, store.clone(), pipeline.clone(), themes.clone());
        Harness {
            store,
            pipeline,
            themes,
            cache,
        }
    }

    #[tokio::test]
    async fn write_then_read_returns_rendered_bytes() {
        let h = harness(ErrorPageConfig::default(), AnonymousMode::Render);
        let page = published(ErrorCode::UNAUTHORIZED, "unauthorised", "Unauthorised");

        assert!(h.cache.write(&page).await);
        let stored = h.cache.read(ErrorCode::UNAUTHORIZED).await.expect("artifact");
        assert_eq!(
            stored,
            Bytes::from("<html>anonymous /unauthorised [default]</html>")
        );
        assert_eq!(h.pipeline.anonymous_calls(), vec!["/unauthorised".to_string()]);

        // Repeated identical publishes are idempotent.
        assert!(h.cache.write(&page).await);
        assert_eq!(h.cache.read(ErrorCode::UNAUTHORIZED).await, Some(stored));
        assert_eq!(h.store.keys(), vec!["error-401.html".to_string()]);
    }

    #[tokio::test]
    async fn write_renders_under_frontend_themes_and_restores_admin_theme() {
        let h = harness(ErrorPageConfig::default(), AnonymousMode::Render);
        let page = published(ErrorCode::NOT_FOUND, "missing", "Missing");

        assert!(h.cache.write(&page).await);
        assert_eq!(h.pipeline.observed_themes(), vec![themes(&["default"])]);
        assert_eq!(h.themes.active(), themes(&["admin"]));
    }

    #[tokio::test]
    async fn overlapping_writes_restore_the_original_theme() {
        let active = Arc::new(ThemeState::new(themes(&["admin"])));
        let store = Arc::new(InMemoryArtifactStore::new());
        let pipeline = Arc::new(
            StubPipeline::new(active.clone())
                .yielding("/missing", 1)
                .yielding("/server-error", 4),
        );
        let cache = StaticArtifactCache::new(
            ErrorPageConfig::default(),
            store.clone(),
            pipeline.clone(),
            active.clone(),
        );
        let missing = published(ErrorCode::NOT_FOUND, "missing", "Missing");
        let server_error = published(ErrorCode::INTERNAL_SERVER_ERROR, "server-error", "Oops");

        let (first, second) = tokio::join!(cache.write(&missing), cache.write(&server_error));

        assert!(first && second);
        assert_eq!(active.active(), themes(&["admin"]));
        assert_eq!(
            pipeline.observed_themes(),
            vec![themes(&["default"]), themes(&["default"])]
        );
        assert_eq!(
            store.keys(),
            vec!["error-404.html".to_string(), "error-500.html".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_render_restores_theme_and_reports_false() {
        let h = harness(ErrorPageConfig::default(), AnonymousMode::Fail);
        let page = published(ErrorCode::NOT_FOUND, "missing", "Missing");

        assert!(!h.cache.write(&page).await);
        assert_eq!(h.themes.active(), themes(&["admin"]));
        assert!(h.store.keys().is_empty());
    }

    #[tokio::test]
    async fn empty_render_is_not_stored() {
        let h = harness(ErrorPageConfig::default(), AnonymousMode::Empty);
        let page = published(ErrorCode::NOT_FOUND, "missing", "Missing");

        assert!(!h.cache.write(&page).await);
        assert!(h.store.keys().is_empty());
        assert!(!h.cache.exists(&page).await);
    }

    #[tokio::test]
    async fn empty_frontend_theme_config_keeps_active_themes() {
        let config = ErrorPageConfig {
            frontend_themes: Vec::new(),
            ..ErrorPageConfig::default()
        };
        let h = harness(config, AnonymousMode::Render);
        let page = published(ErrorCode::NOT_FOUND, "missing", "Missing");

        assert!(h.cache.write(&page).await);
        assert_eq!(h.pipeline.observed_themes(), vec![themes(&["admin"])]);
    }

    #[tokio::test]
    async fn disabled_cache_never_touches_store() {
        let themes = Arc::new(ThemeState::default());
        let pipeline = Arc::new(StubPipeline::new(themes.clone()));
        let cache = StaticArtifactCache::new(
            ErrorPageConfig {
                enable_static_file: false,
                ..ErrorPageConfig::default()
            },
            Arc::new(UntouchableStore),
            pipeline.clone(),
            themes,
        );
        let page = published(ErrorCode::NOT_FOUND, "missing", "Missing");

        assert!(!cache.write(&page).await);
        assert!(!cache.exists(&page).await);
        assert!(cache.read(ErrorCode::NOT_FOUND).await.is_none());
        assert!(pipeline.anonymous_calls().is_empty());
    }

    #[tokio::test]
    async fn disabling_hides_artifacts_that_remain_stored() {
        let h = harness(ErrorPageConfig::default(), AnonymousMode::Render);
        let page = published(ErrorCode::UNAUTHORIZED, "unauthorised", "Unauthorised");
        assert!(h.cache.write(&page).await);

        let disabled = StaticArtifactCache::new(
            ErrorPageConfig {
                enable_static_file: false,
                ..ErrorPageConfig::default()
            },
            h.store.clone(),
            h.pipeline.clone(),
            h.themes.clone(),
        );
        assert!(disabled.read(ErrorCode::UNAUTHORIZED).await.is_none());
        assert_eq!(h.store.keys(), vec!["error-401.html".to_string()]);
    }

    #[tokio::test]
    async fn store_failures_degrade_to_false_and_none() {
        let themes = Arc::new(ThemeState::default());
        let cache = StaticArtifactCache::new(
            ErrorPageConfig::default(),
            Arc::new(RefusingStore),
            Arc::new(StubPipeline::new(themes.clone())),
            themes,
        );
        let page = published(ErrorCode::NOT_FOUND, "missing", "Missing");

        assert!(!cache.write(&page).await);
        assert!(!cache.exists(&page).await);
        assert!(cache.read(ErrorCode::NOT_FOUND).await.is_none());
    }

    #[tokio::test]
    async fn standard_pages_are_skipped() {
        let h = harness(ErrorPageConfig::default(), AnonymousMode::Render);
        let now = OffsetDateTime::now_utc();
        let page = NewPage {
            slug: "about".to_string(),
            title: "About".to_string(),
            content_html: String::new(),
            kind: PageKind::Standard,
        }
        .into_record(Uuid::new_v4(), now);

        assert!(!h.cache.write(&page).await);
        assert!(h.pipeline.anonymous_calls().is_empty());
    }

    #[test]
    fn key_joins_prefix_and_custom_name() {
        let h = harness(
            ErrorPageConfig {
                store_file_prefix: "errors/site".to_string(),
                ..ErrorPageConfig::default()
            },
            AnonymousMode::Render,
        );
        assert_eq!(
            h.cache.artifact_key(ErrorCode::NOT_FOUND),
            "errors/site/error-404.html"
        );

        let cache = h
            .cache
            .with_naming(|code: ErrorCode| format!("error-{code}.en.html"));
        assert_eq!(
            cache.artifact_key(ErrorCode::INTERNAL_SERVER_ERROR),
            "errors/site/error-500.en.html"
        );
    }
}
