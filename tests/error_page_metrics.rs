use std::{collections::HashSet, sync::Arc};

use bytes::Bytes;
use errorpage::{
    application::{
        artifacts::ArtifactStore,
        error_pages::{ErrorPageConfig, ErrorPageServices},
        render::RenderPipeline,
        repos::PagesRepo,
        theme::ThemeState,
    },
    domain::{codes::ErrorCode, types::Stage},
    infra::{
        artifacts::InMemoryArtifactStore, pages::InMemoryPagesRepo,
        render::TemplateRenderPipeline, requirements::NoopAssetRequirements,
    },
};
use metrics_util::debugging::DebuggingRecorder;

#[tokio::test]
async fn error_page_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let pages = Arc::new(InMemoryPagesRepo::new());
    let store = Arc::new(InMemoryArtifactStore::new());
    let themes = Arc::new(ThemeState::default());
    let renderer: Arc<dyn RenderPipeline> =
        Arc::new(TemplateRenderPipeline::new(pages.clone(), themes.clone()));
    let services = ErrorPageServices::new(
        ErrorPageConfig::default(),
        pages.clone(),
        store.clone(),
        renderer,
        Arc::new(NoopAssetRequirements),
        themes,
    );

    // Bootstrap writes artifacts and reads them for the exists check.
    let reports = services.defaults.ensure().await;
    assert_eq!(reports.len(), 2);

    // Dynamic path.
    let dynamic = services
        .responder
        .respond_for(ErrorCode::NOT_FOUND, None, None)
        .await
        .expect("respond");
    assert!(dynamic.is_some());

    // Static path.
    store
        .set_content("error-503.html", Bytes::from_static(b"<p>down</p>"))
        .await
        .expect("seed");
    let cached = services
        .responder
        .respond_for(ErrorCode::new(503).expect("valid"), None, None)
        .await
        .expect("respond");
    assert!(cached.is_some());

    // Nothing available.
    let none = services
        .responder
        .respond_for(ErrorCode::FORBIDDEN, None, None)
        .await
        .expect("respond");
    assert!(none.is_none());
    assert!(
        pages
            .find_first_by_error_code(ErrorCode::FORBIDDEN, Stage::Live)
            .await
            .expect("lookup")
            .is_none()
    );

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for metric in [
        "errorpage_artifact_read_total",
        "errorpage_artifact_write_total",
        "errorpage_response_total",
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
