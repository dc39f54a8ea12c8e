use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    application::{
        error::HttpError,
        error_pages::{
            BootstrapOutcome, DefaultErrorPages, ErrorCodeRegistry, ErrorPagePublisher,
            PublishOutcome, StaticArtifactCache,
        },
        render::RenderedResponse,
    },
    domain::{
        codes::{ErrorCode, ErrorCodeEntry},
        entities::PageRecord,
    },
};

use super::{
    middleware::{log_responses, set_admin_request_context},
    repo_error_to_http,
};

#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<ErrorCodeRegistry>,
    pub publisher: Arc<ErrorPagePublisher>,
    pub defaults: Arc<DefaultErrorPages>,
    pub cache: Arc<StaticArtifactCache>,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/error-codes", get(error_codes))
        .route("/pages/{id}", put(save_draft))
        .route("/pages/{id}/publish", post(publish_page))
        .route("/error-pages/defaults", post(ensure_defaults))
        .route("/error-pages/{code}/static", get(static_error_page))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_admin_request_context))
}

async fn error_codes(State(state): State<AdminState>) -> Json<Vec<ErrorCodeEntry>> {
    Json(state.registry.available_codes())
}

#[derive(Debug, Deserialize)]
struct DraftForm {
    title: String,
    content_html: String,
}

async fn save_draft(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Json(form): Json<DraftForm>,
) -> Result<Json<PageRecord>, HttpError> {
    state
        .publisher
        .save_draft(id, &form.title, &form.content_html)
        .await
        .map(Json)
        .map_err(|err| repo_error_to_http("infra::http::admin::save_draft", err))
}

async fn publish_page(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublishOutcome>, HttpError> {
    state
        .publisher
        .publish(id)
        .await
        .map(Json)
        .map_err(|err| repo_error_to_http("infra::http::admin::publish_page", err))
}

#[derive(Debug, Serialize)]
struct BootstrapLine {
    code: ErrorCode,
    outcome: BootstrapOutcome,
    message: Option<String>,
}

async fn ensure_defaults(State(state): State<AdminState>) -> Json<Vec<BootstrapLine>> {
    let reports = state.defaults.ensure().await;

    Json(
        reports
            .into_iter()
            .map(|report| BootstrapLine {
                code: report.code,
                outcome: report.outcome,
                message: report.operator_message(),
            })
            .collect(),
    )
}

async fn static_error_page(
    State(state): State<AdminState>,
    Path(code): Path<u16>,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::admin::static_error_page";

    let code = ErrorCode::new(code).map_err(|err| {
        HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Invalid error code",
            err.to_string(),
        )
    })?;

    match state.cache.read(code).await {
        Some(content) => Ok(RenderedResponse::html(StatusCode::OK, content).into_response()),
        None => Err(HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "No static copy stored",
            format!("no static artifact stored for {code}"),
        )),
    }
}
