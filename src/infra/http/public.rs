use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::{Path, State},
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::error;

use crate::{
    application::{
        error::{ErrorReport, HttpError},
        error_pages::{ErrorPageHook, FriendlyErrorFormatter},
        render::{RenderError, RenderPipeline},
        repos::RepoError,
    },
    domain::codes::ErrorCode,
};

use super::middleware::{RequestContext, log_responses, set_request_context};

const SOURCE: &str = "infra::http::public";

#[derive(Clone)]
pub struct HttpState {
    pub renderer: Arc<dyn RenderPipeline>,
    pub hook: Arc<ErrorPageHook>,
    pub formatter: Arc<FriendlyErrorFormatter>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/{slug}", get(page))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index(
    State(state): State<HttpState>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    render_live(&state, &ctx, "/").await
}

async fn page(
    State(state): State<HttpState>,
    Extension(ctx): Extension<RequestContext>,
    Path(slug): Path<String>,
) -> Response {
    render_live(&state, &ctx, &format!("/{slug}")).await
}

async fn fallback(
    State(state): State<HttpState>,
    Extension(ctx): Extension<RequestContext>,
    uri: Uri,
) -> Response {
    let error = HttpError::new(
        "infra::http::public::fallback",
        StatusCode::NOT_FOUND,
        "Page not found",
        format!("no route for {}", uri.path()),
    );
    error_response(&state, &ctx, ErrorCode::NOT_FOUND, error).await
}

async fn render_live(state: &HttpState, ctx: &RequestContext, url: &str) -> Response {
    match state.renderer.render_public(url, ctx.session.as_ref()).await {
        Ok(rendered) => rendered.into_response(),
        Err(RenderError::Repo(RepoError::NotFound)) => {
            let error = HttpError::new(
                "infra::http::public::render_live",
                StatusCode::NOT_FOUND,
                "Page not found",
                format!("no live page at {url}"),
            );
            error_response(state, ctx, ErrorCode::NOT_FOUND, error).await
        }
        Err(err) => {
            let error = HttpError::from_error(
                "infra::http::public::render_live",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Page rendering failed",
                &err,
            );
            error_response(state, ctx, ErrorCode::INTERNAL_SERVER_ERROR, error).await
        }
    }
}

/// Give the error page hook first refusal, then fall back to the friendly
/// formatter. The original diagnostic stays attached for response logging.
async fn error_response(
    state: &HttpState,
    ctx: &RequestContext,
    code: ErrorCode,
    error: HttpError,
) -> Response {
    let report = error.report().clone();
    let rendered = match state
        .hook
        .on_before_http_error(code, &ctx.error_context(), error.detail())
        .await
    {
        Ok(Some(rendered)) => rendered,
        Ok(None) => state.formatter.output(code, ctx.is_ajax).await,
        Err(err) => {
            error!(
                target = SOURCE,
                op = "error_response",
                code = code.as_u16(),
                request_id = %ctx.request_id,
                error = %err,
                "error page rendering failed"
            );
            let mut response = state
                .formatter
                .output(code, ctx.is_ajax)
                .await
                .into_response();
            ErrorReport::from_error(SOURCE, response.status(), &err).attach(&mut response);
            return response;
        }
    };

    let mut response = rendered.into_response();
    report.attach(&mut response);
    response
}
