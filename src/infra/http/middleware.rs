use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderMap, Request, header::COOKIE},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::{error::ErrorReport, error_pages::ErrorContext, render::Session};

pub const SESSION_COOKIE: &str = "errorpage_session";
const REQUESTED_WITH_HEADER: &str = "x-requested-with";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub session: Option<Session>,
    pub is_ajax: bool,
    pub is_admin: bool,
}

impl RequestContext {
    fn from_headers(headers: &HeaderMap, is_admin: bool) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            session: session_from_headers(headers),
            is_ajax: is_ajax(headers),
            is_admin,
        }
    }

    pub fn error_context(&self) -> ErrorContext {
        ErrorContext {
            session: self.session.clone(),
            is_ajax: self.is_ajax,
            is_admin: self.is_admin,
        }
    }
}

pub async fn set_request_context(request: Request<Body>, next: Next) -> Response {
    attach_context(request, next, false).await
}

pub async fn set_admin_request_context(request: Request<Body>, next: Next) -> Response {
    attach_context(request, next, true).await
}

async fn attach_context(mut request: Request<Body>, next: Next, is_admin: bool) -> Response {
    let ctx = RequestContext::from_headers(request.headers(), is_admin);
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get(REQUESTED_WITH_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
}

fn session_from_headers(headers: &HeaderMap) -> Option<Session> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| Session::new(value))
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let (request_id, is_ajax) = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| (ctx.request_id.clone(), ctx.is_ajax))
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "errorpage::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                ajax = is_ajax,
                "request failed",
            );
        } else {
            warn!(
                target = "errorpage::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                ajax = is_ajax,
                "client request error",
            );
        }
    }

    response
}
