//! Rendering ports: the request pipeline that turns pages into responses and
//! the asset-requirement state it accumulates.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use thiserror::Error;

use crate::{
    application::repos::RepoError,
    domain::{codes::ErrorCode, entities::PageRecord},
};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template rendering failed: {0}")]
    Template(String),
    #[error("render failed: {0}")]
    Repo(#[from] RepoError),
    #[error("render pipeline failed: {0}")]
    Pipeline(String),
}

/// A signed-in visitor's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Internal request used to render a page outside normal routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticRequest {
    pub method: Method,
    pub path: String,
    pub session: Option<Session>,
}

impl SyntheticRequest {
    /// A bodiless GET that inherits the caller's session.
    pub fn get(session: Option<Session>) -> Self {
        Self {
            method: Method::GET,
            path: String::new(),
            session,
        }
    }
}

/// A fully rendered response.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RenderedResponse {
    pub fn html(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: vec![(CONTENT_TYPE.to_string(), HTML_CONTENT_TYPE.to_string())],
            body: body.into(),
        }
    }

    pub fn text(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: vec![(CONTENT_TYPE.to_string(), TEXT_CONTENT_TYPE.to_string())],
            body: body.into(),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl IntoResponse for RenderedResponse {
    fn into_response(self) -> Response {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match builder.body(Body::from(self.body)) {
            Ok(response) => response,
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Status code carried by responses for `code`.
pub fn status_for(code: ErrorCode) -> StatusCode {
    StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[async_trait]
pub trait RenderPipeline: Send + Sync {
    /// Render the live page at `url` for the given session.
    async fn render_public(
        &self,
        url: &str,
        session: Option<&Session>,
    ) -> Result<RenderedResponse, RenderError>;

    /// Render the live page at `url` as an unauthenticated visitor.
    async fn render_as_anonymous(&self, url: &str) -> Result<RenderedResponse, RenderError>;

    /// Run `page` through the page controller with an internal request.
    async fn handle_synthetic_request(
        &self,
        page: &PageRecord,
        request: &SyntheticRequest,
    ) -> Result<RenderedResponse, RenderError>;
}

/// Per-request CSS/JS aggregation state held by the rendering system.
pub trait AssetRequirements: Send + Sync {
    fn clear(&self);

    fn clear_combined_files(&self);
}
