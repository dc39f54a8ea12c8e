use std::sync::Arc;

use tracing::error;

use crate::{
    application::render::{RenderedResponse, status_for},
    domain::codes::ErrorCode,
    presentation::views::render_generic_error,
};

use super::StaticArtifactCache;

const SOURCE: &str = "application::error_pages::formatter";

/// Last-resort error output once no error page could be rendered.
pub struct FriendlyErrorFormatter {
    cache: Arc<StaticArtifactCache>,
}

impl FriendlyErrorFormatter {
    pub fn new(cache: Arc<StaticArtifactCache>) -> Self {
        Self { cache }
    }

    /// AJAX callers get the plain reason phrase. Everyone else gets the
    /// static copy when there is one, else the built-in generic page.
    pub async fn output(&self, code: ErrorCode, is_ajax: bool) -> RenderedResponse {
        let status = status_for(code);
        if is_ajax {
            return RenderedResponse::text(status, code.reason());
        }

        if let Some(content) = self.cache.read(code).await {
            return RenderedResponse::html(status, content);
        }

        match render_generic_error(code) {
            Ok(html) => RenderedResponse::html(status, html),
            Err(err) => {
                error!(
                    target = SOURCE,
                    op = "output",
                    code = code.as_u16(),
                    error = %err,
                    "failed to render generic error page"
                );
                RenderedResponse::text(status, code.reason())
            }
        }
    }
}
