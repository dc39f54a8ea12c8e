use std::sync::Arc;

use crate::{
    application::render::{RenderedResponse, Session},
    domain::codes::ErrorCode,
};

use super::{ErrorPageError, ErrorResponder};

/// What the request layer knows about the request that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub session: Option<Session>,
    /// `X-Requested-With: XMLHttpRequest`
    pub is_ajax: bool,
    /// Served by the administrative surface.
    pub is_admin: bool,
}

/// Controller extension consulted before the framework emits its own error
/// output.
pub struct ErrorPageHook {
    responder: Arc<ErrorResponder>,
}

impl ErrorPageHook {
    pub fn new(responder: Arc<ErrorResponder>) -> Self {
        Self { responder }
    }

    /// A replacement response carrying `code`, or `None` to let the caller
    /// fall back. AJAX and admin requests are never intercepted.
    pub async fn on_before_http_error(
        &self,
        code: ErrorCode,
        context: &ErrorContext,
        message: Option<&str>,
    ) -> Result<Option<RenderedResponse>, ErrorPageError> {
        if context.is_ajax || context.is_admin {
            return Ok(None);
        }
        self.responder
            .respond_for(code, message, context.session.as_ref())
            .await
    }
}
