use askama::{Error as AskamaError, Template};
use thiserror::Error;

use crate::domain::{codes::ErrorCode, entities::PageRecord, pages::ErrorCapability};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(public_message: &'static str, error: AskamaError) -> Self {
        Self {
            public_message,
            error,
        }
    }
}

pub fn render_template<T: Template>(template: T) -> Result<String, TemplateRenderError> {
    template
        .render()
        .map_err(|err| TemplateRenderError::new("Template rendering failed", err))
}

/// Shared page chrome.
pub struct LayoutContext<T> {
    pub title: String,
    /// Active themes, most specific first.
    pub themes: Vec<String>,
    /// Show the signed-in toolbar.
    pub signed_in: bool,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(title: impl Into<String>, themes: Vec<String>, signed_in: bool, content: T) -> Self {
        Self {
            title: title.into(),
            themes,
            signed_in,
            content,
        }
    }

    pub fn theme_list(&self) -> String {
        self.themes.join(" ")
    }
}

pub struct PageView {
    pub title: String,
    pub content_html: String,
    pub error_code: Option<u16>,
    /// Diagnostic for this response only. Templates may opt in to showing it.
    pub response_error_message: Option<String>,
}

impl From<&PageRecord> for PageView {
    fn from(page: &PageRecord) -> Self {
        Self {
            title: page.title.clone(),
            content_html: page.content_html.clone(),
            error_code: page.error_code().map(ErrorCode::as_u16),
            response_error_message: page.response_error_message.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub view: LayoutContext<PageView>,
}

pub struct GenericErrorView {
    pub code: u16,
    pub reason: &'static str,
}

#[derive(Template)]
#[template(path = "generic_error.html")]
pub struct GenericErrorTemplate {
    pub view: LayoutContext<GenericErrorView>,
}

/// Framework-level error page used when no custom or cached page exists.
pub fn render_generic_error(code: ErrorCode) -> Result<String, TemplateRenderError> {
    let reason = code.reason();
    let view = LayoutContext::new(
        format!("{code} {reason}"),
        Vec::new(),
        false,
        GenericErrorView {
            code: code.as_u16(),
            reason,
        },
    );
    render_template(GenericErrorTemplate { view })
}
