//! Error page capability and page-level rules.

use slug::slugify;

use super::{
    codes::ErrorCode,
    entities::{NewPage, PageRecord},
    types::PageKind,
};

/// Implemented by any page-like entity that can answer for an HTTP error code.
pub trait ErrorCapability {
    fn error_code(&self) -> Option<ErrorCode>;

    fn has_error_capability(&self) -> bool {
        self.error_code().is_some()
    }

    /// Error pages are leaves in the site tree.
    fn can_add_children(&self) -> bool {
        !self.has_error_capability()
    }
}

impl ErrorCapability for PageRecord {
    fn error_code(&self) -> Option<ErrorCode> {
        self.kind.error_code()
    }
}

impl ErrorCapability for PageKind {
    fn error_code(&self) -> Option<ErrorCode> {
        (*self).error_code()
    }
}

/// Fixture for a bootstrapped error page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultErrorPageSpec {
    pub code: ErrorCode,
    pub title: String,
    pub content_html: String,
}

impl DefaultErrorPageSpec {
    pub fn new(code: ErrorCode, title: impl Into<String>, content_html: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            content_html: content_html.into(),
        }
    }

    pub fn to_new_page(&self) -> NewPage {
        NewPage::error_page(
            self.code,
            slugify(&self.title),
            self.title.clone(),
            self.content_html.clone(),
        )
    }

    /// The 404 and 500 pages every site is guaranteed to have.
    pub fn builtin() -> Vec<DefaultErrorPageSpec> {
        vec![
            DefaultErrorPageSpec::new(
                ErrorCode::NOT_FOUND,
                "Page not found",
                "<p>Sorry, it seems you were trying to access a page that doesn't exist.</p>\
                 <p>Please check the spelling of the URL you were trying to access and try again.</p>",
            ),
            DefaultErrorPageSpec::new(
                ErrorCode::INTERNAL_SERVER_ERROR,
                "Server error",
                "<p>Sorry, there was a problem with handling your request.</p>",
            ),
        ]
    }
}

/// Append a visible, entity-encoded diagnostic block to page content.
pub fn append_error_detail(content_html: &mut String, message: &str) {
    content_html.push('\n');
    content_html.push_str("<p><b>Error detail: ");
    content_html.push_str(&escape_html(message));
    content_html.push_str("</b></p>");
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
