use crate::{
    config::{DeploymentEnvironment, Settings},
    domain::codes::ErrorCode,
};

/// Read-only error page settings shared by every service in this module.
#[derive(Debug, Clone)]
pub struct ErrorPageConfig {
    pub enable_static_file: bool,
    /// Directory prefix for artifact keys. Empty stores at the root.
    pub store_file_prefix: String,
    pub dev_append_error_message: bool,
    /// `None` offers the full catalog.
    pub allowed_error_codes: Option<Vec<ErrorCode>>,
    pub create_default_pages: bool,
    pub environment: DeploymentEnvironment,
    /// Theme set forced while generating static artifacts. Empty keeps the
    /// currently active themes.
    pub frontend_themes: Vec<String>,
}

impl Default for ErrorPageConfig {
    fn default() -> Self {
        Self {
            enable_static_file: true,
            store_file_prefix: String::new(),
            dev_append_error_message: true,
            allowed_error_codes: None,
            create_default_pages: true,
            environment: DeploymentEnvironment::Live,
            frontend_themes: vec!["default".to_string()],
        }
    }
}

impl From<&Settings> for ErrorPageConfig {
    fn from(settings: &Settings) -> Self {
        let error_pages = &settings.error_pages;
        Self {
            enable_static_file: error_pages.enable_static_file,
            store_file_prefix: error_pages.store_file_prefix.clone(),
            dev_append_error_message: error_pages.dev_append_error_message,
            allowed_error_codes: error_pages.allowed_error_codes.as_ref().map(|codes| {
                codes
                    .iter()
                    .filter_map(|code| ErrorCode::new(*code).ok())
                    .collect()
            }),
            create_default_pages: error_pages.create_default_pages,
            environment: settings.environment,
            frontend_themes: settings.themes.frontend.clone(),
        }
    }
}

impl ErrorPageConfig {
    /// Whether a diagnostic message should be shown inside the page body.
    pub fn shows_diagnostics(&self) -> bool {
        self.environment.is_dev() && self.dev_append_error_message
    }
}
