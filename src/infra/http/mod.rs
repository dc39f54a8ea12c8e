mod admin;
mod middleware;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use middleware::{RequestContext, SESSION_COOKIE};
pub use public::{HttpState, build_router};

use std::sync::Arc;

use axum::http::StatusCode;

use crate::application::{
    error::HttpError, error_pages::ErrorPageServices, render::RenderPipeline, repos::RepoError,
};

/// Map a repository error to a consistent HTTP error response for admin/public surfaces.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}

impl HttpState {
    pub fn from_services(services: &ErrorPageServices, renderer: Arc<dyn RenderPipeline>) -> Self {
        Self {
            renderer,
            hook: services.hook.clone(),
            formatter: services.formatter.clone(),
        }
    }
}

impl From<&ErrorPageServices> for AdminState {
    fn from(services: &ErrorPageServices) -> Self {
        Self {
            registry: services.registry.clone(),
            publisher: services.publisher.clone(),
            defaults: services.defaults.clone(),
            cache: services.cache.clone(),
        }
    }
}
