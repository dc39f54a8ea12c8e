//! Error page services: dynamic responses, static artifacts, and the code catalog.

mod cache;
mod config;
mod defaults;
mod formatter;
mod hook;
mod publisher;
mod registry;
mod responder;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use thiserror::Error;

use crate::application::{
    artifacts::ArtifactStore,
    render::{AssetRequirements, RenderError, RenderPipeline},
    repos::{PagesRepo, RepoError},
    theme::ThemeState,
};

pub use cache::StaticArtifactCache;
pub use config::ErrorPageConfig;
pub use defaults::{BootstrapOutcome, BootstrapReport, DefaultErrorPages};
pub use formatter::FriendlyErrorFormatter;
pub use hook::{ErrorContext, ErrorPageHook};
pub use publisher::{ErrorPagePublisher, PublishOutcome, StaticFileStatus};
pub use registry::ErrorCodeRegistry;
pub use responder::ErrorResponder;

/// Failures on the dynamic error page path. These propagate to the caller.
#[derive(Debug, Error)]
pub enum ErrorPageError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// The error page services wired to one set of collaborators.
#[derive(Clone)]
pub struct ErrorPageServices {
    pub registry: Arc<ErrorCodeRegistry>,
    pub cache: Arc<StaticArtifactCache>,
    pub responder: Arc<ErrorResponder>,
    pub publisher: Arc<ErrorPagePublisher>,
    pub defaults: Arc<DefaultErrorPages>,
    pub hook: Arc<ErrorPageHook>,
    pub formatter: Arc<FriendlyErrorFormatter>,
}

impl ErrorPageServices {
    pub fn new(
        config: ErrorPageConfig,
        pages: Arc<dyn PagesRepo>,
        store: Arc<dyn ArtifactStore>,
        renderer: Arc<dyn RenderPipeline>,
        requirements: Arc<dyn AssetRequirements>,
        themes: Arc<ThemeState>,
    ) -> Self {
        let cache = StaticArtifactCache::new(config.clone(), store, renderer.clone(), themes);
        Self::with_cache(config, pages, renderer, requirements, cache)
    }

    /// Wire the services around a preconfigured cache, e.g. one with custom
    /// artifact naming.
    pub fn with_cache(
        config: ErrorPageConfig,
        pages: Arc<dyn PagesRepo>,
        renderer: Arc<dyn RenderPipeline>,
        requirements: Arc<dyn AssetRequirements>,
        cache: StaticArtifactCache,
    ) -> Self {
        let cache = Arc::new(cache);
        let responder = Arc::new(ErrorResponder::new(
            config.clone(),
            pages.clone(),
            renderer,
            requirements,
            cache.clone(),
        ));
        Self {
            registry: Arc::new(ErrorCodeRegistry::from_config(&config)),
            publisher: Arc::new(ErrorPagePublisher::new(pages.clone(), cache.clone())),
            defaults: Arc::new(DefaultErrorPages::new(config, pages, cache.clone())),
            hook: Arc::new(ErrorPageHook::new(responder.clone())),
            formatter: Arc::new(FriendlyErrorFormatter::new(cache.clone())),
            responder,
            cache,
        }
    }
}
