use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    application::repos::{PagesRepo, RepoError},
    domain::{
        codes::ErrorCode,
        entities::{NewPage, PageRecord},
        pages::DefaultErrorPageSpec,
        types::Stage,
    },
};

use super::{ErrorPageConfig, StaticArtifactCache};

const SOURCE: &str = "application::error_pages::defaults";
const MAX_SLUG_ATTEMPTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// No static copy existed before this run.
    Created,
    /// An existing static copy was overwritten.
    Refreshed,
    CouldNotBeCreated,
    /// Page ensured and published; static files are switched off.
    StaticFileDisabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub code: ErrorCode,
    pub outcome: BootstrapOutcome,
}

impl BootstrapReport {
    /// Operator-facing line, if the outcome warrants one.
    pub fn operator_message(&self) -> Option<String> {
        let code = self.code;
        match self.outcome {
            BootstrapOutcome::Created => Some(format!("{code} error page created")),
            BootstrapOutcome::Refreshed => Some(format!("{code} error page refreshed")),
            BootstrapOutcome::CouldNotBeCreated => Some(format!(
                "{code} error page could not be created. Please check permissions"
            )),
            BootstrapOutcome::StaticFileDisabled => None,
        }
    }
}

/// Guarantees a published error page, with a fresh static copy, for each
/// default code.
pub struct DefaultErrorPages {
    config: ErrorPageConfig,
    pages: Arc<dyn PagesRepo>,
    cache: Arc<StaticArtifactCache>,
    specs: Vec<DefaultErrorPageSpec>,
}

impl DefaultErrorPages {
    pub fn new(
        config: ErrorPageConfig,
        pages: Arc<dyn PagesRepo>,
        cache: Arc<StaticArtifactCache>,
    ) -> Self {
        Self {
            config,
            pages,
            cache,
            specs: DefaultErrorPageSpec::builtin(),
        }
    }

    /// Replace the built-in 404/500 fixtures.
    pub fn with_specs(mut self, specs: Vec<DefaultErrorPageSpec>) -> Self {
        self.specs = specs;
        self
    }

    /// Run the bootstrap. Returns an empty report when default page creation
    /// is switched off. A repository failure for one code is reported as
    /// `CouldNotBeCreated` and the remaining codes still run.
    pub async fn ensure(&self) -> Vec<BootstrapReport> {
        if !self.config.create_default_pages {
            return Vec::new();
        }

        let mut reports = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            let outcome = match self.ensure_one(spec).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(
                        target = SOURCE,
                        op = "ensure",
                        code = spec.code.as_u16(),
                        result = "repo_failed",
                        error = %err,
                        "failed to ensure default error page"
                    );
                    BootstrapOutcome::CouldNotBeCreated
                }
            };
            let report = BootstrapReport {
                code: spec.code,
                outcome,
            };
            log_report(&report);
            reports.push(report);
        }
        reports
    }

    async fn ensure_one(&self, spec: &DefaultErrorPageSpec) -> Result<BootstrapOutcome, RepoError> {
        let page = match self
            .pages
            .find_first_by_error_code(spec.code, Stage::Draft)
            .await?
        {
            Some(page) => page,
            None => self.create_page(spec.to_new_page()).await?,
        };

        let page = if page.is_live_version() {
            page
        } else {
            self.pages.publish_page(page.id).await?
        };

        if !self.cache.is_enabled() {
            return Ok(BootstrapOutcome::StaticFileDisabled);
        }

        let existed = self.cache.exists(&page).await;
        let outcome = match (self.cache.write(&page).await, existed) {
            (false, _) => BootstrapOutcome::CouldNotBeCreated,
            (true, true) => BootstrapOutcome::Refreshed,
            (true, false) => BootstrapOutcome::Created,
        };
        Ok(outcome)
    }

    /// Create `page`, suffixing its slug with `-2`, `-3`, ... while the slug
    /// is taken by another page.
    async fn create_page(&self, page: NewPage) -> Result<PageRecord, RepoError> {
        let base = page.slug.clone();
        let mut attempt = 1;
        loop {
            let slug = if attempt == 1 {
                base.clone()
            } else {
                format!("{base}-{attempt}")
            };
            match self
                .pages
                .create_page(NewPage {
                    slug,
                    ..page.clone()
                })
                .await
            {
                Err(RepoError::Duplicate { .. }) if attempt < MAX_SLUG_ATTEMPTS => attempt += 1,
                result => return result,
            }
        }
    }
}

fn log_report(report: &BootstrapReport) {
    let Some(message) = report.operator_message() else {
        return;
    };
    match report.outcome {
        BootstrapOutcome::CouldNotBeCreated => warn!(
            target = SOURCE,
            op = "ensure",
            code = report.code.as_u16(),
            result = "could_not_be_created",
            "{message}"
        ),
        _ => info!(
            target = SOURCE,
            op = "ensure",
            code = report.code.as_u16(),
            result = "ok",
            "{message}"
        ),
    }
}
