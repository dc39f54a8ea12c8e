use std::{process, sync::Arc};

use errorpage::{
    application::{
        error::AppError,
        error_pages::{ErrorCodeRegistry, ErrorPageConfig, ErrorPageServices},
        render::RenderPipeline,
        repos::PagesRepo,
        theme::ThemeState,
    },
    config,
    infra::{
        artifacts::FilesystemArtifactStore,
        error::InfraError,
        http::{self, AdminState, HttpState},
        pages::InMemoryPagesRepo,
        render::TemplateRenderPipeline,
        requirements::NoopAssetRequirements,
        telemetry,
    },
};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    if let config::Command::Codes(args) = &command {
        return run_codes(&settings, args);
    }

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::EnsureDefaults(_) => run_ensure_defaults(settings).await,
        config::Command::Codes(_) => Ok(()),
    }
}

struct ApplicationContext {
    services: ErrorPageServices,
    renderer: Arc<dyn RenderPipeline>,
}

fn build_application_context(settings: &config::Settings) -> Result<ApplicationContext, AppError> {
    let pages: Arc<dyn PagesRepo> = match settings.content.pages_file.as_deref() {
        Some(path) => Arc::new(InMemoryPagesRepo::load(path)?),
        None => Arc::new(InMemoryPagesRepo::new()),
    };

    let store = FilesystemArtifactStore::new(settings.artifacts.directory.clone())
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let themes = Arc::new(ThemeState::new(settings.themes.frontend.clone()));
    let renderer: Arc<dyn RenderPipeline> =
        Arc::new(TemplateRenderPipeline::new(pages.clone(), themes.clone()));

    let services = ErrorPageServices::new(
        ErrorPageConfig::from(settings),
        pages,
        Arc::new(store),
        renderer.clone(),
        Arc::new(NoopAssetRequirements),
        themes,
    );

    Ok(ApplicationContext { services, renderer })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings)?;

    // Make sure 404/500 pages and their static copies exist before traffic arrives.
    app.services.defaults.ensure().await;

    let http_state = HttpState::from_services(&app.services, app.renderer.clone());
    let admin_state = AdminState::from(&app.services);

    serve_http(&settings, http_state, admin_state).await
}

async fn run_ensure_defaults(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings)?;
    let reports = app.services.defaults.ensure().await;

    if reports.is_empty() {
        info!(
            target = "errorpage::ensure_defaults",
            "default page creation disabled"
        );
    }
    for report in &reports {
        if let Some(message) = report.operator_message() {
            println!("{message}");
        }
    }

    Ok(())
}

fn run_codes(settings: &config::Settings, args: &config::CodesArgs) -> Result<(), AppError> {
    let registry = ErrorCodeRegistry::from_config(&ErrorPageConfig::from(settings));
    let entries = registry.available_codes();

    if args.json {
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|err| AppError::unexpected(format!("failed to encode catalog: {err}")))?;
        println!("{json}");
    } else {
        for entry in entries {
            println!("{}", entry.label);
        }
    }

    Ok(())
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "errorpage::serve",
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        "listening"
    );

    let public_server = axum::serve(public_listener, public_router.into_make_service());
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service());

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
