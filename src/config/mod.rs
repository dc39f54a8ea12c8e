//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::{
    CliArgs, CodesArgs, Command, EnsureDefaultsArgs, ServeArgs, ServeOverrides, StorageOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "errorpage";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_ADMIN_PORT: u16 = 3001;
const DEFAULT_ARTIFACTS_DIR: &str = "assets";
const DEFAULT_FRONTEND_THEME: &str = "default";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub environment: DeploymentEnvironment,
    pub error_pages: ErrorPageSettings,
    pub artifacts: ArtifactSettings,
    pub themes: ThemeSettings,
    pub content: ContentSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentEnvironment {
    Dev,
    Test,
    #[default]
    Live,
}

impl DeploymentEnvironment {
    pub fn is_dev(self) -> bool {
        self == DeploymentEnvironment::Dev
    }
}

impl FromStr for DeploymentEnvironment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            "live" | "prod" | "production" => Ok(Self::Live),
            other => Err(format!("unknown environment `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorPageSettings {
    pub enable_static_file: bool,
    pub store_file_prefix: String,
    pub dev_append_error_message: bool,
    pub allowed_error_codes: Option<Vec<u16>>,
    pub create_default_pages: bool,
}

#[derive(Debug, Clone)]
pub struct ArtifactSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ThemeSettings {
    /// Theme stack forced while generating static pages. Empty keeps
    /// whatever is active.
    pub frontend: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub pages_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix("ERRORPAGE")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("error_pages.allowed_error_codes")
            .with_list_parse_key("themes.frontend")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::EnsureDefaults(args)) => raw.apply_storage_overrides(&args.storage),
        Some(Command::Codes(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    environment: Option<String>,
    error_pages: RawErrorPageSettings,
    artifacts: RawArtifactSettings,
    themes: RawThemeSettings,
    content: RawContentSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(environment) = overrides.environment.as_ref() {
            self.environment = Some(environment.clone());
        }

        self.apply_storage_overrides(&overrides.storage);
    }

    fn apply_storage_overrides(&mut self, overrides: &StorageOverrides) {
        if let Some(directory) = overrides.artifacts_directory.as_ref() {
            self.artifacts.directory = Some(directory.clone());
        }
        if let Some(path) = overrides.pages_file.as_ref() {
            self.content.pages_file = Some(path.clone());
        }
        if let Some(enabled) = overrides.enable_static_file {
            self.error_pages.enable_static_file = Some(enabled);
        }
        if let Some(prefix) = overrides.store_file_prefix.as_ref() {
            self.error_pages.store_file_prefix = Some(prefix.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            environment,
            error_pages,
            artifacts,
            themes,
            content,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let environment = build_environment(environment)?;
        let error_pages = build_error_page_settings(error_pages)?;
        let artifacts = build_artifact_settings(artifacts)?;
        let themes = build_theme_settings(themes);
        let content = build_content_settings(content);

        Ok(Self {
            server,
            logging,
            environment,
            error_pages,
            artifacts,
            themes,
            content,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }

    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;

    Ok(ServerSettings {
        public_addr,
        admin_addr,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_environment(environment: Option<String>) -> Result<DeploymentEnvironment, LoadError> {
    match environment {
        Some(value) => DeploymentEnvironment::from_str(&value)
            .map_err(|reason| LoadError::invalid("environment", reason)),
        None => Ok(DeploymentEnvironment::default()),
    }
}

fn build_error_page_settings(
    error_pages: RawErrorPageSettings,
) -> Result<ErrorPageSettings, LoadError> {
    // Any 4xx/5xx code is accepted; codes missing from the catalog are
    // dropped when the registry builds the editor list.
    let allowed_error_codes = match error_pages.allowed_error_codes {
        Some(codes) => {
            if let Some(bad) = codes.iter().find(|code| !(400..=599).contains(*code)) {
                return Err(LoadError::invalid(
                    "error_pages.allowed_error_codes",
                    format!("{bad} is not an HTTP error status code"),
                ));
            }
            Some(codes)
        }
        None => None,
    };

    let store_file_prefix = error_pages
        .store_file_prefix
        .map(|prefix| prefix.trim().trim_matches('/').to_string())
        .unwrap_or_default();
    if store_file_prefix.split('/').any(|segment| segment == "..") {
        return Err(LoadError::invalid(
            "error_pages.store_file_prefix",
            "prefix must not contain `..` segments",
        ));
    }

    Ok(ErrorPageSettings {
        enable_static_file: error_pages.enable_static_file.unwrap_or(true),
        store_file_prefix,
        dev_append_error_message: error_pages.dev_append_error_message.unwrap_or(true),
        allowed_error_codes,
        create_default_pages: error_pages.create_default_pages.unwrap_or(true),
    })
}

fn build_artifact_settings(artifacts: RawArtifactSettings) -> Result<ArtifactSettings, LoadError> {
    let directory = artifacts
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "artifacts.directory",
            "path must not be empty",
        ));
    }
    Ok(ArtifactSettings { directory })
}

fn build_theme_settings(themes: RawThemeSettings) -> ThemeSettings {
    let frontend = themes
        .frontend
        .unwrap_or_else(|| vec![DEFAULT_FRONTEND_THEME.to_string()])
        .into_iter()
        .map(|theme| theme.trim().to_string())
        .filter(|theme| !theme.is_empty())
        .collect();
    ThemeSettings { frontend }
}

fn build_content_settings(content: RawContentSettings) -> ContentSettings {
    ContentSettings {
        pages_file: content
            .pages_file
            .filter(|path| !path.as_os_str().is_empty()),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawErrorPageSettings {
    enable_static_file: Option<bool>,
    store_file_prefix: Option<String>,
    dev_append_error_message: Option<bool>,
    allowed_error_codes: Option<Vec<u16>>,
    create_default_pages: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawArtifactSettings {
    directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawThemeSettings {
    frontend: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    pages_file: Option<PathBuf>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}
