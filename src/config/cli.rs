use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the errorpage binary.
#[derive(Debug, Parser)]
#[command(
    name = "errorpage",
    version,
    about = "Custom HTTP error pages with static fallbacks"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "ERRORPAGE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the public and administrative HTTP services.
    Serve(Box<ServeArgs>),
    /// Ensure the default 404/500 pages exist, are published, and have static copies.
    #[command(name = "ensure-defaults")]
    EnsureDefaults(EnsureDefaultsArgs),
    /// Print the error codes available to editors.
    #[command(name = "codes")]
    Codes(CodesArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct StorageOverrides {
    /// Override the directory that holds generated static error pages.
    #[arg(long = "artifacts-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub artifacts_directory: Option<PathBuf>,

    /// Override the TOML file used to seed page content.
    #[arg(long = "pages-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub pages_file: Option<PathBuf>,

    /// Toggle writing and reading static error page files.
    #[arg(
        long = "enable-static-file",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub enable_static_file: Option<bool>,

    /// Override the prefix under which static error pages are stored.
    #[arg(long = "store-file-prefix", value_name = "PREFIX")]
    pub store_file_prefix: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub storage: StorageOverrides,

    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the administrative listener host.
    #[arg(long = "server-admin-host", value_name = "HOST")]
    pub server_admin_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the administrative listener port.
    #[arg(long = "server-admin-port", value_name = "PORT")]
    pub admin_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the deployment environment (dev|test|live).
    #[arg(long = "environment", value_name = "ENV")]
    pub environment: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct EnsureDefaultsArgs {
    #[command(flatten)]
    pub storage: StorageOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CodesArgs {
    /// Emit the catalog as JSON instead of one label per line.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}
