// Process-wide settings, built once at startup and passed explicitly

pub mod yml_settings;

use anyhow::{Context, Result};
use clap::Arg;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::db::store::SchemaStrategy;
use yml_settings::{ConnectionStrings, YmlSettings};

pub const DEFAULT_CONFIG_PATH: &str = "appsettings.yml";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Deployment classification; decides the schema strategy and log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    Development,
    #[default]
    Production,
}

impl AppEnvironment {
    /// `development` or `dev` in any case; anything else is production
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => AppEnvironment::Development,
            _ => AppEnvironment::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == AppEnvironment::Development
    }

    pub fn schema_strategy(self) -> SchemaStrategy {
        match self {
            AppEnvironment::Development => SchemaStrategy::CreateFromModel,
            AppEnvironment::Production => SchemaStrategy::ApplyMigrations,
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEnvironment::Development => write!(f, "Development"),
            AppEnvironment::Production => write!(f, "Production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: AppEnvironment,
    pub bind_address: String,
    pub static_dir: PathBuf,
    pub max_connections: u32,
    /// `DATABASE_URL`, when set
    pub database_url: Option<String>,
    pub connection_strings: ConnectionStrings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: AppEnvironment::default(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            database_url: None,
            connection_strings: ConnectionStrings::default(),
        }
    }
}

fn cli() -> clap::Command {
    clap::Command::new("EMSI")
        .about("EMSI Corporation back office")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG")
                .help("Path to a YAML settings file"),
        )
        .arg(
            Arg::new("environment")
                .short('e')
                .long("environment")
                .value_name("ENVIRONMENT")
                .help("Development or Production"),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDRESS")
                .help("Address to listen on"),
        )
}

impl Settings {
    /// Load from the process arguments, environment and settings file
    pub fn load() -> Result<Self> {
        Self::load_from(std::env::args(), |key| std::env::var(key).ok())
    }

    /// Precedence, lowest first: defaults, YAML file, environment, CLI flags
    pub fn load_from<I, F>(args: I, env: F) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let matches = cli().try_get_matches_from(args)?;
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let explicit_config = matches.get_one::<String>("config");
        let file = match explicit_config {
            Some(path) => read_settings_file(Path::new(path))?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                read_settings_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => YmlSettings::default(),
        };

        let mut settings = Settings::default().merge_file(file);

        if let Some(name) = env("APP_ENVIRONMENT") {
            settings.environment = AppEnvironment::parse(&name);
        }
        if let Some(address) = env("BIND_ADDRESS") {
            settings.bind_address = address;
        }
        if let Some(max) = env("DATABASE_MAX_CONNECTIONS") {
            settings.max_connections = max
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS must be a number, got '{}'", max))?;
        }
        if let Some(primary) = env("CONNECTION_STRING") {
            settings.connection_strings.primary = Some(primary);
        }
        settings.database_url = env("DATABASE_URL");

        if let Some(name) = matches.get_one::<String>("environment") {
            settings.environment = AppEnvironment::parse(name);
        }
        if let Some(address) = matches.get_one::<String>("bind") {
            settings.bind_address = address.clone();
        }

        Ok(settings)
    }

    fn merge_file(mut self, file: YmlSettings) -> Self {
        if let Some(name) = file.environment {
            self.environment = AppEnvironment::parse(&name);
        }
        if let Some(address) = file.bind_address {
            self.bind_address = address;
        }
        if let Some(dir) = file.static_dir {
            self.static_dir = PathBuf::from(dir);
        }
        if let Some(max) = file.database.max_connections {
            self.max_connections = max;
        }
        if file.connection_strings.primary.is_some() {
            self.connection_strings = file.connection_strings;
        }
        self
    }
}

fn read_settings_file(path: &Path) -> Result<YmlSettings> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    YmlSettings::from_yaml(&contents)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))
}
