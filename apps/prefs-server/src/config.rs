use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use url::Url;
use user_preferences::UserPreferencesConfig;
use user_preferences::api::rest::auth::IdentityHeader;

/// Environment variables with this prefix override file values;
/// `__` separates nested keys (`APP__SERVER__PORT`).
pub const ENV_PREFIX: &str = "APP__";

const IN_MEMORY_DSN: &str = "sqlite::memory:";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub modules: ModulesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_owned(),
            port: 8087,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://user_prefs.db?mode=rwc".to_owned(),
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or `user_preferences=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulesConfig {
    #[serde(default)]
    pub user_preferences: ModuleSection<UserPreferencesConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSection<T> {
    #[serde(default)]
    pub config: T,
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub mock: bool,
}

impl AppConfig {
    /// Layered config: defaults -> YAML (if provided) -> env (`APP__*`).
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path
            && !path.is_file()
        {
            anyhow::bail!("config file does not exist: {}", path.display());
        }

        Self::figment(path)
            .extract()
            .context("failed to load configuration")
    }

    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if overrides.mock {
            self.database.url = IN_MEMORY_DSN.to_owned();
            self.database.max_connections = 1;
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.bind, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid server address '{}:{}'",
                    self.server.bind, self.server.port
                )
            })
    }

    /// Checks everything that can be checked without touching the database.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.database.url.trim().is_empty() {
            anyhow::bail!("database.url must not be empty");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be positive");
        }

        let prefs = &self.modules.user_preferences.config;
        IdentityHeader::parse(&prefs.identity_header)?;
        if prefs.max_batch_size == 0 {
            anyhow::bail!("modules.user_preferences.config.max_batch_size must be positive");
        }

        tracing_subscriber::EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("invalid logging.level '{}'", self.logging.level))?;
        Ok(())
    }

    /// YAML dump with credentials masked.
    pub fn to_yaml(&self) -> Result<String> {
        let mut redacted = self.clone();
        redacted.database.url = redact_dsn_password(&self.database.url);
        serde_saphyr::to_string(&redacted).context("failed to serialize configuration to YAML")
    }
}

fn redact_dsn_password(dsn: &str) -> String {
    if !dsn.contains('@') {
        return dsn.to_owned();
    }
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            url.set_password(Some("***REDACTED***")).ok();
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => "***REDACTED***".to_owned(),
    }
}
