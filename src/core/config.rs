use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::ConnectOptions;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub library_server_config: LibraryWebServerConfig,
    pub postgres: PostgresConfig,
    pub storage: StorageConfig,
    pub github: Option<GithubConfig>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir()
            .map_err(|e| config::ConfigError::Message(format!("Failed to find the current dir: {}", e)))?;
        let config_dir = base_path.join("src/core/configurations");

        let app_environment: Environment = std::env::var("LIBRARY_APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(config::ConfigError::Message)?;

        let configurations = config::Config::builder()
            .add_source(
                config::File::from(config_dir.join(app_environment.as_str())).required(true),
            )
            // e.g. `LIBRARY__GITHUB__TOKEN=...` overrides github.token
            .add_source(
                config::Environment::with_prefix("LIBRARY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_emails"),
            )
            .build()?;

        let config: AppConfig = configurations.try_deserialize()?;
        config.check_required().map_err(config::ConfigError::Message)?;
        Ok(config)
    }

    /// Values are consumed verbatim; the only check is that secrets and
    /// endpoints are not blank.
    pub fn check_required(&self) -> Result<(), String> {
        let required = [
            ("postgres.password", self.postgres.password.expose_secret().as_str()),
            ("storage.base_url", self.storage.base_url.as_str()),
            ("storage.service_key", self.storage.service_key.expose_secret().as_str()),
            ("auth.jwt_secret", self.auth.jwt_secret.expose_secret().as_str()),
        ];

        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(format!("missing required configuration value `{}`", key));
        }

        if let Some(github) = &self.github {
            if github.repo.trim().is_empty() || github.token.expose_secret().trim().is_empty() {
                return Err("github.repo and github.token must both be set".to_string());
            }
        }

        Ok(())
    }
}

#[derive(Deserialize, Clone)]
pub struct LibraryWebServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct PostgresConfig {
    pub username: String,
    pub password: Secret<String>,
    pub host: String,
    pub port: u16,
    pub database_name: String,
    #[serde(default)]
    pub require_ssl: bool,
    #[serde(default)]
    pub run_migrations: bool,
}

impl PostgresConfig {
    pub fn connect(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        let options = PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .database(&self.database_name)
            .ssl_mode(ssl_mode);

        options.log_statements(tracing::log::LevelFilter::Trace)
    }
}

/// Hosted object storage (Supabase-style REST API).
#[derive(Deserialize, Clone)]
pub struct StorageConfig {
    pub base_url: String,
    pub service_key: Secret<String>,
    #[serde(default = "default_papers_bucket")]
    pub papers_bucket: String,
    #[serde(default = "default_books_bucket")]
    pub books_bucket: String,
    #[serde(default = "default_study_guides_bucket")]
    pub study_guides_bucket: String,
}

#[derive(Deserialize, Clone)]
pub struct GithubConfig {
    #[serde(default = "default_github_api")]
    pub api_base_url: String,
    /// `owner/name`
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    pub token: Secret<String>,
}

#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub audience: Option<String>,
    #[serde(default)]
    pub admin_emails: Vec<String>,
    pub admin_role: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 300 }
    }
}

fn default_papers_bucket() -> String {
    "papers".to_string()
}

fn default_books_bucket() -> String {
    "books".to_string()
}

fn default_study_guides_bucket() -> String {
    "study-guides".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

pub enum Environment {
    Local,
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not supported environment. Use either `local`, `sandbox` or `production` ",
                other
            )),
        }
    }
}
