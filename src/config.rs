use figment::{Figment, providers::Env};
use serde::Deserialize;

/// Runtime configuration, read from `PLAZA_`-prefixed environment variables.
///
/// Built once in `main` and handed to `PlazaState`; handlers never reach for
/// ambient globals.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Secret used to derive the AES-256 key for stored Application
    /// Passwords. Must be at least 32 bytes.
    #[serde(default)]
    pub encryption_key: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Comma-separated list of allowed CORS origins; `*` allows any.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,

    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::new().merge(Env::prefixed("PLAZA_")).extract()
    }

    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            encryption_key: String::new(),
            bind_addr: default_bind_addr(),
            allowed_origins: default_allowed_origins(),
            loglevel: default_loglevel(),
            session_ttl_hours: default_session_ttl_hours(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite:plaza.sqlite".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_allowed_origins() -> String {
    "*".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_upstream_timeout_secs() -> u64 {
    30
}
