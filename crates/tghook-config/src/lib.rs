//! Tghook Configuration
//!
//! TOML configuration loading with environment variable lookup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_WEBHOOK_RELATIVE_URL: &str = "/api/tg/webhook";
pub const DEFAULT_TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_TOKEN";
pub const DEFAULT_PUBLIC_HOST_ENV: &str = "VERCEL_URL";
pub const DEFAULT_KEY_ENV: &str = "TGVERCEL_KEY";
pub const DEFAULT_KEY_PARAM: &str = "key";

/// Liveness route mounted next to the configured paths.
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,
    #[serde(default)]
    pub webhook: Options,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoreConfig {
    pub log_level: Option<String>,
    pub log_dir: Option<String>,
}

/// Names that tie the webhook lifecycle to its deployment.
///
/// Only the *names* of the environment variables live here; their values are
/// looked up on every registration so rotated secrets apply without a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default = "default_webhook_relative_url")]
    pub webhook_relative_url: String,
    #[serde(default = "default_telegram_token_env")]
    pub telegram_token_env: String,
    #[serde(default = "default_public_host_env")]
    pub public_host_env: String,
    #[serde(default = "default_key_env")]
    pub key_env: String,
    #[serde(default = "default_key_param")]
    pub key_param: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            webhook_relative_url: default_webhook_relative_url(),
            telegram_token_env: default_telegram_token_env(),
            public_host_env: default_public_host_env(),
            key_env: default_key_env(),
            key_param: default_key_param(),
        }
    }
}

impl Options {
    pub fn validate(&self) -> anyhow::Result<()> {
        let fields = [
            ("WebhookRelativeUrl", &self.webhook_relative_url),
            ("TelegramTokenEnvName", &self.telegram_token_env),
            ("PublicHostEnvName", &self.public_host_env),
            ("KeyEnvName", &self.key_env),
            ("KeyParamName", &self.key_param),
        ];
        for (name, value) in fields {
            if value.is_empty() {
                anyhow::bail!("{} must be set", name);
            }
        }
        if !self.webhook_relative_url.starts_with('/') {
            anyhow::bail!(
                "WebhookRelativeUrl must start with '/' (got '{}')",
                self.webhook_relative_url
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_setup_path")]
    pub setup_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            setup_path: default_setup_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_webhook_relative_url() -> String {
    DEFAULT_WEBHOOK_RELATIVE_URL.to_string()
}

fn default_telegram_token_env() -> String {
    DEFAULT_TELEGRAM_TOKEN_ENV.to_string()
}

fn default_public_host_env() -> String {
    DEFAULT_PUBLIC_HOST_ENV.to_string()
}

fn default_key_env() -> String {
    DEFAULT_KEY_ENV.to_string()
}

fn default_key_param() -> String {
    DEFAULT_KEY_PARAM.to_string()
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_setup_path() -> String {
    "/api/tg/setup".to_string()
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = toml::from_str(&content)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the default location if it exists,
    /// otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::load(default),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tghook").join("config.toml"))
    }

    /// Trims the mounted paths so the validated value is the routed value.
    pub fn normalize(&mut self) {
        self.server.setup_path = self.server.setup_path.trim().to_string();
        self.webhook.webhook_relative_url = self.webhook.webhook_relative_url.trim().to_string();
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.webhook.validate()?;

        let setup_path = &self.server.setup_path;
        let webhook_path = &self.webhook.webhook_relative_url;
        if !setup_path.starts_with('/') {
            anyhow::bail!("server.setup_path must start with '/' (got '{}')", setup_path);
        }
        for (name, path) in [
            ("server.setup_path", setup_path),
            ("webhook.webhook_relative_url", webhook_path),
        ] {
            if path.trim() != path.as_str() {
                anyhow::bail!("{} has surrounding whitespace ('{}')", name, path);
            }
            if path == HEALTH_PATH {
                anyhow::bail!("{} cannot be {}", name, HEALTH_PATH);
            }
        }
        if setup_path == webhook_path {
            anyhow::bail!(
                "server.setup_path and webhook.webhook_relative_url must differ ('{}')",
                setup_path
            );
        }
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind cannot be empty");
        }
        if self.telegram.api_base_url.trim().is_empty() {
            anyhow::bail!("telegram.api_base_url cannot be empty");
        }
        Ok(())
    }
}

/// Where credential values come from.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;

    /// Returns the value only when it is present and non-empty.
    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name).filter(|value| !value.is_empty())
    }
}

/// Reads the live process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
