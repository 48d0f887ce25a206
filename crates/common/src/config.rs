//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote instance API configuration.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Browser session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this service, as seen by browsers.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Upper bound for handling a single inbound request.
    #[serde(default = "default_server_timeout")]
    pub request_timeout_secs: u64,
}

/// Settings used when talking to remote instances.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Client name sent during app registration.
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Website sent during app registration.
    #[serde(default)]
    pub website: Option<String>,
    /// Space-separated OAuth scopes.
    #[serde(default = "default_scopes")]
    pub scopes: String,
    /// Explicit redirect URI. Defaults to `{public_url}/callback`.
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Total timeout for one outbound call.
    #[serde(default = "default_remote_timeout")]
    pub request_timeout_secs: u64,
    /// Connect timeout for one outbound call.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of the session cookies.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
    /// Whether cookies carry the `Secure` attribute.
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

const fn default_server_timeout() -> u64 {
    30
}

fn default_client_name() -> String {
    "Gotosocial-webui".to_string()
}

fn default_scopes() -> String {
    "read write follow".to_string()
}

const fn default_remote_timeout() -> u64 {
    10
}

const fn default_connect_timeout() -> u64 {
    5
}

const fn default_ttl_hours() -> i64 {
    24
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            request_timeout_secs: default_server_timeout(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            website: None,
            scopes: default_scopes(),
            redirect_uri: None,
            request_timeout_secs: default_remote_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    /// Upper bound for handling a single inbound request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RemoteConfig {
    /// Timeout applied to every outbound call.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connect timeout applied to every outbound call.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `WEBUI_ENV`)
    /// 4. Environment variables with `WEBUI__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("WEBUI_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("WEBUI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("WEBUI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// The redirect URI registered with remote instances.
    ///
    /// The same string is used for registration and code exchange.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        self.remote.redirect_uri.clone().unwrap_or_else(|| {
            format!("{}/callback", self.server.public_url.trim_end_matches('/'))
        })
    }
}
