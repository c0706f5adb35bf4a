//! CAPEX Tracker
//!
//! Classifies engineering projects as capital or operating expenditure and
//! collects monthly effort for the capitalised ones:
//! - Project board backed by a PostgREST store, with retry and sample-data fallback
//! - Monthly effort timesheet with persistence and CSV export
//! - Slack notifications to project leads and the finance channel
//! - Google OAuth login with signed session cookies

pub mod api;
pub mod auth;
pub mod diagnostics;
pub mod projects;
pub mod setup;
pub mod slack;
pub mod store;
pub mod timesheet;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_FINANCE_CHANNEL: &str = "#finance-capex";

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub store: StoreYamlConfig,
    pub slack: SlackYamlConfig,
    /// Auth section; absent means the route guard is open
    pub auth: Option<AuthYamlConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
    /// Public base URL (e.g. "https://capex.company.com"); decides the cookie `Secure` flag
    pub public_url: Option<String>,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            public_url: None,
        }
    }
}

/// PostgREST store section. Both values absent is the supported sample-data mode.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StoreYamlConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlackYamlConfig {
    pub bot_token: Option<String>,
    pub finance_channel: String,
    pub api_url: String,
}

impl Default for SlackYamlConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            finance_channel: DEFAULT_FINANCE_CHANNEL.into(),
            api_url: slack::SLACK_API_URL.into(),
        }
    }
}

/// Auth section as written in YAML; every field can be supplied by env instead.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthYamlConfig {
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub session_secret: Option<String>,
    pub session_expiry_secs: Option<u64>,
    pub allowed_email_domain: Option<String>,
}

/// Resolved Google OAuth + session settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    /// HS256 secret for the session cookie
    pub session_secret: String,
    pub session_expiry_secs: u64,
    /// Only accept accounts from this domain (e.g. "company.com")
    pub allowed_email_domain: Option<String>,
}

const DEFAULT_SESSION_EXPIRY_SECS: u64 = 28800; // 8 hours

impl AuthConfig {
    pub fn allows_email(&self, email: &str) -> bool {
        match &self.allowed_email_domain {
            None => true,
            Some(domain) => email
                .to_ascii_lowercase()
                .ends_with(&format!("@{}", domain.to_ascii_lowercase())),
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub public_url: Option<String>,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_finance_channel: String,
    pub slack_api_url: String,
    /// None means the route guard is open (development mode)
    pub auth_config: Option<AuthConfig>,
}

/// Env var value, treating an empty string as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Equivalent to `from_yaml_and_env(None)`.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let server_port = match env_var("SERVER_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("SERVER_PORT is not a valid port: {}", raw))?,
            None => yaml.server.port,
        };

        Ok(Self {
            server_port,
            public_url: env_var("PUBLIC_URL").or(yaml.server.public_url),
            store_url: env_var("SUPABASE_URL").or(yaml.store.url),
            store_key: env_var("SUPABASE_ANON_KEY").or(yaml.store.anon_key),
            slack_bot_token: env_var("SLACK_BOT_TOKEN").or(yaml.slack.bot_token),
            slack_finance_channel: env_var("SLACK_FINANCE_CHANNEL")
                .unwrap_or(yaml.slack.finance_channel),
            slack_api_url: env_var("SLACK_API_URL").unwrap_or(yaml.slack.api_url),
            auth_config: Self::resolve_auth(yaml.auth.unwrap_or_default()),
        })
    }

    /// Overlay auth env vars on the YAML section. Auth is enabled only when
    /// client id, client secret, redirect URI and session secret are all set.
    fn resolve_auth(yaml: AuthYamlConfig) -> Option<AuthConfig> {
        let client_id = env_var("GOOGLE_CLIENT_ID").or(yaml.google_client_id);
        let client_secret = env_var("GOOGLE_CLIENT_SECRET").or(yaml.google_client_secret);
        let redirect_uri = env_var("GOOGLE_REDIRECT_URI").or(yaml.google_redirect_uri);
        let session_secret = env_var("SESSION_SECRET").or(yaml.session_secret);

        match (client_id, client_secret, redirect_uri, session_secret) {
            (Some(google_client_id), Some(google_client_secret), Some(google_redirect_uri), Some(session_secret)) => {
                Some(AuthConfig {
                    google_client_id,
                    google_client_secret,
                    google_redirect_uri,
                    session_secret,
                    session_expiry_secs: yaml
                        .session_expiry_secs
                        .unwrap_or(DEFAULT_SESSION_EXPIRY_SECS),
                    allowed_email_domain: env_var("ALLOWED_EMAIL_DOMAIN")
                        .or(yaml.allowed_email_domain),
                })
            }
            (None, None, None, None) => None,
            _ => {
                tracing::warn!(
                    "Incomplete auth configuration (need GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET, \
                     GOOGLE_REDIRECT_URI and SESSION_SECRET); authentication disabled"
                );
                None
            }
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    /// Store URL and key, when both are present.
    pub fn store_credentials(&self) -> Option<(&str, &str)> {
        match (self.store_url.as_deref(), self.store_key.as_deref()) {
            (Some(url), Some(key)) => Some((url, key)),
            _ => None,
        }
    }
}

/// Build the store client if credentials are configured.
pub fn connect_store(config: &Config) -> Result<Option<Arc<dyn store::ProjectStore>>> {
    match config.store_credentials() {
        Some((url, key)) => {
            let client = store::RestStore::new(url, key)?;
            Ok(Some(Arc::new(client)))
        }
        None => Ok(None),
    }
}

/// Build the Slack notifier if a bot token is configured.
pub fn connect_notifier(config: &Config) -> Result<Option<Arc<dyn slack::Notifier>>> {
    match config.slack_bot_token.as_deref() {
        Some(token) => {
            let client = slack::SlackClient::new(token, &config.slack_api_url)?;
            Ok(Some(Arc::new(client)))
        }
        None => Ok(None),
    }
}

/// Start the HTTP server and run until Ctrl-C / SIGTERM.
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = api::handlers::ServerState::from_config(config)?;
    let app = api::routes::create_router(Arc::new(state));

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("CAPEX tracker listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================
