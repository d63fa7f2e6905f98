//! Client configuration management.
//!
//! The configuration names the backend, the OAuth client credentials for each
//! login mode, and the cookie names the backend uses for its CSRF token and
//! session. It also remembers the last username used by the CLI.
//!
//! Configuration is stored at `~/.config/coursekit/config.json`. Missing
//! fields fall back to the public backend defaults, and a handful of
//! `COURSEKIT_*` environment variables override the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::auth::LoginMode;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "coursekit";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Connect and read timeout for every client, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// OAuth client id/secret pair registered with the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// Client used for the password grant (and refreshing password sessions).
    pub password_client: ClientCredentials,
    /// Client used for authorization-code and native social grants.
    pub social_client: ClientCredentials,
    pub password_grant_type: String,
    pub social_grant_type: String,
    pub refresh_grant_type: String,
    pub redirect_uri: String,
    pub csrf_cookie_name: String,
    pub session_cookie_name: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub can_drop_course: bool,
    /// Path (relative to `base_url`) of the app update descriptor.
    pub update_endpoint: String,
    /// Language sent with the anonymous cookie bootstrap request.
    pub language: String,
    /// Help desk that receives in-app feedback; not the course backend.
    pub feedback_host: String,
    pub feedback_subject: String,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://stepik.org".to_string(),
            password_client: ClientCredentials::default(),
            social_client: ClientCredentials::default(),
            password_grant_type: "password".to_string(),
            social_grant_type: "authorization_code".to_string(),
            refresh_grant_type: "refresh_token".to_string(),
            redirect_uri: "stepik://oauth".to_string(),
            csrf_cookie_name: "csrftoken".to_string(),
            session_cookie_name: "sessionid".to_string(),
            user_agent: format!("coursekit/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            can_drop_course: true,
            update_endpoint: "mobile/android.json".to_string(),
            language: "en".to_string(),
            feedback_host: "https://stepik.zendesk.com".to_string(),
            feedback_subject: "Feedback from coursekit".to_string(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        if let Some(url) = read("COURSEKIT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(id) = read("COURSEKIT_CLIENT_ID") {
            self.password_client.client_id = id;
        }
        if let Some(secret) = read("COURSEKIT_CLIENT_SECRET") {
            self.password_client.client_secret = secret;
        }
        if let Some(id) = read("COURSEKIT_SOCIAL_CLIENT_ID") {
            self.social_client.client_id = id;
        }
        if let Some(secret) = read("COURSEKIT_SOCIAL_CLIENT_SECRET") {
            self.social_client.client_secret = secret;
        }
        if let Some(host) = read("COURSEKIT_FEEDBACK_HOST") {
            self.feedback_host = host;
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Parsed base URL. A trailing slash is added so relative joins keep any
    /// path prefix.
    pub fn base(&self) -> Result<Url> {
        with_trailing_slash(&self.base_url)
            .with_context(|| format!("Invalid base URL: {}", self.base_url))
    }

    pub fn feedback_base(&self) -> Result<Url> {
        with_trailing_slash(&self.feedback_host)
            .with_context(|| format!("Invalid feedback host: {}", self.feedback_host))
    }

    /// Base URL without a trailing slash, as sent in the `Referer` header.
    pub fn referer(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn client_credentials(&self, mode: LoginMode) -> &ClientCredentials {
        match mode {
            LoginMode::Social => &self.social_client,
            LoginMode::Password => &self.password_client,
        }
    }

    pub fn grant_type(&self, mode: LoginMode) -> &str {
        match mode {
            LoginMode::Social => &self.social_grant_type,
            LoginMode::Password => &self.password_grant_type,
        }
    }
}

fn with_trailing_slash(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Ok(Url::parse(&raw)?)
}
