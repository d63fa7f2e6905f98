use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before expiry at which a token is already treated as stale.
pub const REFRESH_MARGIN_SECS: i64 = 50;

/// Which OAuth client issued the current tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoginMode {
    Social,
    #[default]
    Password,
}

impl LoginMode {
    pub fn from_social(is_social: bool) -> Self {
        if is_social {
            LoginMode::Social
        } else {
            LoginMode::Password
        }
    }

    pub fn is_social(self) -> bool {
        matches!(self, LoginMode::Social)
    }
}

/// Token endpoint response body.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl OAuthResponse {
    /// Stamp the response with its issuance time.
    pub fn into_session(self, mode: LoginMode, issued_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_in: self.expires_in,
            scope: self.scope,
            issued_at: Some(issued_at),
            is_social_login: mode.is_social(),
        }
    }
}

/// The persisted OAuth session. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    /// `None` when the issuance time was never recorded.
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_social_login: bool,
}

impl AuthSession {
    /// Whether the token must be renewed before use at `now`.
    ///
    /// Unknown issuance time always counts as stale.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        let Some(issued_at) = self.issued_at else {
            return true;
        };
        let usable_for = Duration::seconds(self.expires_in - REFRESH_MARGIN_SECS);
        now - issued_at >= usable_for
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    pub fn login_mode(&self) -> LoginMode {
        LoginMode::from_social(self.is_social_login)
    }

    /// Value for the `Authorization` header, e.g. `Bearer abc`.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Seconds until the token expires (negative once expired), if known.
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.issued_at.map(|issued_at| {
            let expiry = issued_at + Duration::seconds(self.expires_in);
            (expiry - Utc::now()).num_seconds()
        })
    }
}
