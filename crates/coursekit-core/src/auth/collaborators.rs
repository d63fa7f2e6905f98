//! Hooks the auth layer calls into but does not own.
//!
//! Both traits are invoked synchronously from inside the request pipeline,
//! so implementations should hand slow work (UI, network) off to their own
//! executor.

use tracing::{info, warn};

/// Diagnostic event and error names reported by the auth layer.
pub mod events {
    pub const CANT_UPDATE_TOKEN: &str = "cant_update_token";
    pub const FAIL_REFRESH_TOKEN_ONLINE: &str = "fail_refresh_token_online";
    pub const UPDATE_TOKEN_FAILED: &str = "update_token_failed";
    pub const COOKIE_WAS_EMPTY: &str = "cookie_was_empty";
    pub const FAIL_LOGOUT_WHEN_REFRESH: &str = "fail_logout_when_refresh";
    pub const PROFILE_BOOTSTRAP_FAILED: &str = "profile_bootstrap_failed";
}

pub trait Diagnostics: Send + Sync {
    fn report_event(&self, name: &str);
    fn report_error(&self, name: &str, error: &(dyn std::error::Error + 'static));
}

/// Forced-logout side effects, run after the refresh token is rejected.
pub trait LogoutHandler: Send + Sync {
    /// Sign out of any linked social SDKs.
    fn sign_out_social(&self) -> anyhow::Result<()>;
    /// Return the user to the launch/login screen.
    fn show_launch_screen(&self);
    /// Surface a user-visible notice.
    fn notify_user(&self, message: &str);
}

/// Writes diagnostics to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report_event(&self, name: &str) {
        info!(event = name, "diagnostic event");
    }

    fn report_error(&self, name: &str, error: &(dyn std::error::Error + 'static)) {
        warn!(event = name, error = %error, "diagnostic error");
    }
}

/// Logout handler for headless use: nothing to sign out of, no screens.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessLogout;

impl LogoutHandler for HeadlessLogout {
    fn sign_out_social(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn show_launch_screen(&self) {}

    fn notify_user(&self, message: &str) {
        warn!("{}", message);
    }
}
