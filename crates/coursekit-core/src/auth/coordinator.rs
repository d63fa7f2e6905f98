//! Token refresh coordinator: the pipeline stage of the logged client.
//!
//! Every request either carries the current bearer token, renewed first when
//! it is stale, or the anonymous session's cookies when nobody is signed in.
//! Refresh runs under the write side of the session lock and re-checks
//! staleness after acquiring it, so concurrent requests trigger a single
//! refresh call.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::{Request, Response};
use tracing::{debug, info, warn};

use super::collaborators::events;
use super::context::{SessionContext, SessionWriteGuard};
use super::cookie_auth::CookieSession;
use super::session::AuthSession;
use crate::api::factory::ClientFactory;
use crate::api::{ApiError, ApiResult};
use crate::http::decorate::header_value;
use crate::http::{Middleware, Next};

pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please sign in again.";

pub struct TokenRefresher {
    context: Arc<SessionContext>,
    factory: ClientFactory,
    cookies: CookieSession,
}

impl TokenRefresher {
    pub fn new(context: Arc<SessionContext>, factory: ClientFactory, cookies: CookieSession) -> Self {
        Self {
            context,
            factory,
            cookies,
        }
    }

    /// No bearer session: authenticate with the anonymous session's cookies.
    async fn attach_cookies(&self, request: &mut Request) -> ApiResult<()> {
        let Some(cookies) = self.cookies.cookie_header().await? else {
            debug!("anonymous request without cookies");
            return Ok(());
        };
        let csrf = self.cookies.csrf_token(&cookies);
        self.cookies.ensure_profile(&cookies, &csrf).await?;
        self.cookies.apply(request, &cookies, &csrf)
    }

    /// Renew the session while holding the write lock.
    ///
    /// Returns the session to authenticate with, or `None` when the request
    /// must go out without a bearer token.
    async fn refresh_locked(&self, guard: &SessionWriteGuard<'_>) -> ApiResult<Option<AuthSession>> {
        let Some(current) = guard.session()? else {
            debug!("session cleared while waiting for the write lock");
            return Ok(None);
        };
        if !current.is_stale() {
            debug!("session already refreshed by another request");
            return Ok(Some(current));
        }

        let mode = current.login_mode();
        let result = match self.factory.oauth(mode) {
            Ok(oauth) => oauth.refresh_token(&current.refresh_token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                let fresh = response.into_session(mode, Utc::now());
                guard.store_session(&fresh)?;
                info!(expires_in = fresh.expires_in, "access token refreshed");
                Ok(Some(fresh))
            }
            Err(ApiError::Unauthorized) => {
                self.report_failure(&ApiError::AuthExpired);
                self.force_logout(guard);
                Ok(None)
            }
            Err(ApiError::Network(e)) => {
                warn!(error = %e, "token refresh request failed");
                self.context
                    .diagnostics()
                    .report_error(events::CANT_UPDATE_TOKEN, &e);
                Ok(None)
            }
            Err(e) => {
                self.report_failure(&ApiError::AuthRefresh(e.to_string()));
                Ok(None)
            }
        }
    }

    fn report_failure(&self, error: &ApiError) {
        warn!(error = %error, "token refresh rejected");
        let diagnostics = self.context.diagnostics();
        diagnostics.report_error(events::FAIL_REFRESH_TOKEN_ONLINE, error);
        diagnostics.report_event(events::UPDATE_TOKEN_FAILED);
    }

    /// The refresh token was rejected: drop local state and send the user
    /// back to the login screen.
    fn force_logout(&self, guard: &SessionWriteGuard<'_>) {
        warn!("refresh token rejected, logging out");
        guard.clear_all();

        let handler = self.context.logout_handler();
        if let Err(e) = handler.sign_out_social() {
            self.context
                .diagnostics()
                .report_error(events::FAIL_LOGOUT_WHEN_REFRESH, e.as_ref());
        }
        handler.show_launch_screen();
        handler.notify_user(SESSION_EXPIRED_NOTICE);
    }
}

#[async_trait]
impl Middleware for TokenRefresher {
    async fn handle(&self, mut request: Request, next: Next<'_>) -> ApiResult<Response> {
        let url = request.url().clone();

        let mut guard = self.context.read().await;
        let mut session = guard.session()?;
        let stale = session.as_ref().map(AuthSession::is_stale);

        match stale {
            None => self.attach_cookies(&mut request).await?,
            Some(true) => {
                drop(guard);
                let write = self.context.write().await;
                session = self.refresh_locked(&write).await?;
                guard = write.downgrade();
            }
            Some(false) => {}
        }

        if let Some(session) = &session {
            let mut value = header_value(&session.authorization_value())?;
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let response = next.run(request).await?;
        self.context.cookies().harvest(&url, response.headers());
        drop(guard);
        Ok(response)
    }
}
