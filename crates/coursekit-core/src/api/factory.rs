//! Builds typed services over one shared transport.
//!
//! Every service is constructed from `(config, login mode, session context)`
//! and never mutated afterwards; a mode change means building a new one.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};

use super::services::{
    AnonymousService, CookieAuthService, FeedbackService, LoggedService, OAuthService,
};
use super::{ApiError, ApiResult};
use crate::auth::coordinator::TokenRefresher;
use crate::auth::cookie_auth::{CookieAuthenticator, CookieSession};
use crate::auth::{LoginMode, SessionContext};
use crate::config::Config;
use crate::http::{BasicAuth, Middleware, RestClient, UserAgent};

/// Clone is cheap - the connection pool and config are shared.
#[derive(Clone)]
pub struct ClientFactory {
    http: Client,
    base_url: Url,
    config: Arc<Config>,
    context: Arc<SessionContext>,
}

impl ClientFactory {
    pub fn new(config: Arc<Config>, context: Arc<SessionContext>) -> ApiResult<Self> {
        let base_url = config.base().map_err(Self::config_error)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            config,
            context,
        })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    fn client(&self, stages: Vec<Arc<dyn Middleware>>) -> RestClient {
        RestClient::new(self.http.clone(), self.base_url.clone(), stages)
    }

    fn config_error(e: anyhow::Error) -> ApiError {
        ApiError::Configuration(format!("{:#}", e))
    }

    fn user_agent(&self) -> ApiResult<Arc<dyn Middleware>> {
        Ok(Arc::new(UserAgent::new(&self.config.user_agent)?))
    }

    /// Token endpoints with the Basic credentials of `mode`'s OAuth client.
    pub fn oauth(&self, mode: LoginMode) -> ApiResult<OAuthService> {
        let basic = BasicAuth::new(self.config.client_credentials(mode))?;
        let client = self.client(vec![self.user_agent()?, Arc::new(basic)]);
        Ok(OAuthService::new(client, Arc::clone(&self.config), mode))
    }

    pub fn anonymous(&self) -> ApiResult<AnonymousService> {
        Ok(AnonymousService::new(self.client(vec![self.user_agent()?])))
    }

    /// Help desk client: same connection pool, different host, no auth.
    pub fn feedback(&self) -> ApiResult<FeedbackService> {
        let host = self.config.feedback_base().map_err(Self::config_error)?;
        let client = RestClient::new(self.http.clone(), host, vec![self.user_agent()?]);
        Ok(FeedbackService::new(client))
    }

    pub fn cookie_session(&self) -> ApiResult<CookieSession> {
        Ok(CookieSession::new(
            Arc::clone(&self.context),
            Arc::clone(&self.config),
            self.anonymous()?,
        ))
    }

    /// Services authenticated by the token refresh coordinator.
    pub fn logged(&self) -> ApiResult<LoggedService> {
        let refresher = TokenRefresher::new(
            Arc::clone(&self.context),
            self.clone(),
            self.cookie_session()?,
        );
        let client = self.client(vec![self.user_agent()?, Arc::new(refresher)]);
        Ok(LoggedService::new(client))
    }

    pub fn cookie_authenticated(&self, csrf_in_query: bool) -> ApiResult<CookieAuthService> {
        let authenticator = CookieAuthenticator::new(self.cookie_session()?, csrf_in_query);
        let client = self.client(vec![self.user_agent()?, Arc::new(authenticator)]);
        Ok(CookieAuthService::new(client))
    }
}
