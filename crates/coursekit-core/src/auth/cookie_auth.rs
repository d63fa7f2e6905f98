//! Cookie-based authentication for requests made without a bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Request, Response, Url};
use tracing::{debug, warn};

use super::collaborators::events;
use super::context::SessionContext;
use crate::api::services::AnonymousService;
use crate::api::{ApiError, ApiResult};
use crate::config::Config;
use crate::http::cookies::csrf_token;
use crate::http::decorate::{header_value, CSRF_HEADER, REFERER};
use crate::http::{Middleware, Next};

/// Query parameter the password reset form expects the CSRF token in.
const CSRF_QUERY_PARAM: &str = "csrfmiddlewaretoken";

/// Cookie bootstrap for the anonymous session of the base URL.
#[derive(Clone)]
pub struct CookieSession {
    context: Arc<SessionContext>,
    config: Arc<Config>,
    anonymous: AnonymousService,
}

impl CookieSession {
    pub fn new(context: Arc<SessionContext>, config: Arc<Config>, anonymous: AnonymousService) -> Self {
        Self {
            context,
            config,
            anonymous,
        }
    }

    fn base_url(&self) -> &Url {
        self.anonymous.base_url()
    }

    /// Cached cookies for the base URL, bootstrapping them with one
    /// unauthenticated request when none are cached.
    pub async fn cookie_header(&self) -> ApiResult<Option<String>> {
        let jar = self.context.cookies();
        if let Some(cookies) = jar.cookie_header(self.base_url()) {
            return Ok(Some(cookies));
        }
        debug!("no cached cookies, bootstrapping anonymous session");
        self.anonymous
            .bootstrap_cookies(&self.config.language, jar)
            .await?;
        Ok(jar.cookie_header(self.base_url()))
    }

    /// CSRF token from a cookie string; empty (and reported) when absent.
    pub fn csrf_token(&self, cookies: &str) -> String {
        csrf_token(cookies, &self.config.csrf_cookie_name).unwrap_or_else(|| {
            self.context.diagnostics().report_event(events::COOKIE_WAS_EMPTY);
            String::new()
        })
    }

    /// Fetch and cache the profile of the cookie session if none is cached.
    ///
    /// Transport errors propagate. Any other failure is reported and the
    /// caller carries on without a profile.
    pub async fn ensure_profile(&self, cookies: &str, csrf: &str) -> ApiResult<()> {
        if self.context.profile()?.is_some() {
            return Ok(());
        }
        match self.anonymous.profile_with_cookie(cookies, csrf).await {
            Ok(Some(profile)) => {
                debug!(profile_id = profile.id, "cached profile of anonymous session");
                self.context.store_profile(&profile)?;
            }
            Ok(None) => debug!("anonymous session has no profile yet"),
            Err(e @ ApiError::Network(_)) => return Err(e),
            Err(e) => {
                warn!(error = %e, "profile bootstrap failed");
                self.context
                    .diagnostics()
                    .report_error(events::PROFILE_BOOTSTRAP_FAILED, &e);
            }
        }
        Ok(())
    }

    /// Attach `Cookie`, `Referer`, and `X-CSRFToken` headers.
    pub fn apply(&self, request: &mut Request, cookies: &str, csrf: &str) -> ApiResult<()> {
        let mut cookie = header_value(cookies)?;
        cookie.set_sensitive(true);
        let headers = request.headers_mut();
        headers.insert(COOKIE, cookie);
        headers.insert(REFERER, header_value(self.config.referer())?);
        headers.insert(CSRF_HEADER, header_value(csrf)?);
        Ok(())
    }
}

/// Pipeline stage for sign-up and password reminder requests.
pub struct CookieAuthenticator {
    session: CookieSession,
    /// Send only the CSRF and session cookies and repeat the CSRF token as a
    /// `csrfmiddlewaretoken` query parameter (form posts).
    csrf_in_query: bool,
}

impl CookieAuthenticator {
    pub fn new(session: CookieSession, csrf_in_query: bool) -> Self {
        Self {
            session,
            csrf_in_query,
        }
    }

    async fn form_credentials(&self) -> ApiResult<Option<(String, String)>> {
        if self.session.cookie_header().await?.is_none() {
            return Ok(None);
        }
        let config = &self.session.config;
        let jar = self.session.context.cookies();
        let base = self.session.base_url();
        let Some(csrf) = jar.get(base, &config.csrf_cookie_name) else {
            return Ok(None);
        };
        let session_id = jar.get(base, &config.session_cookie_name).unwrap_or_default();
        let cookies = format!(
            "{}={}; {}={}",
            config.csrf_cookie_name, csrf, config.session_cookie_name, session_id
        );
        Ok(Some((cookies, csrf)))
    }
}

#[async_trait]
impl Middleware for CookieAuthenticator {
    async fn handle(&self, mut request: Request, next: Next<'_>) -> ApiResult<Response> {
        let url = request.url().clone();

        let credentials = if self.csrf_in_query {
            self.form_credentials().await?
        } else {
            match self.session.cookie_header().await? {
                Some(cookies) => {
                    let csrf = self.session.csrf_token(&cookies);
                    Some((cookies, csrf))
                }
                None => None,
            }
        };

        match credentials {
            Some((cookies, csrf)) => {
                if self.csrf_in_query {
                    request
                        .url_mut()
                        .query_pairs_mut()
                        .append_pair(CSRF_QUERY_PARAM, &csrf);
                }
                self.session.apply(&mut request, &cookies, &csrf)?;
            }
            None => debug!("no cookies available, sending request without them"),
        }

        let response = next.run(request).await?;
        self.session
            .context
            .cookies()
            .harvest(&url, response.headers());
        Ok(response)
    }
}
