//! Header-only pipeline stages.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Request, Response};

use super::pipeline::{Middleware, Next};
use crate::api::{ApiError, ApiResult};
use crate::config::ClientCredentials;

pub const REFERER: &str = "referer";
pub const CSRF_HEADER: &str = "x-csrftoken";

pub(crate) fn header_value(value: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ApiError::Configuration("header value contains invalid characters".to_string()))
}

/// Set the fixed user agent, replacing any existing value.
pub fn decorate(mut request: Request, user_agent: &HeaderValue) -> Request {
    request.headers_mut().insert(USER_AGENT, user_agent.clone());
    request
}

/// `Basic base64(client_id:client_secret)`.
pub fn basic_credentials(credentials: &ClientCredentials) -> String {
    let raw = format!("{}:{}", credentials.client_id, credentials.client_secret);
    format!("Basic {}", STANDARD.encode(raw))
}

pub struct UserAgent {
    value: HeaderValue,
}

impl UserAgent {
    pub fn new(user_agent: &str) -> ApiResult<Self> {
        Ok(Self {
            value: header_value(user_agent)?,
        })
    }
}

#[async_trait]
impl Middleware for UserAgent {
    async fn handle(&self, request: Request, next: Next<'_>) -> ApiResult<Response> {
        next.run(decorate(request, &self.value)).await
    }
}

/// OAuth client authentication for token endpoints.
pub struct BasicAuth {
    value: HeaderValue,
}

impl BasicAuth {
    pub fn new(credentials: &ClientCredentials) -> ApiResult<Self> {
        let mut value = header_value(&basic_credentials(credentials))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }
}

#[async_trait]
impl Middleware for BasicAuth {
    async fn handle(&self, mut request: Request, next: Next<'_>) -> ApiResult<Response> {
        request.headers_mut().insert(AUTHORIZATION, self.value.clone());
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Method, Url};

    #[test]
    fn test_decorate_sets_user_agent_once() {
        let mut request = Request::new(Method::GET, Url::parse("https://stepik.org/").unwrap());
        request
            .headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static("reqwest"));
        let ua = HeaderValue::from_static("coursekit/test");
        let request = decorate(request, &ua);
        let values: Vec<_> = request.headers().get_all(USER_AGENT).iter().collect();
        assert_eq!(values, vec![&ua]);
    }

    #[test]
    fn test_basic_credentials() {
        let credentials = ClientCredentials {
            client_id: "Aladdin".into(),
            client_secret: "open sesame".into(),
        };
        assert_eq!(
            basic_credentials(&credentials),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn test_invalid_user_agent_is_rejected() {
        assert!(matches!(
            UserAgent::new("bad\nagent"),
            Err(ApiError::Configuration(_))
        ));
    }
}
