//! Middleware pipeline over a shared `reqwest::Client`.
//!
//! A `RestClient` owns an ordered list of stages. Each stage receives the
//! request and a [`Next`] handle, may rewrite the request, calls
//! `next.run(request)`, and may inspect the response on the way back. The
//! last stage hands the request to the transport.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, Request, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::api::{ApiError, ApiResult};

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: Request, next: Next<'_>) -> ApiResult<Response>;
}

/// The remainder of the pipeline after the current stage.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    client: &'a Client,
    stages: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub fn new(client: &'a Client, stages: &'a [Arc<dyn Middleware>]) -> Self {
        Self { client, stages }
    }

    pub async fn run(self, request: Request) -> ApiResult<Response> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                stage
                    .handle(request, Next::new(self.client, rest))
                    .await
            }
            None => Ok(self.client.execute(request).await?),
        }
    }
}

/// A typed-service transport: base URL, shared connection pool, stages.
/// Clone is cheap; it shares the pool and the stage list.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
    stages: Arc<[Arc<dyn Middleware>]>,
}

impl RestClient {
    pub fn new(http: Client, base_url: Url, stages: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            http,
            base_url,
            stages: stages.into(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Configuration(format!("Invalid request path {}: {}", path, e)))
    }

    pub fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        Ok(self.http.request(method, self.url(path)?))
    }

    /// Run a request through the stages. Non-2xx statuses are returned as-is.
    pub async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let request = builder.build()?;
        debug!(method = %request.method(), path = request.url().path(), "sending request");
        Next::new(&self.http, &self.stages).run(request).await
    }

    /// Send and require a 2xx status.
    pub async fn send_checked(&self, builder: RequestBuilder) -> ApiResult<Response> {
        check_response(self.send(builder).await?).await
    }

    /// Send, require 2xx, and decode the JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = self.send_checked(builder).await?;
        decode(response).await
    }

    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.fetch(self.request(Method::GET, path)?.query(query)).await
    }

    pub async fn get_resource<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.fetch(self.request(Method::GET, path)?).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch(self.request(Method::POST, path)?.json(body)).await
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch(self.request(Method::PUT, path)?.json(body)).await
    }

    pub async fn post_form<T, F>(&self, path: &str, form: &F) -> ApiResult<T>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        self.fetch(self.request(Method::POST, path)?.form(form)).await
    }

    /// Requests whose response body is ignored.
    pub async fn execute_empty(&self, builder: RequestBuilder) -> ApiResult<()> {
        self.send_checked(builder).await?;
        Ok(())
    }
}

/// Check if response is successful, returning an error with body if not.
pub async fn check_response(response: Response) -> ApiResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}

/// Decode a JSON body into a typed record.
pub async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let path = response.url().path().to_string();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::decoding(format!("response from {}", path), e))
}
