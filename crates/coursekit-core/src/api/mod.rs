//! REST API client module for the course platform.
//!
//! This module provides the `Api` facade, the typed services it delegates
//! to, and the `ClientFactory` that builds them. Services differ only in the
//! header policy of their request pipeline:
//!
//! - `OAuthService`: Basic client credentials, token endpoints
//! - `LoggedService`: bearer token with automatic refresh, cookie fallback
//! - `CookieAuthService`: anonymous session cookies plus CSRF token
//! - `AnonymousService`: no credentials
//! - `FeedbackService`: no credentials, help desk host

pub mod client;
pub mod error;
pub mod factory;
pub mod requests;
pub mod services;

pub use client::Api;
pub use error::{ApiError, ApiResult};
pub use factory::ClientFactory;
pub use services::{
    AnonymousService, CookieAuthService, FeedbackService, LoggedService, OAuthService,
};
