//! Core library for coursekit.
//!
//! Contains the REST client for the course platform: OAuth and cookie
//! authentication, transparent token refresh, typed services, and the data
//! models they return. Front ends (the CLI) build on the `Api` facade.

pub mod api;
pub mod auth;
pub mod config;
pub mod http;
pub mod models;

pub use api::{Api, ApiError, ApiResult};
pub use auth::SessionContext;
pub use config::Config;
