//! HTTP transport: the middleware pipeline, header stages, and cookie jar.

pub mod cookies;
pub mod decorate;
pub mod pipeline;

pub use cookies::CookieJar;
pub use decorate::{BasicAuth, UserAgent};
pub use pipeline::{Middleware, Next, RestClient};
