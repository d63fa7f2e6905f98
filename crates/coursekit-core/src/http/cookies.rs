//! Per-origin cookie storage for cookie-authenticated (anonymous) sessions.
//!
//! Cookies are keyed by origin (scheme, host, port) so cookies harvested from
//! any endpoint are visible for the base URL. Only `name=value` pairs are
//! kept; expiry and scoping attributes are ignored.

use std::collections::HashMap;

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::Url;
use tracing::debug;

/// Set-Cookie attribute names that are not cookies themselves.
const ATTRIBUTES: &[&str] = &[
    "path", "domain", "expires", "max-age", "secure", "httponly", "samesite", "priority",
    "partitioned", "version", "comment",
];

#[derive(Debug, Default)]
pub struct CookieJar {
    origins: RwLock<HashMap<String, Vec<(String, String)>>>,
}

fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Split a `;`-delimited cookie string into `(name, value)` pairs, skipping
/// attributes and malformed fragments.
fn parse_pairs(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    raw.split(';').filter_map(|fragment| {
        let (name, value) = fragment.split_once('=')?;
        let name = name.trim();
        if name.is_empty() || ATTRIBUTES.iter().any(|a| name.eq_ignore_ascii_case(a)) {
            return None;
        }
        Some((name, value.trim().trim_matches('"')))
    })
}

/// Find the value of `cookie_name` in a `Cookie`-style header value.
pub fn csrf_token(cookies: &str, cookie_name: &str) -> Option<String> {
    parse_pairs(cookies)
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `Set-Cookie` header value. A pair with an empty value
    /// deletes the cookie.
    pub fn store(&self, url: &Url, set_cookie: &str) {
        let mut origins = self.origins.write();
        let jar = origins.entry(origin_key(url)).or_default();
        for (name, value) in parse_pairs(set_cookie) {
            let existing = jar.iter().position(|(n, _)| n == name);
            match (existing, value.is_empty()) {
                (Some(i), true) => {
                    jar.remove(i);
                }
                (Some(i), false) => jar[i].1 = value.to_string(),
                (None, true) => {}
                (None, false) => jar.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Record every `Set-Cookie` header of a response. Returns how many
    /// header values were seen.
    pub fn harvest(&self, url: &Url, headers: &HeaderMap) -> usize {
        let mut seen = 0;
        for value in headers.get_all(SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                self.store(url, raw);
                seen += 1;
            }
        }
        if seen > 0 {
            debug!(origin = %origin_key(url), count = seen, "stored response cookies");
        }
        seen
    }

    /// `Cookie` header value for `url`, or `None` when nothing is cached.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let origins = self.origins.read();
        let jar = origins.get(&origin_key(url))?;
        if jar.is_empty() {
            return None;
        }
        Some(
            jar.iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn get(&self, url: &Url, name: &str) -> Option<String> {
        self.origins
            .read()
            .get(&origin_key(url))?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn clear(&self) {
        self.origins.write().clear();
    }
}
