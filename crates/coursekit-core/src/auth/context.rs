//! Shared authentication state for one device.
//!
//! `SessionContext` owns the process-wide session lock. Store access goes
//! through the lock guards, so only a writer can replace the session.
//!
//! Lock order: take `read()`; if the token needs renewal, drop the read guard,
//! take `write()`, re-check, refresh, then `downgrade()` back to a read guard
//! and keep it until the request finishes. Never request `write()` while
//! holding a read guard from the same task.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use super::collaborators::{Diagnostics, HeadlessLogout, LogoutHandler, TracingDiagnostics};
use super::credentials::CredentialStore;
use super::session::AuthSession;
use crate::api::{ApiError, ApiResult};
use crate::http::CookieJar;
use crate::models::Profile;

pub struct SessionContext {
    lock: RwLock<()>,
    store: Arc<dyn CredentialStore>,
    cookies: CookieJar,
    diagnostics: Arc<dyn Diagnostics>,
    logout: Arc<dyn LogoutHandler>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            lock: RwLock::new(()),
            store,
            cookies: CookieJar::new(),
            diagnostics: Arc::new(TracingDiagnostics),
            logout: Arc::new(HeadlessLogout),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_logout_handler(mut self, logout: Arc<dyn LogoutHandler>) -> Self {
        self.logout = logout;
        self
    }

    pub async fn read(&self) -> SessionReadGuard<'_> {
        SessionReadGuard {
            context: self,
            _guard: self.lock.read().await,
        }
    }

    pub async fn write(&self) -> SessionWriteGuard<'_> {
        SessionWriteGuard {
            context: self,
            guard: self.lock.write().await,
        }
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    pub fn logout_handler(&self) -> &dyn LogoutHandler {
        self.logout.as_ref()
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Cached profile. Not part of the token critical section.
    pub fn profile(&self) -> ApiResult<Option<Profile>> {
        self.store.profile().map_err(ApiError::storage)
    }

    pub fn store_profile(&self, profile: &Profile) -> ApiResult<()> {
        self.store.store_profile(profile).map_err(ApiError::storage)
    }
}

pub struct SessionReadGuard<'a> {
    context: &'a SessionContext,
    _guard: RwLockReadGuard<'a, ()>,
}

impl SessionReadGuard<'_> {
    pub fn session(&self) -> ApiResult<Option<AuthSession>> {
        self.context.store.session().map_err(ApiError::storage)
    }
}

pub struct SessionWriteGuard<'a> {
    context: &'a SessionContext,
    guard: RwLockWriteGuard<'a, ()>,
}

impl<'a> SessionWriteGuard<'a> {
    pub fn session(&self) -> ApiResult<Option<AuthSession>> {
        self.context.store.session().map_err(ApiError::storage)
    }

    pub fn store_session(&self, session: &AuthSession) -> ApiResult<()> {
        self.context
            .store
            .store_session(session)
            .map_err(ApiError::storage)
    }

    /// Drop the session, the cached profile, and all cookies.
    ///
    /// Best effort: store failures are logged and the remaining steps still run.
    pub fn clear_all(&self) {
        if let Err(e) = self.context.store.clear_session() {
            warn!(error = %e, "failed to clear stored session");
        }
        if let Err(e) = self.context.store.clear_profile() {
            warn!(error = %e, "failed to clear cached profile");
        }
        self.context.cookies.clear();
    }

    /// Atomically turn the write guard into a read guard.
    pub fn downgrade(self) -> SessionReadGuard<'a> {
        SessionReadGuard {
            context: self.context,
            _guard: RwLockWriteGuard::downgrade(self.guard),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;
    use chrono::Utc;
    use std::time::Duration;

    fn session(token: &str) -> AuthSession {
        AuthSession {
            access_token: token.into(),
            refresh_token: "refresh".into(),
            token_type: "Bearer".into(),
            expires_in: 3600,
            scope: None,
            issued_at: Some(Utc::now()),
            is_social_login: false,
        }
    }

    #[tokio::test]
    async fn test_downgrade_keeps_writers_out() {
        let context = Arc::new(SessionContext::new(Arc::new(MemoryCredentialStore::new())));

        let write = context.write().await;
        write.store_session(&session("first")).unwrap();
        let read = write.downgrade();

        let writer = {
            let context = Arc::clone(&context);
            tokio::spawn(async move {
                let write = context.write().await;
                write.store_session(&session("second")).unwrap();
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(read.session().unwrap().unwrap().access_token, "first");
        drop(read);

        writer.await.unwrap();
        let read = context.read().await;
        assert_eq!(read.session().unwrap().unwrap().access_token, "second");
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = Arc::new(MemoryCredentialStore::with_session(session("token")));
        store
            .store_profile(&Profile {
                id: 7,
                ..Profile::default()
            })
            .unwrap();
        let context = SessionContext::new(store);
        let base = reqwest::Url::parse("https://stepik.org/").unwrap();
        context.cookies().store(&base, "sessionid=abc");

        context.write().await.clear_all();

        assert!(context.read().await.session().unwrap().is_none());
        assert!(context.profile().unwrap().is_none());
        assert!(context.cookies().cookie_header(&base).is_none());
    }
}
