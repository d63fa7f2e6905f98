//! Authentication module for sessions, credentials, and the token refresh
//! coordinator.
//!
//! This module provides:
//! - `AuthSession`: the persisted OAuth tokens and their issuance time
//! - `CredentialStore`: storage for the session, profile, and login mode
//! - `SessionContext`: the session lock plus the collaborators the auth layer reports to
//! - `TokenRefresher`: the pipeline stage that keeps bearer tokens fresh
//!
//! Tokens are treated as stale 50 seconds before they expire.

pub mod collaborators;
pub mod context;
pub mod cookie_auth;
pub mod coordinator;
pub mod credentials;
pub mod session;

pub use collaborators::{Diagnostics, HeadlessLogout, LogoutHandler, TracingDiagnostics};
pub use context::SessionContext;
pub use coordinator::SESSION_EXPIRED_NOTICE;
pub use credentials::{CredentialStore, FileCredentialStore, Keychain, MemoryCredentialStore};
pub use session::{AuthSession, LoginMode, OAuthResponse};
