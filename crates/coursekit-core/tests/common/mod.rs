#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use coursekit_core::auth::{AuthSession, Diagnostics, LogoutHandler, MemoryCredentialStore};
use coursekit_core::config::ClientCredentials;
use coursekit_core::{Api, Config, SessionContext};
use mockito::Server;
use parking_lot::Mutex;

pub const TOKEN_BODY: &str = r#"{
    "access_token": "access-2",
    "refresh_token": "refresh-2",
    "token_type": "Bearer",
    "expires_in": 36000,
    "scope": "read write"
}"#;

pub const COURSES_BODY: &str = r#"{
    "meta": {"page": 1, "has_next": false, "has_previous": false},
    "courses": [{"id": 67, "title": "Intro to Statistics", "enrollment": 12}]
}"#;

#[derive(Default)]
pub struct RecordingDiagnostics {
    pub events: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    pub fn has_event(&self, name: &str) -> bool {
        self.events.lock().iter().any(|e| e == name)
    }

    pub fn has_error(&self, name: &str) -> bool {
        self.errors.lock().iter().any(|e| e == name)
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report_event(&self, name: &str) {
        self.events.lock().push(name.to_string());
    }

    fn report_error(&self, name: &str, _error: &(dyn std::error::Error + 'static)) {
        self.errors.lock().push(name.to_string());
    }
}

#[derive(Default)]
pub struct CountingLogout {
    pub sign_outs: AtomicUsize,
    pub launch_screens: AtomicUsize,
    pub notices: Mutex<Vec<String>>,
}

impl CountingLogout {
    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

impl LogoutHandler for CountingLogout {
    fn sign_out_social(&self) -> anyhow::Result<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn show_launch_screen(&self) {
        self.launch_screens.fetch_add(1, Ordering::SeqCst);
    }

    fn notify_user(&self, message: &str) {
        self.notices.lock().push(message.to_string());
    }
}

pub fn session(access: &str, issued_at: Option<DateTime<Utc>>) -> AuthSession {
    AuthSession {
        access_token: access.to_string(),
        refresh_token: "refresh-1".to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 36000,
        scope: None,
        issued_at,
        is_social_login: false,
    }
}

pub fn config(server: &Server) -> Config {
    Config {
        base_url: server.url(),
        password_client: ClientCredentials {
            client_id: "pw-client".to_string(),
            client_secret: "pw-secret".to_string(),
        },
        social_client: ClientCredentials {
            client_id: "social-client".to_string(),
            client_secret: "social-secret".to_string(),
        },
        ..Config::default()
    }
}

pub struct Harness {
    pub api: Api,
    pub context: Arc<SessionContext>,
    pub diagnostics: Arc<RecordingDiagnostics>,
    pub logout: Arc<CountingLogout>,
}

pub fn harness(server: &Server, session: Option<AuthSession>) -> Harness {
    harness_with(config(server), session)
}

/// A base URL on which nothing listens.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn harness_with(config: Config, session: Option<AuthSession>) -> Harness {
    let store = match session {
        Some(session) => MemoryCredentialStore::with_session(session),
        None => MemoryCredentialStore::new(),
    };
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let logout = Arc::new(CountingLogout::default());
    let context = Arc::new(
        SessionContext::new(Arc::new(store))
            .with_diagnostics(diagnostics.clone())
            .with_logout_handler(logout.clone()),
    );
    let api = Api::new(config, Arc::clone(&context)).expect("api");
    Harness {
        api,
        context,
        diagnostics,
        logout,
    }
}
