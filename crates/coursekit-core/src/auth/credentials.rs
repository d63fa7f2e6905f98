use std::path::PathBuf;

use anyhow::{Context, Result};
use keyring::credential::CredentialPersistence;
use keyring::Entry;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};

use super::session::{AuthSession, LoginMode};
use crate::models::Profile;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";
const PROFILE_FILE: &str = "profile.json";
const LOGIN_MODE_FILE: &str = "login_mode.json";

const KEYCHAIN_SERVICE: &str = "coursekit";

/// Persisted authentication state.
///
/// Callers that mutate the session must hold the write side of the session
/// lock (see [`SessionContext`](super::SessionContext)); the store itself only
/// guarantees that each call is atomic.
pub trait CredentialStore: Send + Sync {
    fn session(&self) -> Result<Option<AuthSession>>;
    /// Replace the stored session as a whole.
    fn store_session(&self, session: &AuthSession) -> Result<()>;
    fn clear_session(&self) -> Result<()>;

    fn profile(&self) -> Result<Option<Profile>>;
    fn store_profile(&self, profile: &Profile) -> Result<()>;
    fn clear_profile(&self) -> Result<()>;

    fn last_login_mode(&self) -> Result<LoginMode>;
    fn store_last_login_mode(&self, mode: LoginMode) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    session: Option<AuthSession>,
    profile: Option<Profile>,
    mode: LoginMode,
}

/// In-process store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    state: RwLock<MemoryState>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: AuthSession) -> Self {
        let store = Self::default();
        store.state.write().session = Some(session);
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn session(&self) -> Result<Option<AuthSession>> {
        Ok(self.state.read().session.clone())
    }

    fn store_session(&self, session: &AuthSession) -> Result<()> {
        self.state.write().session = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        self.state.write().session = None;
        Ok(())
    }

    fn profile(&self) -> Result<Option<Profile>> {
        Ok(self.state.read().profile.clone())
    }

    fn store_profile(&self, profile: &Profile) -> Result<()> {
        self.state.write().profile = Some(profile.clone());
        Ok(())
    }

    fn clear_profile(&self) -> Result<()> {
        self.state.write().profile = None;
        Ok(())
    }

    fn last_login_mode(&self) -> Result<LoginMode> {
        Ok(self.state.read().mode)
    }

    fn store_last_login_mode(&self, mode: LoginMode) -> Result<()> {
        self.state.write().mode = mode;
        Ok(())
    }
}

/// JSON files under the cache directory.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create credential directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", name))?;
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", name))?;
        Ok(Some(value))
    }

    /// Write to a sibling temp file, then rename over the target.
    fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{}.tmp", name));
        let contents = serde_json::to_string_pretty(value)?;
        std::fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", name))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", name))?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.dir.join(name);
        if path.exists() {
            std::fs::remove_file(&path).with_context(|| format!("Failed to remove {}", name))?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn session(&self) -> Result<Option<AuthSession>> {
        self.load(SESSION_FILE)
    }

    fn store_session(&self, session: &AuthSession) -> Result<()> {
        self.save(SESSION_FILE, session)
    }

    fn clear_session(&self) -> Result<()> {
        self.remove(SESSION_FILE)
    }

    fn profile(&self) -> Result<Option<Profile>> {
        self.load(PROFILE_FILE)
    }

    fn store_profile(&self, profile: &Profile) -> Result<()> {
        self.save(PROFILE_FILE, profile)
    }

    fn clear_profile(&self) -> Result<()> {
        self.remove(PROFILE_FILE)
    }

    fn last_login_mode(&self) -> Result<LoginMode> {
        Ok(self.load(LOGIN_MODE_FILE)?.unwrap_or_default())
    }

    fn store_last_login_mode(&self, mode: LoginMode) -> Result<()> {
        self.save(LOGIN_MODE_FILE, &mode)
    }
}

/// Remembered passwords in the OS keychain.
pub struct Keychain;

impl Keychain {
    /// Whether stored passwords outlive the process. False when no platform
    /// keystore was compiled in and keyring fell back to its mock store.
    pub fn persists() -> bool {
        let builder = keyring::default::default_credential_builder();
        matches!(
            builder.persistence(),
            CredentialPersistence::UntilDelete | CredentialPersistence::UntilReboot
        )
    }

    /// Store the password for a username
    pub fn store(username: &str, password: &str) -> Result<()> {
        let entry = Entry::new(KEYCHAIN_SERVICE, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Remembered password for a username, if any
    pub fn password(username: &str) -> Result<Option<String>> {
        let entry = Entry::new(KEYCHAIN_SERVICE, username)
            .context("Failed to create keyring entry")?;
        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve password from keychain"),
        }
    }

    pub fn delete(username: &str) -> Result<()> {
        let entry = Entry::new(KEYCHAIN_SERVICE, username)
            .context("Failed to create keyring entry")?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}
