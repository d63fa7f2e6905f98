//! User-facing records: profile, users, devices, certificates.

use serde::{Deserialize, Serialize};

/// The signed-in (or guest) user's own profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub short_bio: Option<String>,
    pub details: Option<String>,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub subscribed_for_mail: bool,
    #[serde(default)]
    pub email_addresses: Vec<i64>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("{} {}", self.first_name, self.last_name).trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub short_bio: Option<String>,
    pub details: Option<String>,
    #[serde(default)]
    pub is_organization: bool,
    #[serde(default)]
    pub is_guest: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailAddress {
    pub id: i64,
    #[serde(default)]
    pub user: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_primary: bool,
}

/// Push registration of a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub id: Option<i64>,
    pub user: Option<i64>,
    pub registration_id: String,
    pub description: String,
    pub client_type: String,
    pub is_badges_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Certificate {
    pub id: i64,
    #[serde(default)]
    pub user: i64,
    #[serde(default)]
    pub course: i64,
    pub issue_date: Option<String>,
    pub updated_date: Option<String>,
    pub grade: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserActivity {
    pub id: i64,
    /// Daily activity counters, most recent first.
    #[serde(default)]
    pub pins: Vec<i64>,
}

impl UserActivity {
    /// Consecutive active days counting back from today.
    pub fn current_streak(&self) -> usize {
        self.pins.iter().take_while(|&&pins| pins > 0).count()
    }
}

/// Sign-up payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// App update descriptor served next to the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateInfo {
    pub version_code: i64,
    pub link_to_market: Option<String>,
    pub is_force_update: bool,
}
