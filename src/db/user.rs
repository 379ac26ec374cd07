//! User model for vetagenda.
//!
//! This module defines the staff `User` struct together with the
//! `Profile` and `UserStatus` enums stored alongside it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::auth::permission::{permissions_for, Action};

/// Staff profile, which determines the permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Full access.
    Admin,
    /// Front desk: can view and create records.
    #[default]
    Receptionist,
    /// Veterinarian: read-only access.
    Veterinarian,
}

impl Profile {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Admin => "admin",
            Profile::Receptionist => "recepcionista",
            Profile::Veterinarian => "veterinario",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrador" => Ok(Profile::Admin),
            "recepcionista" | "receptionist" => Ok(Profile::Receptionist),
            "veterinario" | "veterinário" | "veterinarian" => Ok(Profile::Veterinarian),
            _ => Err(format!("unknown profile: {s}")),
        }
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Can log in.
    #[default]
    Active,
    /// Soft-deleted; login is refused.
    Inactive,
}

impl UserStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ativo",
            UserStatus::Inactive => "inativo",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ativo" | "active" => Ok(UserStatus::Active),
            "inativo" | "inactive" => Ok(UserStatus::Inactive),
            _ => Err(format!("unknown user status: {s}")),
        }
    }
}

/// Staff user.
///
/// The password hash never leaves this struct through serialization or
/// debug output.
#[derive(Clone, Serialize)]
pub struct User {
    /// Row ID.
    pub id: i64,
    /// Public identifier.
    pub uuid: String,
    /// Full name.
    pub name: String,
    /// Login email (normalized to lowercase).
    pub email: String,
    /// Stored credential hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Permission profile.
    pub profile: Profile,
    /// Account status.
    pub status: UserStatus,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[redacted]")
            .field("profile", &self.profile)
            .field("status", &self.status)
            .field("last_login", &self.last_login)
            .finish()
    }
}

impl User {
    /// Check if the account is active.
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Check if the user may perform an action.
    pub fn can(&self, action: Action) -> bool {
        self.permissions().contains(&action)
    }

    /// Actions available to this user. Inactive users get none.
    pub fn permissions(&self) -> Vec<Action> {
        if !self.is_active() {
            return Vec::new();
        }
        permissions_for(self.profile).to_vec()
    }

    /// Public view of the user, including the resolved permission list.
    pub fn view(&self) -> UserView {
        UserView {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            profile: self.profile,
            status: self.status,
            last_login: self.last_login,
            permissions: self.permissions(),
        }
    }
}

/// Serializable user representation for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    /// Public identifier.
    pub uuid: String,
    /// Full name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Permission profile.
    pub profile: Profile,
    /// Account status.
    pub status: UserStatus,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Resolved permissions.
    pub permissions: Vec<Action>,
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let profile: String = row.try_get("profile")?;
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            uuid: row.try_get("uuid")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            profile: profile.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "profile".to_string(),
                source: e.into(),
            })?,
            status: status.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            })?,
            last_login: row.try_get("last_login")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Full name (already normalized).
    pub name: String,
    /// Login email (already normalized).
    pub email: String,
    /// Credential hash produced by the credential manager.
    pub password_hash: String,
    /// Permission profile.
    pub profile: Profile,
}

impl NewUser {
    /// Create a new receptionist account.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            profile: Profile::default(),
        }
    }

    /// Set the profile.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }
}
