//! Permission checking for vetagenda.
//!
//! Each profile maps to a fixed set of actions. Inactive accounts have
//! no permissions regardless of profile.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::db::{Profile, User};

/// Actions that can be granted to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Read records.
    View,
    /// Create records.
    Create,
    /// Modify records.
    Edit,
    /// Delete records.
    Delete,
}

impl Action {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "visualizar",
            Action::Create => "criar",
            Action::Edit => "editar",
            Action::Delete => "excluir",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    /// Parse an action name; surrounding whitespace and case are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "visualizar" | "view" => Ok(Action::View),
            "criar" | "create" => Ok(Action::Create),
            "editar" | "edit" => Ok(Action::Edit),
            "excluir" | "delete" => Ok(Action::Delete),
            _ => Err(format!("unknown action: {s}")),
        }
    }
}

const ADMIN_ACTIONS: &[Action] = &[Action::View, Action::Create, Action::Edit, Action::Delete];
const RECEPTIONIST_ACTIONS: &[Action] = &[Action::View, Action::Create];
const VETERINARIAN_ACTIONS: &[Action] = &[Action::View];

/// Actions granted to a profile.
pub fn permissions_for(profile: Profile) -> &'static [Action] {
    match profile {
        Profile::Admin => ADMIN_ACTIONS,
        Profile::Receptionist => RECEPTIONIST_ACTIONS,
        Profile::Veterinarian => VETERINARIAN_ACTIONS,
    }
}

/// Permission-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The profile does not grant the action.
    #[error("profile {profile} cannot {action}")]
    NotAllowed {
        /// Profile of the user.
        profile: Profile,
        /// Requested action.
        action: Action,
    },

    /// User is not authenticated.
    #[error("login required")]
    NotAuthenticated,

    /// User account is not active.
    #[error("account is inactive")]
    AccountInactive,

    /// The action name was not recognized.
    #[error("{0}")]
    UnknownAction(String),
}

/// Check whether a user may perform an action named by a string.
///
/// Unknown or blank action names are never allowed.
///
/// # Examples
///
/// ```ignore
/// assert!(can(&admin, " Excluir "));
/// assert!(!can(&vet, "criar"));
/// ```
pub fn can(user: &User, action: &str) -> bool {
    action
        .parse::<Action>()
        .map(|action| user.can(action))
        .unwrap_or(false)
}

/// Require that the current user may perform an action.
///
/// This checks, in order:
/// 1. A user is logged in
/// 2. The account is active
/// 3. The profile grants the action
pub fn require(user: Option<&User>, action: Action) -> Result<(), PermissionError> {
    let user = user.ok_or(PermissionError::NotAuthenticated)?;

    if !user.is_active() {
        return Err(PermissionError::AccountInactive);
    }

    if !permissions_for(user.profile).contains(&action) {
        return Err(PermissionError::NotAllowed {
            profile: user.profile,
            action,
        });
    }

    Ok(())
}

/// Like [`require`], taking the action by name.
pub fn require_named(user: Option<&User>, action: &str) -> Result<(), PermissionError> {
    let action = action.parse::<Action>().map_err(PermissionError::UnknownAction)?;
    require(user, action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserStatus;
    use chrono::Utc;

    fn create_user(profile: Profile, status: UserStatus) -> User {
        User {
            id: 1,
            uuid: "uuid".to_string(),
            name: "Test".to_string(),
            email: "test@vta.com".to_string(),
            password_hash: "hash".to_string(),
            profile,
            status,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_can_everything() {
        let admin = create_user(Profile::Admin, UserStatus::Active);
        for action in ["visualizar", "criar", "editar", "excluir"] {
            assert!(can(&admin, action), "admin should {action}");
        }
    }

    #[test]
    fn test_receptionist_permissions() {
        let user = create_user(Profile::Receptionist, UserStatus::Active);
        assert!(can(&user, "visualizar"));
        assert!(can(&user, "criar"));
        assert!(!can(&user, "editar"));
        assert!(!can(&user, "excluir"));
    }

    #[test]
    fn test_veterinarian_permissions() {
        let user = create_user(Profile::Veterinarian, UserStatus::Active);
        assert!(can(&user, "visualizar"));
        assert!(!can(&user, "criar"));
    }

    #[test]
    fn test_action_normalization() {
        let user = create_user(Profile::Receptionist, UserStatus::Active);
        assert!(can(&user, "  CRIAR "));
        assert!(can(&user, "View"));
        assert!(!can(&user, ""));
        assert!(!can(&user, "   "));
        assert!(!can(&user, "voar"));
    }

    #[test]
    fn test_inactive_user_denied() {
        let user = create_user(Profile::Admin, UserStatus::Inactive);
        assert!(!can(&user, "visualizar"));
        assert_eq!(
            require(Some(&user), Action::View),
            Err(PermissionError::AccountInactive)
        );
    }

    #[test]
    fn test_require() {
        let vet = create_user(Profile::Veterinarian, UserStatus::Active);
        assert!(require(Some(&vet), Action::View).is_ok());
        assert_eq!(
            require(Some(&vet), Action::Delete),
            Err(PermissionError::NotAllowed {
                profile: Profile::Veterinarian,
                action: Action::Delete,
            })
        );
        assert_eq!(
            require(None, Action::View),
            Err(PermissionError::NotAuthenticated)
        );
    }

    #[test]
    fn test_require_named() {
        let admin = create_user(Profile::Admin, UserStatus::Active);
        assert!(require_named(Some(&admin), "Excluir").is_ok());
        assert!(matches!(
            require_named(Some(&admin), "fly"),
            Err(PermissionError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_permission_error_display() {
        let err = PermissionError::NotAllowed {
            profile: Profile::Veterinarian,
            action: Action::Delete,
        };
        assert_eq!(err.to_string(), "profile veterinario cannot excluir");
    }
}
