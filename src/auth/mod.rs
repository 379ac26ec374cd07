//! Authentication module for vetagenda.
//!
//! This module provides credential hashing, input validation,
//! profile-based permissions and the authentication service.

pub mod credential;
pub mod permission;
pub mod service;
pub mod validation;

pub use credential::{CredentialError, CredentialManager, HashFormat};
pub use permission::{can, permissions_for, require, require_named, Action, PermissionError};
pub use service::{AuthError, AuthResult, AuthenticationService};
pub use validation::ValidationError;
