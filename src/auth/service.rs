//! Authentication service for vetagenda.
//!
//! Orchestrates credential hashing, the user repository and recovery
//! tokens: login with transparent hash upgrade, account creation, password
//! change and the recovery-token flow.

use chrono::{Duration, Utc};
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::credential::{
    CredentialError, CredentialManager, HashFormat, KEY_LEN, SALT_LEN, SEPARATOR,
};
use crate::auth::validation::{
    normalize_email, normalize_name, validate_email, validate_name, validate_new_password,
    ValidationError,
};
use crate::config::AuthConfig;
use crate::db::{
    Database, NewUser, Profile, RecoveryTokenRepository, User, UserRepository, UserStatus,
};
use crate::AgendaError;

/// Length of a recovery token in random bytes (hex-encoded to twice this).
pub const RECOVERY_TOKEN_BYTES: usize = 32;

/// A well-formed hash no password derives to, at `iterations` rounds.
///
/// Verifying against it costs the same as verifying a real credential.
fn decoy_hash(iterations: u32) -> String {
    format!(
        "{iterations}{SEPARATOR}{}{SEPARATOR}{}",
        "00".repeat(SALT_LEN),
        "00".repeat(KEY_LEN)
    )
}

/// Authentication-specific errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email or wrong password. The two are not distinguished.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Account exists but is deactivated.
    #[error("account is inactive")]
    AccountInactive,

    /// Email already registered.
    #[error("email is already registered")]
    EmailTaken,

    /// Recovery token unknown, used or expired.
    #[error("invalid or expired recovery token")]
    InvalidToken,

    /// No user with the given email.
    #[error("user not found")]
    UserNotFound,

    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Credential derivation failed.
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Hashing task could not complete.
    #[error("internal error: {0}")]
    Internal(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<AgendaError> for AuthError {
    fn from(e: AgendaError) -> Self {
        AuthError::Database(e.to_string())
    }
}

impl From<AuthError> for AgendaError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(v) => AgendaError::Validation(v.to_string()),
            AuthError::Credential(c) => AgendaError::Validation(c.to_string()),
            AuthError::UserNotFound => AgendaError::NotFound("user".to_string()),
            AuthError::EmailTaken => {
                AgendaError::Conflict("email is already registered".to_string())
            }
            AuthError::Database(msg) => AgendaError::Database(msg),
            other => AgendaError::Auth(other.to_string()),
        }
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Authentication service.
#[derive(Debug, Clone)]
pub struct AuthenticationService {
    db: Database,
    credentials: CredentialManager,
    config: AuthConfig,
}

impl AuthenticationService {
    /// Create a service over `db` using the given auth settings.
    pub fn new(db: Database, config: AuthConfig) -> Self {
        Self {
            credentials: CredentialManager::new(config.allow_legacy_hashes),
            db,
            config,
        }
    }

    /// The auth settings in use.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Derive a hash off the async runtime.
    async fn derive(&self, password: &str) -> AuthResult<String> {
        let manager = self.credentials;
        let password = password.to_string();
        let iterations = self.config.pbkdf2_iterations;
        tokio::task::spawn_blocking(move || manager.derive(&password, iterations))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(AuthError::from)
    }

    /// Verify a password off the async runtime.
    async fn verify(&self, hash_value: &str, password: &str) -> AuthResult<bool> {
        let manager = self.credentials;
        let hash_value = hash_value.to_string();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || manager.verify(&hash_value, &password))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Authenticate a user by email and password.
    ///
    /// On success the last-login time is recorded and, when enabled, a
    /// legacy or under-strength hash is replaced by a fresh one.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let repo = UserRepository::new(self.db.pool());
        let Some(user) = repo.get_by_email(&email).await? else {
            // Same PBKDF2 work as a real account so timing does not reveal the email.
            self.verify(&decoy_hash(self.config.pbkdf2_iterations), password)
                .await?;
            debug!("login attempt for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify(&user.password_hash, password).await? {
            info!(user_id = user.id, "login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active() {
            info!(user_id = user.id, "login refused: account inactive");
            return Err(AuthError::AccountInactive);
        }

        let legacy = CredentialManager::inspect(&user.password_hash) == HashFormat::LegacySha256;
        if legacy {
            info!(user_id = user.id, "legacy credential verified");
        }

        if self.config.upgrade_on_login
            && CredentialManager::needs_upgrade(&user.password_hash, self.config.pbkdf2_iterations)
        {
            let upgraded = self.derive(password).await?;
            repo.update_password_hash(user.id, &upgraded).await?;
            info!(user_id = user.id, legacy, "credential hash upgraded");
        }

        repo.update_last_login(user.id, Utc::now()).await?;
        info!(user_id = user.id, "login succeeded");

        repo.get_by_id(user.id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Create a new active user.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        profile: Profile,
    ) -> AuthResult<User> {
        let name = normalize_name(name);
        let email = normalize_email(email);
        validate_name(&name)?;
        validate_email(&email)?;
        validate_new_password(password, self.config.min_password_length)?;

        let repo = UserRepository::new(self.db.pool());
        if repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.derive(password).await?;
        let user = repo
            .create(&NewUser::new(name, email, password_hash).with_profile(profile))
            .await?;

        info!(user_id = user.id, profile = %user.profile, "user created");
        Ok(user)
    }

    /// Change a password after checking the current one.
    pub async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        validate_new_password(new_password, self.config.min_password_length)?;

        let repo = UserRepository::new(self.db.pool());
        let user = repo
            .get_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.verify(&user.password_hash, current_password).await? {
            info!(user_id = user.id, "password change refused: wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.derive(new_password).await?;
        repo.update_password_hash(user.id, &password_hash).await?;
        info!(user_id = user.id, "password changed");
        Ok(())
    }

    /// Issue a password-recovery token.
    ///
    /// Returns `None` for unknown emails. Callers should answer the same way
    /// in both cases so account existence is not disclosed.
    pub async fn request_password_recovery(&self, email: &str) -> AuthResult<Option<String>> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }

        let Some(user) = UserRepository::new(self.db.pool())
            .get_by_email(&email)
            .await?
        else {
            debug!("recovery requested for unknown account");
            return Ok(None);
        };

        let mut bytes = [0u8; RECOVERY_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let ttl = self.config.recovery_token_ttl_minutes;
        let expires_at = Duration::try_minutes(ttl)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                AuthError::Internal(format!("recovery token lifetime out of range: {ttl}"))
            })?;
        RecoveryTokenRepository::new(self.db.pool())
            .create(user.id, &token, expires_at)
            .await?;

        info!(user_id = user.id, %expires_at, "recovery token issued");
        Ok(Some(token))
    }

    /// Set a new password using a recovery token.
    ///
    /// The token is consumed and the password replaced atomically.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<()> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        validate_new_password(new_password, self.config.min_password_length)?;

        let password_hash = self.derive(new_password).await?;
        let user_id = RecoveryTokenRepository::new(self.db.pool())
            .redeem(token.trim(), Utc::now(), &password_hash)
            .await?
            .ok_or_else(|| {
                warn!("password reset with invalid token");
                AuthError::InvalidToken
            })?;

        info!(user_id, "password reset via recovery token");
        Ok(())
    }

    /// Invalidate all live recovery tokens of a user.
    pub async fn invalidate_user_tokens(&self, user_id: i64) -> AuthResult<u64> {
        let count = RecoveryTokenRepository::new(self.db.pool())
            .invalidate_for_user(user_id, Utc::now())
            .await?;
        info!(user_id, count, "recovery tokens invalidated");
        Ok(count)
    }

    /// Delete expired recovery tokens.
    pub async fn purge_expired_tokens(&self) -> AuthResult<u64> {
        let count = RecoveryTokenRepository::new(self.db.pool())
            .purge_expired(Utc::now())
            .await?;
        debug!(count, "expired recovery tokens purged");
        Ok(count)
    }

    /// Whether an email can be used for a new account.
    ///
    /// Malformed emails are never available.
    pub async fn is_email_available(&self, email: &str) -> AuthResult<bool> {
        let email = normalize_email(email);
        if validate_email(&email).is_err() {
            return Ok(false);
        }
        let exists = UserRepository::new(self.db.pool())
            .email_exists(&email)
            .await?;
        Ok(!exists)
    }

    /// Active users ordered by name.
    pub async fn list_active_users(&self) -> AuthResult<Vec<User>> {
        Ok(UserRepository::new(self.db.pool()).list_active().await?)
    }

    /// Change a user's profile.
    pub async fn update_profile(&self, email: &str, profile: Profile) -> AuthResult<()> {
        let updated = UserRepository::new(self.db.pool())
            .update_profile(&normalize_email(email), profile)
            .await?;
        if !updated {
            return Err(AuthError::UserNotFound);
        }
        info!(%profile, "user profile updated");
        Ok(())
    }

    /// Deactivate an account. Inactive users cannot log in.
    pub async fn deactivate_user(&self, email: &str) -> AuthResult<()> {
        self.set_status(email, UserStatus::Inactive).await
    }

    /// Reactivate an account.
    pub async fn reactivate_user(&self, email: &str) -> AuthResult<()> {
        self.set_status(email, UserStatus::Active).await
    }

    async fn set_status(&self, email: &str, status: UserStatus) -> AuthResult<()> {
        let updated = UserRepository::new(self.db.pool())
            .set_status(&normalize_email(email), status)
            .await?;
        if !updated {
            return Err(AuthError::UserNotFound);
        }
        info!(status = status.as_str(), "user status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credential::MIN_ITERATIONS;
    use sha2::{Digest, Sha256};

    async fn setup() -> AuthenticationService {
        let db = Database::open_in_memory().await.unwrap();
        let config = AuthConfig {
            pbkdf2_iterations: MIN_ITERATIONS,
            ..AuthConfig::default()
        };
        AuthenticationService::new(db, config)
    }

    async fn with_user(service: &AuthenticationService) -> User {
        service
            .create_user("Ana Souza", " Ana@VTA.com ", "senha123", Profile::Receptionist)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let service = setup().await;
        let user = with_user(&service).await;

        assert_eq!(user.email, "ana@vta.com");
        assert_eq!(user.profile, Profile::Receptionist);
        assert!(user.password_hash.starts_with("100000$"));
        assert!(user.is_active());
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let service = setup().await;
        with_user(&service).await;

        let result = service
            .create_user("Outra", "ana@vta.com", "senha456", Profile::Admin)
            .await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let service = setup().await;

        let short = service
            .create_user("Ana", "ana@vta.com", "curta", Profile::Admin)
            .await;
        assert!(matches!(
            short,
            Err(AuthError::Validation(ValidationError::PasswordTooShort(8)))
        ));

        let bad_email = service
            .create_user("Ana", "not-an-email", "senha123", Profile::Admin)
            .await;
        assert!(matches!(bad_email, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let service = setup().await;
        with_user(&service).await;

        let user = service.login("ANA@vta.com", "senha123").await.unwrap();
        assert_eq!(user.name, "Ana Souza");
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = setup().await;
        with_user(&service).await;

        let wrong = service.login("ana@vta.com", "errada123").await.unwrap_err();
        let unknown = service.login("nobody@vta.com", "senha123").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_login_inactive() {
        let service = setup().await;
        with_user(&service).await;
        service.deactivate_user("ana@vta.com").await.unwrap();

        let result = service.login("ana@vta.com", "senha123").await;
        assert!(matches!(result, Err(AuthError::AccountInactive)));

        service.reactivate_user("ana@vta.com").await.unwrap();
        assert!(service.login("ana@vta.com", "senha123").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_upgrades_legacy_hash() {
        let service = setup().await;
        let legacy = hex::encode(Sha256::digest(b"antiga123"));
        let repo = UserRepository::new(service.db.pool());
        repo.create(&NewUser::new("Legado", "legado@vta.com", legacy.clone()))
            .await
            .unwrap();

        let user = service.login("legado@vta.com", "antiga123").await.unwrap();
        assert_ne!(user.password_hash, legacy);
        assert_eq!(
            CredentialManager::inspect(&user.password_hash),
            HashFormat::Pbkdf2 {
                iterations: MIN_ITERATIONS
            }
        );

        // The upgraded hash still authenticates.
        assert!(service.login("legado@vta.com", "antiga123").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_legacy_disabled() {
        let db = Database::open_in_memory().await.unwrap();
        let service = AuthenticationService::new(
            db,
            AuthConfig {
                pbkdf2_iterations: MIN_ITERATIONS,
                allow_legacy_hashes: false,
                ..AuthConfig::default()
            },
        );
        let legacy = hex::encode(Sha256::digest(b"antiga123"));
        UserRepository::new(service.db.pool())
            .create(&NewUser::new("Legado", "legado@vta.com", legacy))
            .await
            .unwrap();

        let result = service.login("legado@vta.com", "antiga123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_without_upgrade_keeps_hash() {
        let db = Database::open_in_memory().await.unwrap();
        let service = AuthenticationService::new(
            db,
            AuthConfig {
                pbkdf2_iterations: MIN_ITERATIONS,
                upgrade_on_login: false,
                ..AuthConfig::default()
            },
        );
        let legacy = hex::encode(Sha256::digest(b"antiga123"));
        UserRepository::new(service.db.pool())
            .create(&NewUser::new("Legado", "legado@vta.com", legacy.clone()))
            .await
            .unwrap();

        let user = service.login("legado@vta.com", "antiga123").await.unwrap();
        assert_eq!(user.password_hash, legacy);
    }

    #[tokio::test]
    async fn test_change_password() {
        let service = setup().await;
        with_user(&service).await;

        let wrong = service
            .change_password("ana@vta.com", "errada123", "novasenha1")
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        service
            .change_password("ana@vta.com", "senha123", "novasenha1")
            .await
            .unwrap();
        assert!(service.login("ana@vta.com", "senha123").await.is_err());
        assert!(service.login("ana@vta.com", "novasenha1").await.is_ok());

        let missing = service
            .change_password("nobody@vta.com", "senha123", "novasenha1")
            .await;
        assert!(matches!(missing, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_recovery_flow() {
        let service = setup().await;
        with_user(&service).await;

        assert!(service
            .request_password_recovery("nobody@vta.com")
            .await
            .unwrap()
            .is_none());

        let token = service
            .request_password_recovery("ana@vta.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.len(), RECOVERY_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        service.reset_password(&token, "recuperada1").await.unwrap();
        assert!(service.login("ana@vta.com", "recuperada1").await.is_ok());

        // Single use.
        let again = service.reset_password(&token, "outra12345").await;
        assert!(matches!(again, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_short_password_without_consuming() {
        let service = setup().await;
        with_user(&service).await;
        let token = service
            .request_password_recovery("ana@vta.com")
            .await
            .unwrap()
            .unwrap();

        let short = service.reset_password(&token, "curta").await;
        assert!(matches!(short, Err(AuthError::Validation(_))));
        assert!(service.reset_password(&token, "valida123").await.is_ok());
    }

    #[tokio::test]
    async fn test_recovery_with_out_of_range_ttl() {
        let db = Database::open_in_memory().await.unwrap();
        let service = AuthenticationService::new(
            db,
            AuthConfig {
                pbkdf2_iterations: MIN_ITERATIONS,
                recovery_token_ttl_minutes: 1_000_000_000_000,
                ..AuthConfig::default()
            },
        );
        with_user(&service).await;

        let result = service.request_password_recovery("ana@vta.com").await;
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[test]
    fn test_decoy_hash_never_verifies() {
        let decoy = decoy_hash(MIN_ITERATIONS);
        assert_eq!(
            CredentialManager::inspect(&decoy),
            HashFormat::Pbkdf2 {
                iterations: MIN_ITERATIONS
            }
        );
        let manager = CredentialManager::default();
        assert!(!manager.verify(&decoy, "senha123"));
        assert!(!manager.verify(&decoy, ""));
    }

    #[tokio::test]
    async fn test_invalidate_user_tokens() {
        let service = setup().await;
        let user = with_user(&service).await;
        let token = service
            .request_password_recovery("ana@vta.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(service.invalidate_user_tokens(user.id).await.unwrap(), 1);
        let result = service.reset_password(&token, "recuperada1").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
        assert_eq!(service.purge_expired_tokens().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_email_availability_and_listing() {
        let service = setup().await;
        with_user(&service).await;
        service
            .create_user("Bruno Lima", "bruno@vta.com", "senha123", Profile::Veterinarian)
            .await
            .unwrap();

        assert!(!service.is_email_available("ANA@vta.com").await.unwrap());
        assert!(service.is_email_available("nova@vta.com").await.unwrap());
        assert!(!service.is_email_available("invalido").await.unwrap());

        service.deactivate_user("bruno@vta.com").await.unwrap();
        let active = service.list_active_users().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].email, "ana@vta.com");
    }

    #[tokio::test]
    async fn test_update_profile() {
        let service = setup().await;
        with_user(&service).await;

        service
            .update_profile("ana@vta.com", Profile::Admin)
            .await
            .unwrap();
        let user = service.login("ana@vta.com", "senha123").await.unwrap();
        assert_eq!(user.profile, Profile::Admin);

        let missing = service.update_profile("x@vta.com", Profile::Admin).await;
        assert!(matches!(missing, Err(AuthError::UserNotFound)));
        let missing = service.deactivate_user("x@vta.com").await;
        assert!(matches!(missing, Err(AuthError::UserNotFound)));
    }
}
