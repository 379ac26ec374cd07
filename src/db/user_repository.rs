//! User repository for vetagenda.
//!
//! This module provides CRUD operations for staff users.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::user::{NewUser, Profile, User, UserStatus};
use super::DbPool;
use crate::{AgendaError, Result};

const USER_COLUMNS: &str = "id, uuid, name, email, password_hash, profile, status, last_login, created_at";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Returns the created user with the assigned ID.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (uuid, name, email, password_hash, profile, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.profile.as_str())
        .bind(UserStatus::Active.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AgendaError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by normalized email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Check if an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Replace the stored credential hash.
    pub async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful login.
    pub async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Change a user's profile. Returns false if no user has that email.
    pub async fn update_profile(&self, email: &str, profile: Profile) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET profile = ? WHERE email = ?")
            .bind(profile.as_str())
            .bind(email)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Change a user's status. Returns false if no user has that email.
    pub async fn set_status(&self, email: &str, status: UserStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET status = ? WHERE email = ?")
            .bind(status.as_str())
            .bind(email)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List active users ordered by name.
    pub async fn list_active(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE status = ? ORDER BY name"
        ))
        .bind(UserStatus::Active.as_str())
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("Ana Souza", "ana@vta.com", "hash").with_profile(Profile::Admin))
            .await
            .unwrap();

        assert_eq!(user.name, "Ana Souza");
        assert_eq!(user.email, "ana@vta.com");
        assert_eq!(user.profile, Profile::Admin);
        assert_eq!(user.status, UserStatus::Active);
        assert!(user.last_login.is_none());
        assert_eq!(user.uuid.len(), 36);

        let by_email = repo.get_by_email("ana@vta.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("A", "dup@vta.com", "h")).await.unwrap();
        let result = repo.create(&NewUser::new("B", "dup@vta.com", "h")).await;
        assert!(matches!(result, Err(AgendaError::Database(_))));
        assert!(repo.email_exists("dup@vta.com").await.unwrap());
        assert!(!repo.email_exists("other@vta.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_password_hash_and_last_login() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&NewUser::new("A", "a@vta.com", "old")).await.unwrap();

        assert!(repo.update_password_hash(user.id, "new").await.unwrap());
        assert!(!repo.update_password_hash(999, "new").await.unwrap());

        let now = Utc::now();
        repo.update_last_login(user.id, now).await.unwrap();

        let user = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.password_hash, "new");
        assert_eq!(
            user.last_login.map(|t| t.timestamp()),
            Some(now.timestamp())
        );
    }

    #[tokio::test]
    async fn test_profile_and_status() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());
        repo.create(&NewUser::new("Zeca", "z@vta.com", "h")).await.unwrap();
        repo.create(&NewUser::new("Bia", "b@vta.com", "h")).await.unwrap();

        assert!(repo
            .update_profile("z@vta.com", Profile::Veterinarian)
            .await
            .unwrap());
        assert!(!repo
            .update_profile("nobody@vta.com", Profile::Admin)
            .await
            .unwrap());

        assert!(repo
            .set_status("b@vta.com", UserStatus::Inactive)
            .await
            .unwrap());

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Zeca");
        assert_eq!(active[0].profile, Profile::Veterinarian);
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
