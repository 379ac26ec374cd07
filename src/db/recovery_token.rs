//! Password-recovery token repository.
//!
//! Recovery tokens are single-use and expire a fixed time after issue.
//! Expiry is stored as unix seconds so comparisons happen numerically.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::{AgendaError, Result};

/// Recovery token entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecoveryToken {
    /// Token ID.
    pub id: i64,
    /// Token string (hex).
    pub token: String,
    /// Owning user.
    pub user_id: i64,
    /// Expiration, unix seconds.
    pub expires_at: i64,
    /// Whether the token has been consumed or invalidated.
    pub used: bool,
}

impl RecoveryToken {
    /// Check if the token is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp()
    }
}

/// Repository for recovery token operations.
pub struct RecoveryTokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RecoveryTokenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a new token.
    pub async fn create(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RecoveryToken> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO recovery_tokens (token, user_id, expires_at, used)
             VALUES (?, ?, ?, 0) RETURNING id",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at.timestamp())
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AgendaError::NotFound("recovery token".to_string()))
    }

    /// Get a token by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<RecoveryToken>> {
        let token = sqlx::query_as::<_, RecoveryToken>(
            "SELECT id, token, user_id, expires_at, used FROM recovery_tokens WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(token)
    }

    /// Consume a token and store a new password hash for its owner in one
    /// transaction.
    ///
    /// Returns the user ID, or `None` (with nothing written) if the token is
    /// unknown, used or expired.
    pub async fn redeem(
        &self,
        token: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<i64> = sqlx::query_scalar(
            "UPDATE recovery_tokens SET used = 1
             WHERE token = ? AND used = 0 AND expires_at > ?
             RETURNING user_id",
        )
        .bind(token)
        .bind(now.timestamp())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(user_id))
    }

    /// Invalidate every live token of a user. Returns the number invalidated.
    pub async fn invalidate_for_user(&self, user_id: i64, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE recovery_tokens SET used = 1
             WHERE user_id = ? AND used = 0 AND expires_at > ?",
        )
        .bind(user_id)
        .bind(now.timestamp())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete tokens that expired before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM recovery_tokens WHERE expires_at < ?")
            .bind(now.timestamp())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
