//! Room repository for vetagenda.

use chrono::Utc;
use sqlx::QueryBuilder;
use uuid::Uuid;

use super::room::{NewRoom, Room, RoomUpdate};
use super::DbPool;
use crate::{AgendaError, Result};

const ROOM_COLUMNS: &str = "id, uuid, name, kind, active, created_at";

/// Repository for room operations.
pub struct RoomRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RoomRepository<'a> {
    /// Create a new RoomRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new room.
    pub async fn create(&self, room: &NewRoom) -> Result<Room> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO rooms (uuid, name, kind, active, created_at)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&room.name)
        .bind(&room.kind)
        .bind(room.active)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AgendaError::NotFound("room".to_string()))
    }

    /// Get a room by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(room)
    }

    /// Get a room by its unique name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE name = ?"
        ))
        .bind(name)
        .fetch_optional(self.pool)
        .await?;
        Ok(room)
    }

    /// List rooms ordered by name, optionally only the active ones.
    pub async fn list(&self, only_active: bool) -> Result<Vec<Room>> {
        let sql = if only_active {
            format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE active = 1 ORDER BY name")
        } else {
            format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY name")
        };
        let rooms = sqlx::query_as::<_, Room>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rooms)
    }

    /// Update a room's name and/or kind.
    ///
    /// Returns `None` if the room does not exist.
    pub async fn update(&self, id: i64, update: &RoomUpdate) -> Result<Option<Room>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE rooms SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.clone());
        }

        if let Some(ref kind) = update.kind {
            separated.push("kind = ");
            separated.push_bind_unseparated(kind.clone());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query.build().execute(self.pool).await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Set the active flag. Returns false if the room does not exist.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE rooms SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a room by ID.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count appointments of any status booked in the room.
    pub async fn count_appointments(&self, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE room_id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
