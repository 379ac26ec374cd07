//! Room model for vetagenda.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scheduling::availability::{resolve, Reservation, RoomStatus};

/// Consulting room, surgery, kennel, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Room {
    /// Row ID.
    pub id: i64,
    /// Public identifier.
    pub uuid: String,
    /// Room name or number (unique).
    pub name: String,
    /// Room kind (consultation, surgery, grooming, ...).
    pub kind: String,
    /// Whether the room can be booked. Controlled by room management only.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Status of this room at `instant` given its reservations.
    ///
    /// The room never looks up its own reservations.
    pub fn status_at<R: Reservation<DateTime<Utc>>>(
        &self,
        instant: &DateTime<Utc>,
        reservations: &[R],
    ) -> RoomStatus {
        resolve(self.active, reservations, instant)
    }
}

/// Data for creating a new room.
#[derive(Debug, Clone)]
pub struct NewRoom {
    /// Room name.
    pub name: String,
    /// Room kind.
    pub kind: String,
    /// Initial active flag.
    pub active: bool,
}

impl NewRoom {
    /// Create a new active room.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            active: true,
        }
    }

    /// Set the initial active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Data for updating an existing room.
#[derive(Debug, Clone, Default)]
pub struct RoomUpdate {
    /// New name.
    pub name: Option<String>,
    /// New kind.
    pub kind: Option<String>,
}

impl RoomUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set new kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none()
    }
}
