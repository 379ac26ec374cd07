//! Room and appointment scheduling service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::{
    Appointment, AppointmentRepository, AppointmentStatus, Database, NewAppointment, NewRoom,
    Room, RoomRepository, RoomUpdate,
};
use crate::scheduling::availability::{overlaps, resolve, RoomStatus};
use crate::{AgendaError, Result};

/// A room together with its status at some instant.
#[derive(Debug, Clone, Serialize)]
pub struct RoomAvailability {
    /// The room.
    pub room: Room,
    /// Its resolved status.
    pub status: RoomStatus,
}

/// Scheduling service over rooms and appointments.
#[derive(Debug, Clone)]
pub struct SchedulingService {
    db: Database,
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AgendaError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

impl SchedulingService {
    /// Create a service over `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn rooms(&self) -> RoomRepository<'_> {
        RoomRepository::new(self.db.pool())
    }

    fn appointments(&self) -> AppointmentRepository<'_> {
        AppointmentRepository::new(self.db.pool())
    }

    async fn existing_room(&self, id: i64) -> Result<Room> {
        self.rooms()
            .get_by_id(id)
            .await?
            .ok_or_else(|| AgendaError::NotFound(format!("room {id}")))
    }

    // ---- rooms ----

    /// Create a room. Names are unique.
    pub async fn create_room(&self, name: &str, kind: &str, active: bool) -> Result<Room> {
        let name = required("room name", name)?;
        let kind = required("room kind", kind)?;

        if self.rooms().get_by_name(&name).await?.is_some() {
            return Err(AgendaError::Conflict(format!("room '{name}' already exists")));
        }

        let room = self
            .rooms()
            .create(&NewRoom::new(name, kind).with_active(active))
            .await?;
        info!(room_id = room.id, name = %room.name, "room created");
        Ok(room)
    }

    /// Get a room by ID.
    pub async fn get_room(&self, id: i64) -> Result<Option<Room>> {
        self.rooms().get_by_id(id).await
    }

    /// Get a room by name.
    pub async fn get_room_by_name(&self, name: &str) -> Result<Option<Room>> {
        self.rooms().get_by_name(name.trim()).await
    }

    /// List rooms ordered by name.
    pub async fn list_rooms(&self, only_active: bool) -> Result<Vec<Room>> {
        self.rooms().list(only_active).await
    }

    /// Rename a room or change its kind.
    pub async fn update_room(&self, id: i64, update: RoomUpdate) -> Result<Room> {
        if update.is_empty() {
            return Err(AgendaError::Validation("nothing to update".to_string()));
        }

        let mut normalized = RoomUpdate::new();
        if let Some(name) = update.name.as_deref() {
            let name = required("room name", name)?;
            if let Some(other) = self.rooms().get_by_name(&name).await? {
                if other.id != id {
                    return Err(AgendaError::Conflict(format!("room '{name}' already exists")));
                }
            }
            normalized = normalized.name(name);
        }
        if let Some(kind) = update.kind.as_deref() {
            normalized = normalized.kind(required("room kind", kind)?);
        }

        let room = self
            .rooms()
            .update(id, &normalized)
            .await?
            .ok_or_else(|| AgendaError::NotFound(format!("room {id}")))?;
        info!(room_id = id, "room updated");
        Ok(room)
    }

    /// Make a room bookable.
    pub async fn activate_room(&self, id: i64) -> Result<()> {
        self.set_room_active(id, true).await
    }

    /// Block a room. Existing appointments are kept.
    pub async fn deactivate_room(&self, id: i64) -> Result<()> {
        self.set_room_active(id, false).await
    }

    async fn set_room_active(&self, id: i64, active: bool) -> Result<()> {
        if !self.rooms().set_active(id, active).await? {
            return Err(AgendaError::NotFound(format!("room {id}")));
        }
        info!(room_id = id, active, "room active flag changed");
        Ok(())
    }

    /// Delete a room that has never been booked.
    pub async fn delete_room(&self, id: i64) -> Result<()> {
        self.existing_room(id).await?;

        let booked = self.rooms().count_appointments(id).await?;
        if booked > 0 {
            return Err(AgendaError::Conflict(format!(
                "room {id} has {booked} appointment(s); deactivate it instead"
            )));
        }

        if !self.rooms().delete(id).await? {
            return Err(AgendaError::Conflict(format!(
                "room {id} was removed concurrently"
            )));
        }
        info!(room_id = id, "room deleted");
        Ok(())
    }

    // ---- availability ----

    /// Status of a room at `instant`.
    pub async fn room_status(&self, room_id: i64, instant: DateTime<Utc>) -> Result<RoomStatus> {
        let room = self.existing_room(room_id).await?;
        let reservations = self.appointments().list_active_for_room(room_id).await?;
        let status = resolve(room.active, &reservations, &instant);
        debug!(room_id, %instant, %status, "room status resolved");
        Ok(status)
    }

    /// Status of every room at `instant`, ordered by room name.
    pub async fn availability_at(&self, instant: DateTime<Utc>) -> Result<Vec<RoomAvailability>> {
        let mut report = Vec::new();
        for room in self.rooms().list(false).await? {
            let reservations = self.appointments().list_active_for_room(room.id).await?;
            let status = room.status_at(&instant, &reservations);
            report.push(RoomAvailability { room, status });
        }
        Ok(report)
    }

    /// Active rooms that are free at `instant`.
    pub async fn list_free_rooms(&self, instant: DateTime<Utc>) -> Result<Vec<Room>> {
        let mut free = Vec::new();
        for room in self.rooms().list(true).await? {
            let reservations = self.appointments().list_active_for_room(room.id).await?;
            if room.status_at(&instant, &reservations).is_free() {
                free.push(room);
            }
        }
        Ok(free)
    }

    // ---- appointments ----

    /// Book a room.
    ///
    /// The room must exist and be active, and the closed window
    /// `[starts_at, ends_at]` must not touch any live appointment of the room.
    pub async fn book_appointment(&self, appointment: NewAppointment) -> Result<Appointment> {
        appointment.validate()?;

        let room = self.existing_room(appointment.room_id).await?;
        if !room.active {
            return Err(AgendaError::Conflict(format!(
                "room '{}' is blocked",
                room.name
            )));
        }

        let existing = self.appointments().list_active_for_room(room.id).await?;
        if let Some(clash) = existing.iter().find(|a| overlaps(*a, &appointment)) {
            return Err(AgendaError::Conflict(format!(
                "room '{}' is already booked from {} to {}",
                room.name, clash.starts_at, clash.ends_at
            )));
        }

        let booked = self.appointments().create(&appointment).await?;
        info!(
            appointment_id = booked.id,
            room_id = room.id,
            starts_at = %booked.starts_at,
            "appointment booked"
        );
        Ok(booked)
    }

    /// Cancel an appointment, freeing its room.
    pub async fn cancel_appointment(&self, id: i64, by: &str) -> Result<Appointment> {
        let by = required("cancelled by", by)?;
        let appointment = self.existing_appointment(id).await?;
        if appointment.status == AppointmentStatus::Cancelled {
            return Err(AgendaError::Conflict(format!(
                "appointment {id} is already cancelled"
            )));
        }

        if !self.appointments().cancel(id, &by, Utc::now()).await? {
            return Err(AgendaError::Conflict(format!(
                "appointment {id} is already cancelled"
            )));
        }
        info!(appointment_id = id, "appointment cancelled");
        self.existing_appointment(id).await
    }

    /// Mark an appointment as completed.
    pub async fn complete_appointment(&self, id: i64) -> Result<Appointment> {
        let appointment = self.existing_appointment(id).await?;
        if appointment.status == AppointmentStatus::Cancelled {
            return Err(AgendaError::Conflict(format!(
                "appointment {id} is cancelled"
            )));
        }

        let updated = self
            .appointments()
            .set_status(id, AppointmentStatus::Completed)
            .await?;
        if !updated {
            return Err(AgendaError::Conflict(format!(
                "appointment {id} is cancelled"
            )));
        }
        info!(appointment_id = id, "appointment completed");
        self.existing_appointment(id).await
    }

    /// Get an appointment by ID.
    pub async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>> {
        self.appointments().get_by_id(id).await
    }

    /// All appointments of a room, cancelled ones included, ordered by start.
    pub async fn list_room_appointments(&self, room_id: i64) -> Result<Vec<Appointment>> {
        self.existing_room(room_id).await?;
        self.appointments().list_for_room(room_id).await
    }

    async fn existing_appointment(&self, id: i64) -> Result<Appointment> {
        self.appointments()
            .get_by_id(id)
            .await?
            .ok_or_else(|| AgendaError::NotFound(format!("appointment {id}")))
    }
}
