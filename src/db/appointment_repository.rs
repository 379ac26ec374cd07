//! Appointment repository for vetagenda.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::appointment::{Appointment, AppointmentStatus, NewAppointment};
use super::DbPool;
use crate::{AgendaError, Result};

const APPOINTMENT_COLUMNS: &str = "id, uuid, room_id, professional_id, client_id, pet_id, \
    starts_at, ends_at, service_type, notes, status, created_by, created_at, \
    cancelled_by, cancelled_at";

/// Repository for appointment operations.
pub struct AppointmentRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> AppointmentRepository<'a> {
    /// Create a new AppointmentRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new appointment with status `AGENDADO`.
    ///
    /// Input validation and conflict checks are the caller's job.
    pub async fn create(&self, appt: &NewAppointment) -> Result<Appointment> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO appointments (uuid, room_id, professional_id, client_id, pet_id,
                 starts_at, ends_at, service_type, notes, status, created_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(appt.room_id)
        .bind(&appt.professional_id)
        .bind(&appt.client_id)
        .bind(&appt.pet_id)
        .bind(appt.starts_at)
        .bind(appt.ends_at)
        .bind(&appt.service_type)
        .bind(&appt.notes)
        .bind(AppointmentStatus::Scheduled.as_str())
        .bind(&appt.created_by)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AgendaError::NotFound("appointment".to_string()))
    }

    /// Get an appointment by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Appointment>> {
        let appt = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(appt)
    }

    /// All appointments of a room, ordered by start.
    pub async fn list_for_room(&self, room_id: i64) -> Result<Vec<Appointment>> {
        let appts = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE room_id = ? ORDER BY starts_at"
        ))
        .bind(room_id)
        .fetch_all(self.pool)
        .await?;
        Ok(appts)
    }

    /// Appointments of a room that still hold it (anything but cancelled).
    pub async fn list_active_for_room(&self, room_id: i64) -> Result<Vec<Appointment>> {
        let appts = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments
             WHERE room_id = ? AND status != ? ORDER BY starts_at"
        ))
        .bind(room_id)
        .bind(AppointmentStatus::Cancelled.as_str())
        .fetch_all(self.pool)
        .await?;
        Ok(appts)
    }

    /// Cancel an appointment that is not already cancelled.
    ///
    /// Returns false if nothing changed.
    pub async fn cancel(&self, id: i64, by: &str, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE appointments SET status = ?, cancelled_by = ?, cancelled_at = ?
             WHERE id = ? AND status != ?",
        )
        .bind(AppointmentStatus::Cancelled.as_str())
        .bind(by)
        .bind(at)
        .bind(id)
        .bind(AppointmentStatus::Cancelled.as_str())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the status of an appointment that is not cancelled.
    ///
    /// Returns false if the appointment is missing or cancelled.
    pub async fn set_status(&self, id: i64, status: AppointmentStatus) -> Result<bool> {
        let result =
            sqlx::query("UPDATE appointments SET status = ? WHERE id = ? AND status != ?")
                .bind(status.as_str())
                .bind(id)
                .bind(AppointmentStatus::Cancelled.as_str())
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
