//! Appointment model for vetagenda.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::scheduling::availability::Reservation;
use crate::{AgendaError, Result};

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    /// Confirmed booking.
    #[default]
    Scheduled,
    /// Awaiting confirmation.
    Pending,
    /// Finished.
    Completed,
    /// Cancelled; no longer holds the room.
    Cancelled,
}

impl AppointmentStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "AGENDADO",
            AppointmentStatus::Pending => "PENDENTE",
            AppointmentStatus::Completed => "CONCLUIDO",
            AppointmentStatus::Cancelled => "CANCELADO",
        }
    }

    /// Whether this appointment still occupies its room.
    pub fn holds_room(&self) -> bool {
        *self != AppointmentStatus::Cancelled
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AGENDADO" | "SCHEDULED" => Ok(AppointmentStatus::Scheduled),
            "PENDENTE" | "PENDING" => Ok(AppointmentStatus::Pending),
            "CONCLUIDO" | "COMPLETED" => Ok(AppointmentStatus::Completed),
            "CANCELADO" | "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            _ => Err(format!("unknown appointment status: {s}")),
        }
    }
}

/// A booking of a room for a pet.
#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    /// Row ID.
    pub id: i64,
    /// Public identifier.
    pub uuid: String,
    /// Booked room.
    pub room_id: i64,
    /// Attending professional.
    pub professional_id: String,
    /// Pet owner.
    pub client_id: String,
    /// Patient.
    pub pet_id: String,
    /// Start of the booking.
    pub starts_at: DateTime<Utc>,
    /// End of the booking.
    pub ends_at: DateTime<Utc>,
    /// Kind of service (consultation, vaccine, surgery, ...).
    pub service_type: String,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Lifecycle status.
    pub status: AppointmentStatus,
    /// Who created the booking.
    pub created_by: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Who cancelled the booking.
    pub cancelled_by: Option<String>,
    /// When the booking was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation<DateTime<Utc>> for Appointment {
    fn start(&self) -> Option<&DateTime<Utc>> {
        Some(&self.starts_at)
    }

    fn end(&self) -> Option<&DateTime<Utc>> {
        Some(&self.ends_at)
    }
}

const TICKET_WIDTH: usize = 50;
const TICKET_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

impl Appointment {
    /// Render a plain-text booking ticket.
    pub fn ticket_text(&self, room_name: &str) -> String {
        let rule = "=".repeat(TICKET_WIDTH);
        let thin = "-".repeat(TICKET_WIDTH);
        let mut lines = vec![
            rule.clone(),
            format!("{:^width$}", "APPOINTMENT TICKET", width = TICKET_WIDTH),
            rule.clone(),
            String::new(),
            format!("Appointment: {}", self.uuid),
            format!("Status: {}", self.status),
            String::new(),
            thin.clone(),
            format!("Service: {}", self.service_type),
            format!("Start: {}", self.starts_at.format(TICKET_DATE_FORMAT)),
            format!("End: {}", self.ends_at.format(TICKET_DATE_FORMAT)),
            format!("Room: {room_name}"),
            thin.clone(),
            format!("Professional: {}", self.professional_id),
            format!("Client: {}", self.client_id),
            format!("Pet: {}", self.pet_id),
        ];

        if let Some(notes) = self.notes.as_deref().filter(|n| !n.is_empty()) {
            lines.push(thin.clone());
            lines.push("Notes:".to_string());
            lines.push(notes.to_string());
        }

        lines.push(thin);
        lines.push(format!(
            "Created: {}",
            self.created_at.format(TICKET_DATE_FORMAT)
        ));
        lines.push(format!(
            "Created by: {}",
            self.created_by.as_deref().unwrap_or("N/A")
        ));
        if let Some(cancelled_at) = self.cancelled_at {
            lines.push(format!(
                "Cancelled: {}",
                cancelled_at.format(TICKET_DATE_FORMAT)
            ));
            lines.push(format!(
                "Cancelled by: {}",
                self.cancelled_by.as_deref().unwrap_or("N/A")
            ));
        }
        lines.push(rule);

        lines.join("\n")
    }
}

impl<'r> FromRow<'r, SqliteRow> for Appointment {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            uuid: row.try_get("uuid")?,
            room_id: row.try_get("room_id")?,
            professional_id: row.try_get("professional_id")?,
            client_id: row.try_get("client_id")?,
            pet_id: row.try_get("pet_id")?,
            starts_at: row.try_get("starts_at")?,
            ends_at: row.try_get("ends_at")?,
            service_type: row.try_get("service_type")?,
            notes: row.try_get("notes")?,
            status: status.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            })?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            cancelled_by: row.try_get("cancelled_by")?,
            cancelled_at: row.try_get("cancelled_at")?,
        })
    }
}

/// Data for booking a new appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    /// Room to book.
    pub room_id: i64,
    /// Attending professional.
    pub professional_id: String,
    /// Pet owner.
    pub client_id: String,
    /// Patient.
    pub pet_id: String,
    /// Start of the booking.
    pub starts_at: DateTime<Utc>,
    /// End of the booking.
    pub ends_at: DateTime<Utc>,
    /// Kind of service.
    pub service_type: String,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Who is creating the booking.
    pub created_by: Option<String>,
}

impl NewAppointment {
    /// Check ids and the time window.
    pub fn validate(&self) -> Result<()> {
        let ids = [
            ("professional_id", &self.professional_id),
            ("client_id", &self.client_id),
            ("pet_id", &self.pet_id),
        ];
        if let Some((field, _)) = ids.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AgendaError::Validation(format!("{field} cannot be empty")));
        }
        if self.service_type.trim().is_empty() {
            return Err(AgendaError::Validation(
                "service_type cannot be empty".to_string(),
            ));
        }
        if self.starts_at >= self.ends_at {
            return Err(AgendaError::Validation(
                "appointment must start before it ends".to_string(),
            ));
        }
        Ok(())
    }
}

impl Reservation<DateTime<Utc>> for NewAppointment {
    fn start(&self) -> Option<&DateTime<Utc>> {
        Some(&self.starts_at)
    }

    fn end(&self) -> Option<&DateTime<Utc>> {
        Some(&self.ends_at)
    }
}
