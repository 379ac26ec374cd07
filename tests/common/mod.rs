//! Test helpers for integration tests.
//!
//! Provides database setup and a few fixtures shared by the test files.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use vetagenda::auth::credential::MIN_ITERATIONS;
use vetagenda::config::AuthConfig;
use vetagenda::{AuthenticationService, Database, NewAppointment, SchedulingService};

/// Auth settings with the cheapest accepted iteration count.
pub fn fast_auth_config() -> AuthConfig {
    AuthConfig {
        pbkdf2_iterations: MIN_ITERATIONS,
        ..AuthConfig::default()
    }
}

/// A file-backed database in a temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub async fn file_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("agenda.db")).await.unwrap();
    (dir, db)
}

/// Both services over one in-memory database.
pub async fn services() -> (AuthenticationService, SchedulingService) {
    let db = Database::open_in_memory().await.unwrap();
    (
        AuthenticationService::new(db.clone(), fast_auth_config()),
        SchedulingService::new(db),
    )
}

/// A fixed instant on the test day.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 20, hour, minute, 0).unwrap()
}

/// A booking request for `room_id`.
pub fn booking(room_id: i64, start: DateTime<Utc>, minutes: i64) -> NewAppointment {
    NewAppointment {
        room_id,
        professional_id: "vet-ana".to_string(),
        client_id: "cliente-42".to_string(),
        pet_id: "pet-rex".to_string(),
        starts_at: start,
        ends_at: start + Duration::minutes(minutes),
        service_type: "Consulta".to_string(),
        notes: None,
        created_by: Some("recepcao@vta.com".to_string()),
    }
}
