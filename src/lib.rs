//! vetagenda - veterinary clinic scheduling core
//!
//! Staff authentication with salted, iterated credential hashes and a
//! room availability resolver backing the clinic's appointment book.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod scheduling;

pub use auth::{
    Action, AuthError, AuthenticationService, CredentialError, CredentialManager, HashFormat,
    PermissionError, ValidationError,
};
pub use config::Config;
pub use db::{
    Appointment, AppointmentStatus, Database, NewAppointment, Profile, Room, RoomUpdate, User,
    UserStatus,
};
pub use error::{AgendaError, Result};
pub use scheduling::{resolve, Reservation, ReservationWindow, RoomStatus, SchedulingService};
