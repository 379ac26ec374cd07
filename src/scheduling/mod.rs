//! Scheduling module for vetagenda.
//!
//! Room availability resolution and the room/appointment service.

pub mod availability;
pub mod service;

pub use availability::{covers, overlaps, resolve, Reservation, ReservationWindow, RoomStatus};
pub use service::{RoomAvailability, SchedulingService};
