//! Room availability resolution.
//!
//! A room's status at an instant is derived from its active flag and the
//! reservations supplied by the caller:
//!
//! 1. inactive rooms are [`RoomStatus::Blocked`], reservations are not inspected;
//! 2. a reservation whose closed interval `[start, end]` contains the instant
//!    makes the room [`RoomStatus::Occupied`];
//! 3. otherwise the room is [`RoomStatus::Free`].
//!
//! Reservations missing either boundary are skipped. Overlapping
//! reservations are tolerated; the first match wins.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Status of a room at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// The room is deactivated.
    Blocked,
    /// A reservation covers the instant.
    Occupied,
    /// Nothing covers the instant.
    Free,
}

impl RoomStatus {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Blocked => "bloqueada",
            RoomStatus::Occupied => "ocupada",
            RoomStatus::Free => "livre",
        }
    }

    /// Whether a new booking could be placed at this instant.
    pub fn is_free(&self) -> bool {
        *self == RoomStatus::Free
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anything exposing an optional start/end pair.
///
/// Upstream records may be partial; a `None` boundary makes the record
/// invisible to the resolver.
pub trait Reservation<T> {
    /// Start of the reserved window.
    fn start(&self) -> Option<&T>;
    /// End of the reserved window.
    fn end(&self) -> Option<&T>;
}

/// Plain reservation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationWindow<T = DateTime<Utc>> {
    /// Start boundary.
    pub start: Option<T>,
    /// End boundary.
    pub end: Option<T>,
}

impl<T> ReservationWindow<T> {
    /// A window with both boundaries.
    pub fn new(start: T, end: T) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A window with possibly missing boundaries.
    pub fn partial(start: Option<T>, end: Option<T>) -> Self {
        Self { start, end }
    }
}

impl<T> Reservation<T> for ReservationWindow<T> {
    fn start(&self) -> Option<&T> {
        self.start.as_ref()
    }

    fn end(&self) -> Option<&T> {
        self.end.as_ref()
    }
}

impl<T, R: Reservation<T>> Reservation<T> for &R {
    fn start(&self) -> Option<&T> {
        (*self).start()
    }

    fn end(&self) -> Option<&T> {
        (*self).end()
    }
}

/// Whether the closed interval of `reservation` contains `instant`.
///
/// Returns `false` for reservations missing a boundary.
pub fn covers<T: Ord, R: Reservation<T>>(reservation: &R, instant: &T) -> bool {
    match (reservation.start(), reservation.end()) {
        (Some(start), Some(end)) => start <= instant && instant <= end,
        _ => false,
    }
}

/// Resolve the status of a room at `instant`.
///
/// Pure: the caller fetches the reservations (already filtered to the
/// room, cancelled ones excluded) and passes them in. Boundaries and
/// instant must share one reference frame; no normalization happens here.
///
/// # Examples
///
/// ```
/// use vetagenda::scheduling::{resolve, ReservationWindow, RoomStatus};
///
/// let window = ReservationWindow::new(10, 11);
/// assert_eq!(resolve(true, &[window.clone()], &10), RoomStatus::Occupied);
/// assert_eq!(resolve(true, &[window.clone()], &12), RoomStatus::Free);
/// assert_eq!(resolve(false, &[window], &10), RoomStatus::Blocked);
/// ```
pub fn resolve<T, R>(active: bool, reservations: &[R], instant: &T) -> RoomStatus
where
    T: Ord,
    R: Reservation<T>,
{
    if !active {
        return RoomStatus::Blocked;
    }

    if reservations.iter().any(|r| covers(r, instant)) {
        RoomStatus::Occupied
    } else {
        RoomStatus::Free
    }
}

/// Whether two closed windows share at least one instant.
///
/// Windows missing a boundary never overlap anything.
pub fn overlaps<T, A, B>(a: &A, b: &B) -> bool
where
    T: Ord,
    A: Reservation<T>,
    B: Reservation<T>,
{
    match (a.start(), a.end(), b.start(), b.end()) {
        (Some(a_start), Some(a_end), Some(b_start), Some(b_end)) => {
            a_start <= b_end && b_start <= a_end
        }
        _ => false,
    }
}
