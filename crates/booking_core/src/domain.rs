//! crates/booking_core/src/domain.rs
//!
//! Defines the pure, core data structures for the booking client.
//! These structs are independent of any wire format or serialization library;
//! the HTTP adapter converts its payload records into these types at the boundary.

use chrono::{DateTime, Duration, Utc};

/// The fixed length of a bookable slot when the backend omits an end time.
pub const SLOT_DURATION_MINUTES: i64 = 45;

/// A bookable time window generated by the backend.
///
/// Slots are read-only on the client: they are produced by the backend's
/// generation process and consumed here for selection and booking.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    /// The backend may omit this; see [`Slot::end_or_default`].
    pub end_time: Option<DateTime<Utc>>,
    /// A taken slot must never be offered for selection.
    pub taken: bool,
}

impl Slot {
    /// The slot's end instant, defaulting to start + 45 minutes when the
    /// backend did not send one.
    pub fn end_or_default(&self) -> DateTime<Utc> {
        self.end_time
            .unwrap_or_else(|| self.start_time + Duration::minutes(SLOT_DURATION_MINUTES))
    }
}

/// The canonical lifecycle of an appointment.
///
/// The backend historically exposed two vocabularies for this (a string status
/// and a boolean `honored` flag); the client normalizes both onto this enum at
/// the adapter boundary and uses nothing else internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
    Honored,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Honored => "honored",
        }
    }

    /// Parses the backend's string vocabulary. Unknown values count as
    /// scheduled rather than being rejected, matching the dashboard's
    /// display rule.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "cancelled" => AppointmentStatus::Cancelled,
            "honored" => AppointmentStatus::Honored,
            _ => AppointmentStatus::Scheduled,
        }
    }
}

/// A confirmed booking of a [`Slot`] by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub user_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: Option<String>,
    pub appointment_type_id: Option<i64>,
    pub status: AppointmentStatus,
    /// Which actor cancelled the appointment, when the backend reports it.
    pub cancelled_by: Option<String>,
}

impl Appointment {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Whether this appointment belongs in the "upcoming" view: it has not
    /// started yet and has not been cancelled. Everything else is past.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time >= now && self.status != AppointmentStatus::Cancelled
    }
}

/// A named, colored category of appointment, referenced by id when booking.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentType {
    pub id: i64,
    pub name: String,
    pub color: String,
}

/// A document shared on an appointment or owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedDocument {
    pub id: i64,
    pub name: String,
    pub mime_type: String,
    pub shared_at: DateTime<Utc>,
}

/// The role stored alongside the session token. Only used for display and for
/// knowing which appointment listing the backend will return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Patient,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "patient" | "user" => Some(Role::Patient),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}
