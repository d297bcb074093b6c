//! crates/booking_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the booking core.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! workflow and store to be independent of the concrete HTTP transport and of
//! wherever the session token happens to be persisted.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{Appointment, AppointmentType, Role, SharedDocument, Slot};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
///
/// This is the full failure taxonomy of the client: the adapter maps every
/// transport- or protocol-level condition onto one of these variants, and
/// nothing above the port ever sees a raw HTTP error.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// No response at all (connection refused, DNS failure, ...).
    #[error("Network error: {0}")]
    Network(String),
    /// A non-2xx response carrying a message intended for the user.
    /// Request timeouts are mapped here as well.
    #[error("{0}")]
    Application(String),
    /// A 401 response; the caller should send the user back to login.
    #[error("Unauthorized")]
    Unauthorized,
    /// A catch-all for conditions the adapter could not classify.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// The line shown to the user for this failure. Application messages are
    /// relayed verbatim; everything else gets a generic retry suggestion.
    pub fn user_message(&self) -> String {
        match self {
            PortError::Application(message) => message.clone(),
            PortError::Network(_) => {
                "Impossible de joindre le serveur. Veuillez réessayer.".to_string()
            }
            PortError::Unauthorized => "Votre session a expiré. Veuillez vous reconnecter.".to_string(),
            PortError::Unexpected(_) => "Une erreur est survenue. Veuillez réessayer.".to_string(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Request Payloads
//=========================================================================================

/// The payload for creating an appointment out of a selected slot.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub slot_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub appointment_type_id: i64,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The booking backend, seen as a stateless transport shim.
///
/// Implementations perform exactly one request per call: no retries, no
/// caching. Every operation attaches the current bearer token from the
/// [`CredentialProvider`] the adapter was constructed with.
#[async_trait]
pub trait BookingApi: Send + Sync {
    // --- Slots ---
    /// Lists slots whose start date falls in `[start_date, end_date)`.
    async fn list_slots(&self, start_date: NaiveDate, end_date: NaiveDate)
        -> PortResult<Vec<Slot>>;

    // --- Appointments ---
    /// Lists the current user's appointments (all appointments for an admin).
    async fn list_appointments(&self) -> PortResult<Vec<Appointment>>;

    async fn create_appointment(&self, request: &NewAppointment) -> PortResult<Appointment>;

    async fn cancel_appointment(&self, appointment_id: i64) -> PortResult<Appointment>;

    async fn reschedule_appointment(
        &self,
        appointment_id: i64,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> PortResult<Appointment>;

    // --- Appointment Types ---
    async fn list_appointment_types(&self) -> PortResult<Vec<AppointmentType>>;

    // --- Documents ---
    async fn share_document(
        &self,
        appointment_id: i64,
        file_name: &str,
        title: &str,
        data: Vec<u8>,
    ) -> PortResult<()>;

    async fn list_appointment_documents(
        &self,
        appointment_id: i64,
    ) -> PortResult<Vec<SharedDocument>>;

    async fn list_user_documents(&self, user_id: i64) -> PortResult<Vec<SharedDocument>>;

    async fn delete_document(&self, user_id: i64, document_id: i64) -> PortResult<()>;
}

/// Read-only access to the persisted session credentials.
///
/// Injected into the HTTP adapter at construction instead of being read from a
/// global, so tests can substitute a fixed token.
pub trait CredentialProvider: Send + Sync {
    /// The current bearer token, if the user is logged in.
    fn token(&self) -> Option<String>;

    fn role(&self) -> Option<Role>;
}
